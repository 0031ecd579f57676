/// Driver errors.
///
/// `E` is the error type of the I2C bus the driver was built with.
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// I2C bus error. These are handed straight back to the caller and never retried.
    I2c(E),
    /// The sensor kept reporting busy for the whole polling budget in
    /// [`Timing`](crate::Timing). The device state is unknown, the caller may retry the
    /// whole measurement.
    Timeout,
    /// No measurement with a valid checksum was read. Only returned by
    /// [`AHT20::measure_verified`](crate::AHT20::measure_verified), as a plain `measure`
    /// flags the reading instead of discarding it.
    ChecksumMismatch,
}

impl<E> From<E> for Error<E> {
    fn from(value: E) -> Self {
        Error::I2c(value)
    }
}

impl<E> core::fmt::Display for Error<E>
where
    E: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "Received I2C error: {:?}", e),
            Error::Timeout => write!(f, "Sensor stayed busy past the polling budget"),
            Error::ChecksumMismatch => write!(f, "CRC validation failed for measurement frame"),
        }
    }
}

impl<E> core::error::Error for Error<E> where E: core::fmt::Debug {}

#[cfg(test)]
mod tests {
    use super::Error;
    use embedded_hal::i2c::ErrorKind;

    #[test]
    fn display_messages() {
        assert_eq!(
            Error::I2c(ErrorKind::Other).to_string(),
            "Received I2C error: Other"
        );
        assert_eq!(
            Error::<ErrorKind>::Timeout.to_string(),
            "Sensor stayed busy past the polling budget"
        );
        assert_eq!(
            Error::<ErrorKind>::ChecksumMismatch.to_string(),
            "CRC validation failed for measurement frame"
        );
    }

    #[test]
    fn bus_errors_convert() {
        let err: Error<ErrorKind> = ErrorKind::Bus.into();
        assert_eq!(err, Error::I2c(ErrorKind::Bus));
    }
}
