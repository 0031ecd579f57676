use crate::conversions;
use crate::crc::compute_crc;
use crate::profile::{HumidityRounding, Profile, Status};

/// SensorStatus is the response from the sensor indicating if it is ready to read from, and if it
/// is calibrated.
///
/// This is returned from the `check_status` method. It is used both during initialization, to
/// read the calibration bit, and during measure. During measure the sensor will report itself as
/// busy (not ready) for around 80ms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub struct SensorStatus(pub u8);

impl SensorStatus {
    /// Create a new SensorStatus from an AHT20 status byte.
    pub fn new(status: u8) -> Self {
        SensorStatus(status)
    }

    /// Check if the sensor is ready to have data read from it, using the datasheet's busy bit.
    pub fn is_ready(self) -> bool {
        !self.is_busy_with(Status::Busy as u8)
    }

    /// Check if the sensor is calibrated, using the datasheet's calibration bit.
    pub fn is_calibrated(self) -> bool {
        self.is_calibrated_with(Status::Calibrated as u8)
    }

    /// Check the busy bit selected by `mask`.
    pub fn is_busy_with(self, mask: u8) -> bool {
        (self.0 & mask) != 0
    }

    /// Check the calibration bit selected by `mask`.
    pub fn is_calibrated_with(self, mask: u8) -> bool {
        (self.0 & mask) != 0
    }
}

/// The 7 bytes read back from the sensor after a measurement.
///
/// ```text
///  byte:    0        1        2        3        4        5        6
///        status   RH[19:12] RH[11:4] RH[3:0]  T[15:8]  T[7:0]    CRC
///                                    T[19:16]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub struct RawFrame(pub [u8; 7]);

impl RawFrame {
    pub fn new(bytes: [u8; 7]) -> Self {
        RawFrame(bytes)
    }

    /// The status byte the sensor repeats at the start of every frame, or `None` when the
    /// profile's [`CrcWindow`](crate::CrcWindow) puts the checksum in byte 0 instead.
    pub fn status(&self, profile: &Profile) -> Option<SensorStatus> {
        if profile.crc_window.carries_status() {
            Some(SensorStatus::new(self.0[0]))
        } else {
            None
        }
    }

    /// The 20-bit humidity reading: bytes 1 and 2 plus the top nibble of byte 3.
    pub fn raw_humidity(&self) -> u32 {
        let [_, b1, b2, split, ..] = self.0;
        // The top four bits of the split byte are the last four bits of humidity.
        (b1 as u32) << 12 | (b2 as u32) << 4 | (split >> 4) as u32
    }

    /// The 20-bit temperature reading: the bottom nibble of byte 3 plus bytes 4 and 5.
    pub fn raw_temperature(&self) -> u32 {
        let [_, _, _, split, b4, b5, _] = self.0;
        ((split & 0b0000_1111) as u32) << 16 | (b4 as u32) << 8 | b5 as u32
    }

    /// Whether the checksum byte matches the CRC of the covered bytes, with both picked by
    /// the profile's [`CrcWindow`](crate::CrcWindow).
    pub fn checksum_matches(&self, profile: &Profile) -> bool {
        let window = profile.crc_window;
        compute_crc(window.data(&self.0)) == window.checksum(&self.0)
    }

    /// Convert the frame into physical units and check its integrity.
    pub fn decode(&self, profile: &Profile) -> Measurement {
        let raw_humidity = self.raw_humidity();
        let raw_temperature = self.raw_temperature();

        Measurement {
            humidity: conversions::humidity_reading_to_percent(raw_humidity),
            temperature: conversions::temperature_reading_to_celsius(raw_temperature),
            checksum_valid: self.checksum_matches(profile),
            raw_humidity,
            raw_temperature,
            status: self.status(profile),
        }
    }
}

/// Measurement is a single reading from the AHT20 sensor.
///
/// This is returned from the `measure` method. You get:
/// * humidity in % Relative Humidity
/// * temperature in degrees Celsius.
/// * whether the frame's checksum matched.
///
/// A reading with a bad checksum is still returned, it's up to you whether to trust it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub struct Measurement {
    pub humidity: f32,
    pub temperature: f32,
    pub checksum_valid: bool,
    pub raw_humidity: u32,
    pub raw_temperature: u32,
    /// The status byte from the frame itself. `None` when the profile's CRC window uses byte
    /// 0 for the checksum.
    pub status: Option<SensorStatus>,
}

impl Measurement {
    /// Temperature rounded to one decimal place.
    pub fn rounded_temperature(&self) -> f32 {
        conversions::round_to_tenths(self.temperature)
    }

    /// Humidity rounded to a whole percent.
    pub fn rounded_humidity(&self, rounding: HumidityRounding) -> f32 {
        conversions::round_humidity(self.humidity, rounding)
    }
}
