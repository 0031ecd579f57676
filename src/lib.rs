#![cfg_attr(not(test), no_std)]
//! AHT20 driver.
//!
//! Example:
//!
//! ```rust
//! # use embedded_hal_mock::eh1::delay::NoopDelay as MockDelay;
//! # use embedded_hal_mock::eh1::i2c::Mock as I2cMock;
//! # use embedded_hal_mock::eh1::i2c::Transaction;
//! # use aht20_sensor::{AHT20, Command, SENSOR_ADDRESS};
//! # let expectations = vec![
//! #     // initialize: send Initialize, then read the calibration bit.
//! #     Transaction::write(SENSOR_ADDRESS, Command::Initialize.bytes().to_vec()),
//! #     Transaction::write(SENSOR_ADDRESS, vec![Command::CheckStatus as u8]),
//! #     Transaction::read(SENSOR_ADDRESS, vec![0b0000_1000]),
//! #     // send_trigger_measurement
//! #     Transaction::write(SENSOR_ADDRESS, Command::TriggerMeasurement.bytes().to_vec()),
//! #     // check_status - with ready bit set to 'ready' (off)
//! #     Transaction::write(SENSOR_ADDRESS, vec![Command::CheckStatus as u8]),
//! #     Transaction::read(SENSOR_ADDRESS, vec![0b0000_1000]),
//! #     // We can now read 7 bytes. status byte, 5 data bytes, crc byte.
//! #     // These are taken from a run of the sensor.
//! #     Transaction::read(
//! #         SENSOR_ADDRESS,
//! #         vec![0x1c, 0x65, 0xb4, 0x25, 0xcd, 0x26, 0xc6],
//! #     ),
//! # ];
//! # let mock_i2c = I2cMock::new(&expectations);
//! # let mut mock_delay = MockDelay::new();
//! let mut aht20 = AHT20::new(mock_i2c, SENSOR_ADDRESS);
//! aht20.initialize(&mut mock_delay).unwrap();
//! let measurement = aht20.measure(&mut mock_delay).unwrap();
//!
//! println!("temperature (aht20): {:.2}C", measurement.temperature);
//! println!("humidity (aht20): {:.2}%", measurement.humidity);
//! assert!(measurement.checksum_valid);
//! # aht20.destroy().done();
//! ```
//!
//! [AHT20 Datasheet](https://cdn-learn.adafruit.com/assets/assets/000/091/676/original/AHT20-datasheet-2020-4-16.pdf?1591047915)
//!
//! Note that the datasheet linked directly from the manufacturer's website
//! [Aogong AHT20](http://www.aosong.com/en/products-32.html) is an older datasheet (version
//! 1.0, rather than version 1.1 as linked above) and is significantly more
//! difficult to understand. I recommend reading version 1.1. All section
//! references in this crate are to the 1.1 version.
//!
//! The below is a flowchart of how the sensor gets initialized and measurements taken. Delays
//! and the polling budget are the defaults from [`Timing`]. A soft reset sends the driver back
//! to "Start".
//!
//! ```text
//!                 Start
//!                   │
//!                   ▼
//!   Command::Initialize (0xBE 0x08 0x00)
//!                   │
//!                   ▼
//!              Wait 80 ms
//!                   │
//!                   ▼
//!   Command::CheckStatus (0x71) ──► record Status::Calibrated
//!                   │
//!                   ▼
//! Command::TriggerMeasurement (0xAC 0x33 0x00)
//!                   │
//!                   ▼
//!              Wait 80 ms
//!                   │
//!                   ▼
//!   Command::CheckStatus (0x71) ◄───── Wait 10 ms
//!                   │                      ▲
//!                   ▼                      │
//!             Status::Busy ──► Yes ──► 50 polls? ──► Yes ──► Error::Timeout
//!                   │
//!                   ▼
//!                  No
//!                   │
//!                   ▼
//!              Read 7 bytes
//!                   │
//!                   ▼
//!   Calc Humidity and Temp, check CRC
//! ```
//!
//! A failed checksum does not discard the reading, it is returned with
//! `checksum_valid: false`. Use [`AHT20::measure_verified`] to retry until a reading passes.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{I2c, SevenBitAddress};

pub mod conversions;
pub mod crc;
mod error;
mod log;
mod profile;
mod reading;

pub use error::Error;
pub use profile::{
    Command, Config, CrcWindow, HumidityRounding, Profile, Status, StatusRead, Timing,
    SENSOR_ADDRESS,
};
pub use reading::{Measurement, RawFrame, SensorStatus};

/// Where the driver is in the sensor's lifecycle.
///
/// ```text
/// Uninitialized ─► Initializing ─► Ready ⇄ Measuring
///       ▲                                      │
///       └──────────────── reset ───────────────┘
/// ```
///
/// `Initializing` and `Measuring` only last for the duration of a call. A failed
/// initialization goes back to `Uninitialized`, a failed measurement goes back to `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub enum DriverState {
    Uninitialized,
    Initializing,
    Ready,
    Measuring,
}

/// An AHT20 sensor on the I2C bus `I`.
///
/// The address of the sensor will be `SENSOR_ADDRESS` from this package, unless there is some kind
/// of special address translating hardware in use.
///
/// All operations take `&mut self`, so only one exchange with the sensor can be in flight per
/// driver. To share the bus with other devices, hand the driver a bus proxy (for example one of
/// the `embedded-hal-bus` device types) rather than the bus itself.
pub struct AHT20<I>
where
    I: I2c,
{
    i2c: I,
    address: SevenBitAddress,
    config: Config,
    state: DriverState,
    calibrated: bool,
    last_checksum_valid: bool,
}

impl<I> AHT20<I>
where
    I: I2c,
{
    /// Create an AHT20 driver with the default [`Config`].
    ///
    /// This consumes the I2C bus `I`. The sensor is initialized on first use, or explicitly with
    /// `initialize`. The address will almost always be `SENSOR_ADDRESS` from this crate.
    pub fn new(i2c: I, address: SevenBitAddress) -> Self {
        Self::with_config(i2c, address, Config::default())
    }

    /// Create an AHT20 driver with a custom protocol profile and timing.
    pub fn with_config(i2c: I, address: SevenBitAddress, config: Config) -> Self {
        AHT20 {
            i2c,
            address,
            config,
            state: DriverState::Uninitialized,
            calibrated: false,
            last_checksum_valid: false,
        }
    }

    pub fn address(&self) -> SevenBitAddress {
        self.address
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replace the profile and timing. Takes effect from the next bus exchange.
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Whether the Initialize command has been sent since creation or the last reset.
    pub fn is_initialized(&self) -> bool {
        matches!(self.state, DriverState::Ready | DriverState::Measuring)
    }

    /// Whether the sensor reported its calibration bit after initialization.
    ///
    /// Always false before `initialize` and after `reset`, and when the profile skips the
    /// calibration check.
    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    /// Whether the most recent measurement passed its checksum. False until the first
    /// measurement.
    pub fn last_checksum_valid(&self) -> bool {
        self.last_checksum_valid
    }

    /// Run the AHT20 init routine.
    ///
    /// This is a no-op if the driver is already initialized. Otherwise it sends Initialize,
    /// waits `Timing::init_settle_ms` and, unless the profile disables it, reads the status
    /// byte to record whether the sensor is calibrated.
    ///
    /// ```text
    ///  Command::Initialize (0xBE)
    ///                 │
    ///                 ▼
    ///            Wait 80 ms
    ///                 │
    ///                 ▼
    ///  Command::CheckStatus (0x71) ──► Status::Calibrated
    /// ```
    pub fn initialize(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<I::Error>> {
        if self.is_initialized() {
            return Ok(());
        }

        self.transition(DriverState::Initializing);
        match self.run_initialize(delay) {
            Ok(()) => {
                self.transition(DriverState::Ready);
                Ok(())
            }
            Err(e) => {
                self.transition(DriverState::Uninitialized);
                Err(e)
            }
        }
    }

    fn run_initialize(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<I::Error>> {
        self.send_initialize()?;
        delay.delay_ms(self.config.timing.init_settle_ms);

        if self.config.profile.check_calibration {
            let status = self.check_status()?;
            self.calibrated = status.is_calibrated_with(self.config.profile.calibrated_mask);
            if !self.calibrated {
                log::warning!("aht20: calibration bit not set after initialize");
            }
        }

        Ok(())
    }

    /// check_status asks the AHT20 sensor to report its status.
    ///
    /// The sensor can be calibrated or not, also busy generating a sensor measurement or ready.
    /// How the byte is fetched depends on `Profile::status_read`.
    ///
    /// This is used by both initialize and measure.
    fn check_status(&mut self) -> Result<SensorStatus, Error<I::Error>> {
        let mut read_buffer = [0u8; 1];

        if self.config.profile.status_read == StatusRead::SelectRegister {
            self.i2c
                .write(self.address, Command::CheckStatus.bytes())
                .map_err(Error::I2c)?;
        }
        self.i2c
            .read(self.address, &mut read_buffer)
            .map_err(Error::I2c)?;

        Ok(SensorStatus::new(read_buffer[0]))
    }

    /// send_initialize sends the Initialize command to the sensor which make it calibrate.
    fn send_initialize(&mut self) -> Result<(), Error<I::Error>> {
        log::debug!("aht20: sending initialize to {=u8:#x}", self.address);
        self.i2c
            .write(self.address, Command::Initialize.bytes())
            .map_err(Error::I2c)
    }

    /// Measure temperature and humidity.
    ///
    /// Initializes the sensor first if needed. The measurement itself takes at least 80ms:
    ///
    /// ```text
    /// Command::TriggerMeasurement (0xAC)
    ///                  │
    ///                  ▼
    ///             Wait 80 ms
    ///                  │
    ///                  ▼
    ///   Command::CheckStatus (0x71) ◄──┐
    ///                  │               │
    ///                  ▼               │
    ///             Status::Busy  ───►  Yes (up to max_polls)
    ///                  │
    ///                  ▼
    ///                 No
    ///                  │
    ///                  ▼
    ///             Read 7 bytes
    ///                  │
    ///                  ▼
    ///   Calc Humidity and Temp, check CRC
    /// ```
    ///
    /// A checksum mismatch is reported through `Measurement::checksum_valid` and
    /// `last_checksum_valid`, not as an error. If the sensor is still busy after
    /// `Timing::max_polls` status reads this returns `Error::Timeout`. The driver stays
    /// initialized after any failure here.
    pub fn measure(&mut self, delay: &mut impl DelayNs) -> Result<Measurement, Error<I::Error>> {
        self.initialize(delay)?;

        self.transition(DriverState::Measuring);
        let result = self.measure_once(delay);
        self.transition(DriverState::Ready);

        let measurement = result?;
        self.last_checksum_valid = measurement.checksum_valid;
        if !measurement.checksum_valid {
            log::warning!("aht20: measurement checksum mismatch");
        }

        Ok(measurement)
    }

    /// Measure, retrying the whole exchange while the checksum fails.
    ///
    /// Makes at most `attempts` measurements and returns the first one with a valid checksum,
    /// or `Error::ChecksumMismatch` if none passed. Bus errors and timeouts end the retries
    /// straight away. An `attempts` of 0 still makes one measurement.
    pub fn measure_verified(
        &mut self,
        delay: &mut impl DelayNs,
        attempts: u8,
    ) -> Result<Measurement, Error<I::Error>> {
        let attempts = attempts.max(1);
        for attempt in 1..=attempts {
            let measurement = self.measure(delay)?;
            if measurement.checksum_valid {
                return Ok(measurement);
            }
            log::debug!("aht20: attempt {=u8} of {=u8} failed CRC", attempt, attempts);
        }

        Err(Error::ChecksumMismatch)
    }

    /// Measure and return the temperature in °C, rounded to one decimal place.
    pub fn temperature_celsius(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> Result<f32, Error<I::Error>> {
        Ok(self.measure(delay)?.rounded_temperature())
    }

    /// Measure and return the relative humidity in %, rounded to a whole percent with the
    /// profile's [`HumidityRounding`].
    pub fn humidity_percent(&mut self, delay: &mut impl DelayNs) -> Result<f32, Error<I::Error>> {
        let rounding = self.config.profile.humidity_rounding;
        Ok(self.measure(delay)?.rounded_humidity(rounding))
    }

    /// Perform one measurement and decode the frame. Expects an initialized sensor.
    fn measure_once(&mut self, delay: &mut impl DelayNs) -> Result<Measurement, Error<I::Error>> {
        self.send_trigger_measurement()?;
        delay.delay_ms(self.config.timing.measurement_ms);

        self.wait_until_ready(delay)?;

        // 1 byte status, 20 bits humidity + 20 bits temperature, 1 byte CRC
        let mut read_buffer = [0u8; 7];
        self.i2c
            .read(self.address, &mut read_buffer)
            .map_err(Error::I2c)?;

        Ok(RawFrame::new(read_buffer).decode(&self.config.profile))
    }

    /// Poll the status byte until the busy bit clears.
    ///
    /// Every poll is one status read. The wait between polls is skipped after the last one, so
    /// a sensor that never clears busy costs `max_polls` reads and `max_polls - 1` waits.
    fn wait_until_ready(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<I::Error>> {
        let Timing {
            poll_interval_ms,
            max_polls,
            ..
        } = self.config.timing;
        let busy_mask = self.config.profile.busy_mask;

        for poll in 1..=max_polls {
            if !self.check_status()?.is_busy_with(busy_mask) {
                return Ok(());
            }
            log::trace!("aht20: busy, poll {=u16} of {=u16}", poll, max_polls);
            if poll < max_polls {
                delay.delay_ms(poll_interval_ms);
            }
        }

        log::warning!("aht20: still busy after {=u16} polls", max_polls);
        Err(Error::Timeout)
    }

    /// Send the "Trigger Measurement" command to the sensor.
    ///
    /// This does not return anything, it only instructs the sensor to get the data ready. After
    /// sending this command, you need to wait 80ms before attempting to read data back.
    fn send_trigger_measurement(&mut self) -> Result<(), Error<I::Error>> {
        self.i2c
            .write(self.address, Command::TriggerMeasurement.bytes())
            .map_err(Error::I2c)
    }

    /// Send the Soft Reset command to the sensor.
    ///
    /// The datasheet in section 5.5 says the reset takes no more than 20ms, this waits
    /// `Timing::reset_settle_ms` afterwards. Calibration state is unknown after a reset, so
    /// the driver goes back to uninitialized and the next `measure` sends Initialize again.
    pub fn reset(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<I::Error>> {
        log::debug!("aht20: soft reset");
        self.i2c
            .write(self.address, Command::SoftReset.bytes())
            .map_err(Error::I2c)?;
        delay.delay_ms(self.config.timing.reset_settle_ms);

        self.calibrated = false;
        self.transition(DriverState::Uninitialized);

        Ok(())
    }

    /// Destroys this driver and releases the I2C bus `I`
    pub fn destroy(self) -> I {
        self.i2c
    }

    fn transition(&mut self, next: DriverState) {
        log::trace!("aht20: {} -> {}", self.state, next);
        self.state = next;
    }
}
