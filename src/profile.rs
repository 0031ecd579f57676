//! Protocol constants and the configurable protocol profile.
//!
//! Several AHT20 drivers in the wild disagree on details of the protocol: which bytes the
//! frame checksum covers, whether the status byte is read via a register select or a bare
//! read, and how humidity is rounded for display. Rather than hard-code one of them, these
//! details live in a [`Profile`], and the timing of the exchange lives in [`Timing`].

/// AHT20 sensor's I2C address.
pub const SENSOR_ADDRESS: u8 = 0b0011_1000; // This is I2C address 0x38;

/// Commands that can be sent to the AHT20 sensor.
///
/// Note that a few of these take parameters but that there are no explanations provided about what
/// those parameters actually are. You should consider the command and specified parameters to be
/// just one three-byte command. These can be found in the datasheet, Section 5.3, page 8, Table 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    CheckStatus = 0b0111_0001, // 0x71, Get a byte of status word.
    // Used after Initialize to read the calibration bit, and after TriggerMeasurement to see
    // whether the data is ready. If Status::Busy is set, wait longer before reading the data.
    Initialize = 0b1011_1110, // 0xBE, Initialize and calibrate the sensor.
    // This command takes two bytes of parameter: 0b0000_1000 (0x08), then 0b0000_0000 (0x00).
    TriggerMeasurement = 0b1010_1100, // 0xAC
    // This command takes two bytes of parameter: 0b00110011 (0x33), then 0b0000_0000 (0x00).
    SoftReset = 0b1011_1010, // 0xBA
    // Also see Section 5.5. This takes 20ms or less to complete.
}

impl Command {
    /// The full byte sequence written to the bus for this command, parameters included.
    pub fn bytes(self) -> &'static [u8] {
        match self {
            Command::CheckStatus => &[Command::CheckStatus as u8],
            Command::Initialize => &[Command::Initialize as u8, 0b0000_1000, 0b0000_0000],
            Command::TriggerMeasurement => {
                &[Command::TriggerMeasurement as u8, 0b0011_0011, 0b0000_0000]
            }
            Command::SoftReset => &[Command::SoftReset as u8],
        }
    }
}

/// Status byte meanings.
///
/// Table 10, page 8 of the datasheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Busy = 0b1000_0000, // Status bit for busy - 8th bit enabled. 1<<7, 0x80
    // 1 is Busy measuring. 0 is "Free in dormant state" or "ready".
    Calibrated = 0b0000_1000, // Status bit for calibrated - 4th bit enabled. 1<<3, 0x08.
    // 1 is Calibrated, 0 is uncalibrated.
}

/// Which six bytes of the 7-byte frame the checksum covers, and where the checksum sits.
///
/// The datasheet (section 5.4.4) and frames captured from real sensors agree on
/// [`CrcWindow::STATUS_INCLUDED`]. [`CrcWindow::STATUS_EXCLUDED`] describes a variant seen in
/// some ports that checksums bytes 1 to 6 and compares against byte 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub struct CrcWindow {
    data_start: u8,
    checksum_index: u8,
}

impl CrcWindow {
    /// Checksum over bytes 0..=5 (status included), compared against byte 6.
    pub const STATUS_INCLUDED: CrcWindow = CrcWindow {
        data_start: 0,
        checksum_index: 6,
    };

    /// Checksum over bytes 1..=6 (status excluded), compared against byte 0.
    pub const STATUS_EXCLUDED: CrcWindow = CrcWindow {
        data_start: 1,
        checksum_index: 0,
    };

    /// Build a window from the first covered byte and the index of the checksum byte.
    ///
    /// Six bytes are always covered, so `data_start` must be 0 or 1, and the checksum byte
    /// must be the one byte left over. Returns `None` for windows that don't fit in the frame
    /// or that would checksum their own checksum byte.
    pub const fn new(data_start: u8, checksum_index: u8) -> Option<Self> {
        if data_start > 1 || checksum_index > 6 {
            return None;
        }
        if checksum_index >= data_start && checksum_index < data_start + 6 {
            return None;
        }
        Some(CrcWindow {
            data_start,
            checksum_index,
        })
    }

    /// The six checksummed bytes of `frame`.
    pub fn data<'a>(&self, frame: &'a [u8; 7]) -> &'a [u8] {
        let start = self.data_start as usize;
        &frame[start..start + 6]
    }

    /// The checksum byte of `frame`.
    pub fn checksum(&self, frame: &[u8; 7]) -> u8 {
        frame[self.checksum_index as usize]
    }

    /// Whether byte 0 of the frame is the sensor's status byte. False when the window puts
    /// the checksum there.
    pub fn carries_status(&self) -> bool {
        self.checksum_index != 0
    }
}

impl Default for CrcWindow {
    fn default() -> Self {
        CrcWindow::STATUS_INCLUDED
    }
}

/// How the status byte is fetched from the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub enum StatusRead {
    /// Write the status register selector (`0x71`) then read one byte.
    #[default]
    SelectRegister,
    /// Read one byte without selecting a register first.
    PlainRead,
}

/// Rounding rule used when humidity is reported as a whole percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub enum HumidityRounding {
    /// Round to the nearest whole percent, halves away from zero.
    #[default]
    Nearest,
    /// Add 0.5 and truncate. Identical to `Nearest` for non-negative readings.
    AddHalfTruncate,
}

/// Protocol details that vary between AHT20 implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub struct Profile {
    pub crc_window: CrcWindow,
    pub status_read: StatusRead,
    /// Status bit that is set while a measurement is in progress.
    pub busy_mask: u8,
    /// Status bit that is set once the sensor has loaded its calibration.
    pub calibrated_mask: u8,
    pub humidity_rounding: HumidityRounding,
    /// Read the status byte after sending Initialize to pick up the calibration bit.
    pub check_calibration: bool,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            crc_window: CrcWindow::STATUS_INCLUDED,
            status_read: StatusRead::SelectRegister,
            busy_mask: Status::Busy as u8,
            calibrated_mask: Status::Calibrated as u8,
            humidity_rounding: HumidityRounding::Nearest,
            check_calibration: true,
        }
    }
}

/// Delays and the polling budget, all in milliseconds.
///
/// The datasheet asks for a 10ms wait after Initialize and 80ms after TriggerMeasurement.
/// Ports have used anything from 10 to 200ms for the former, 80ms is the default here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub struct Timing {
    pub init_settle_ms: u32,
    pub measurement_ms: u32,
    pub poll_interval_ms: u32,
    /// Maximum number of status reads while waiting for the busy bit to clear. With the
    /// defaults this bounds the wait to roughly half a second past the measurement delay.
    pub max_polls: u16,
    pub reset_settle_ms: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            init_settle_ms: 80,
            measurement_ms: 80,
            poll_interval_ms: 10,
            max_polls: 50,
            reset_settle_ms: 20,
        }
    }
}

/// Everything an [`AHT20`](crate::AHT20) needs to know beyond its bus and address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub struct Config {
    pub profile: Profile,
    pub timing: Timing,
}

#[cfg(test)]
mod tests {
    use super::{Command, CrcWindow, Profile, Timing};

    #[test]
    fn command_bytes() {
        assert_eq!(Command::Initialize.bytes(), &[0xBE, 0x08, 0x00]);
        assert_eq!(Command::TriggerMeasurement.bytes(), &[0xAC, 0x33, 0x00]);
        assert_eq!(Command::SoftReset.bytes(), &[0xBA]);
        assert_eq!(Command::CheckStatus.bytes(), &[0x71]);
    }

    #[test]
    fn default_profile_matches_datasheet() {
        let profile = Profile::default();
        assert_eq!(profile.crc_window, CrcWindow::STATUS_INCLUDED);
        assert_eq!(profile.busy_mask, 0x80);
        assert_eq!(profile.calibrated_mask, 0x08);
        assert!(profile.check_calibration);
    }

    #[test]
    fn default_timing() {
        let timing = Timing::default();
        assert_eq!(timing.measurement_ms, 80);
        assert_eq!(timing.poll_interval_ms, 10);
        assert_eq!(timing.max_polls, 50);
        assert_eq!(timing.reset_settle_ms, 20);
    }

    #[test]
    fn crc_window_slices() {
        let frame = [0u8, 1, 2, 3, 4, 5, 6];

        let included = CrcWindow::STATUS_INCLUDED;
        assert_eq!(included.data(&frame), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(included.checksum(&frame), 6);

        let excluded = CrcWindow::STATUS_EXCLUDED;
        assert_eq!(excluded.data(&frame), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(excluded.checksum(&frame), 0);
    }

    #[test]
    fn crc_window_rejects_out_of_frame() {
        assert_eq!(CrcWindow::new(0, 6), Some(CrcWindow::STATUS_INCLUDED));
        assert_eq!(CrcWindow::new(1, 0), Some(CrcWindow::STATUS_EXCLUDED));
        assert_eq!(CrcWindow::new(2, 0), None);
        assert_eq!(CrcWindow::new(0, 7), None);
    }

    #[test]
    fn crc_window_rejects_checksum_inside_data() {
        // Bytes 1..=6 are covered, so byte 6 can't also hold the checksum.
        assert_eq!(CrcWindow::new(1, 6), None);
        assert_eq!(CrcWindow::new(0, 3), None);
        assert_eq!(CrcWindow::new(0, 0), None);
        assert_eq!(CrcWindow::new(1, 1), None);
    }

    #[test]
    fn crc_window_status_byte() {
        assert!(CrcWindow::STATUS_INCLUDED.carries_status());
        assert!(!CrcWindow::STATUS_EXCLUDED.carries_status());
    }
}
