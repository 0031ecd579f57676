//! Raw sensor readings to percent relative humidity and degrees Celsius.
//!
//! These functions are used by [`Measurement`] but are provided here should you need to use
//! them on raw values yourself. Both raw readings are 20-bit unsigned values, the formulas
//! are in section 6 of the datasheet.
//!
//! No clamping is done. The sensor's only fault signals are the status byte and the
//! checksum, so out-of-range values are handed back as they were computed.
//!
//! [`Measurement`]: crate::Measurement

use crate::profile::HumidityRounding;

/// 2^20, the full scale of both 20-bit readings.
const FULL_SCALE: f32 = (1u32 << 20) as f32;

/// Largest value a 20-bit reading can hold.
pub const RAW_MAX: u32 = (1 << 20) - 1;

/// Convert the raw humidity reading to percent relative humidity.
///
/// From section 6.1 "Relative humidity transformation": `RH = S_RH / 2^20 * 100%`.
pub fn humidity_reading_to_percent(reading: u32) -> f32 {
    (reading as f32) / FULL_SCALE * 100.0
}

/// Convert the raw temperature reading to degrees Celsius.
///
/// From section 6.2 "Temperature transformation": `T = S_T / 2^20 * 200 - 50`.
pub fn temperature_reading_to_celsius(reading: u32) -> f32 {
    (reading as f32) / FULL_SCALE * 200.0 - 50.0
}

/// Round to one decimal place, halves away from zero.
pub fn round_to_tenths(value: f32) -> f32 {
    round_half_away(value * 10.0) / 10.0
}

/// Round a humidity percentage to a whole percent using `rounding`.
pub fn round_humidity(value: f32, rounding: HumidityRounding) -> f32 {
    match rounding {
        HumidityRounding::Nearest => round_half_away(value),
        // `as` truncates towards zero.
        HumidityRounding::AddHalfTruncate => ((value + 0.5) as i32) as f32,
    }
}

// f32::round lives in std, so round through an integer. Both readings are far inside the
// i32 range once scaled. The fraction is compared rather than adding 0.5 first, since the
// addition itself can round up (0.49999997 + 0.5 == 1.0 in f32).
fn round_half_away(value: f32) -> f32 {
    let truncated = value as i32 as f32;
    let fraction = value - truncated;
    if fraction >= 0.5 {
        truncated + 1.0
    } else if fraction <= -0.5 {
        truncated - 1.0
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_bounds() {
        assert_eq!(temperature_reading_to_celsius(0), -50.0);
        let top = temperature_reading_to_celsius(RAW_MAX);
        assert!((top - 150.0).abs() < 0.001, "top of range was {}", top);
    }

    #[test]
    fn humidity_bounds() {
        assert_eq!(humidity_reading_to_percent(0), 0.0);
        let top = humidity_reading_to_percent(RAW_MAX);
        assert!(top < 100.0 && top > 99.999, "top of range was {}", top);
    }

    #[test]
    fn humidity_is_monotonic() {
        let mut previous = humidity_reading_to_percent(0);
        // Step through the range, including both ends and a few awkward values.
        for reading in (0..=RAW_MAX).step_by(997).chain([RAW_MAX - 1, RAW_MAX]) {
            let current = humidity_reading_to_percent(reading);
            assert!(current >= previous, "{} decreased at {}", current, reading);
            previous = current;
        }
    }

    #[test]
    fn midpoints() {
        // Half scale is 50%RH and 50C.
        assert_eq!(humidity_reading_to_percent(1 << 19), 50.0);
        assert_eq!(temperature_reading_to_celsius(1 << 19), 50.0);
    }

    #[test]
    fn tenths_round_half_away_from_zero() {
        assert_eq!(round_to_tenths(22.517), 22.5);
        assert_eq!(round_to_tenths(22.56), 22.6);
        assert_eq!(round_to_tenths(-12.25), -12.3);
        assert_eq!(round_to_tenths(-0.04), 0.0);
    }

    #[test]
    fn humidity_rounding_modes() {
        assert_eq!(round_humidity(39.728, HumidityRounding::Nearest), 40.0);
        assert_eq!(round_humidity(39.5, HumidityRounding::Nearest), 40.0);
        assert_eq!(round_humidity(39.49, HumidityRounding::Nearest), 39.0);
        assert_eq!(round_humidity(39.728, HumidityRounding::AddHalfTruncate), 40.0);
        assert_eq!(round_humidity(39.49, HumidityRounding::AddHalfTruncate), 39.0);
        // The two only part ways below zero, which a healthy sensor never reports.
        assert_eq!(round_humidity(-0.7, HumidityRounding::Nearest), -1.0);
        assert_eq!(round_humidity(-0.7, HumidityRounding::AddHalfTruncate), 0.0);
    }

    #[test]
    fn nearest_just_below_half() {
        // The largest f32 below 0.5, and its neighbours further up the scale.
        assert_eq!(round_humidity(0.49999997, HumidityRounding::Nearest), 0.0);
        assert_eq!(round_humidity(-0.49999997, HumidityRounding::Nearest), 0.0);
        assert_eq!(round_humidity(40.499996, HumidityRounding::Nearest), 40.0);
        assert_eq!(round_humidity(0.5, HumidityRounding::Nearest), 1.0);
        assert_eq!(round_humidity(-0.5, HumidityRounding::Nearest), -1.0);
    }
}
