//! Clock arithmetic for reconstructing per-sample timestamps.
//!
//! Sample times are derived from a recording's wall-clock start time and the
//! sample's position at a fixed sampling rate. All arithmetic is done in whole
//! microseconds so that 250 Hz yields exact 4 ms steps. Only the time of day is
//! kept: a recording that runs past midnight wraps back to 00:00.

use chrono::{Duration, NaiveTime, Timelike};
use thiserror::Error;

/// Errors from parsing clock values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    #[error("time data '{0}' does not match format 'HH:MM:SS.ffffff'")]
    InvalidFormat(String),

    #[error("sampling rate must be positive")]
    ZeroSamplingRate,
}

/// Parse a recording start time such as `13:04:55.123`.
///
/// The fractional part is required and may have 1 to 6 digits. Surrounding
/// whitespace is rejected.
pub fn parse_start_time(value: &str) -> Result<NaiveTime, ClockError> {
    let invalid = || ClockError::InvalidFormat(value.to_string());

    // `%.f` also accepts a missing fraction and nanoseconds, the export format does not.
    let (clock, fraction) = value.split_once('.').ok_or_else(invalid)?;
    if !clock.bytes().all(|b| b.is_ascii_digit() || b == b':')
        || !(1..=6).contains(&fraction.len())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    NaiveTime::parse_from_str(value, "%H:%M:%S%.f").map_err(|_| invalid())
}

/// Offset of the sample at `position` from the first sample.
pub fn sample_offset(position: usize, sampling_rate_hz: u32) -> Result<Duration, ClockError> {
    if sampling_rate_hz == 0 {
        return Err(ClockError::ZeroSamplingRate);
    }
    let micros = position as i64 * 1_000_000 / i64::from(sampling_rate_hz);
    Ok(Duration::microseconds(micros))
}

/// Time of day of the sample at `position`, counted from `start`.
///
/// Wraps at midnight.
pub fn sample_time(
    start: NaiveTime,
    position: usize,
    sampling_rate_hz: u32,
) -> Result<NaiveTime, ClockError> {
    let offset = sample_offset(position, sampling_rate_hz)?;
    let (time, _wrapped_secs) = start.overflowing_add_signed(offset);
    Ok(time)
}

/// Render a time of day as `HH:MM:SS.ffffff`.
///
/// Whole seconds are rendered without a fraction (`HH:MM:SS`). Sub-microsecond
/// precision is truncated.
pub fn format_time_of_day(time: NaiveTime) -> String {
    let micros = time.nanosecond() / 1_000;
    if micros == 0 {
        time.format("%H:%M:%S").to_string()
    } else {
        format!("{}.{:06}", time.format("%H:%M:%S"), micros)
    }
}
