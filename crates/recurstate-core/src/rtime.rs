//! Instance-date conversions.
//!
//! The blob encodes every date and datetime as a 32-bit count of minutes since
//! 1601-01-01 00:00 UTC, the FILETIME epoch at minute resolution. Bounds and
//! the deleted/modified lists hold day values (floored to midnight); exception
//! datetimes carry the time of day as well.

use chrono::{DateTime, Utc};

/// Minutes between 1601-01-01 and 1970-01-01 (the Unix epoch).
pub const UNIX_EPOCH_MINUTES: i64 = 194_074_560;

/// Minutes in one day.
pub const MINUTES_PER_DAY: u32 = 1440;

/// End-bound day value used by patterns that never end (4500-12-31 23:59).
pub const NO_END_DATE: u32 = 0x5AE9_80DF;

/// Convert an instance-date value to an absolute UTC timestamp.
pub fn to_utc(value: u32) -> DateTime<Utc> {
    let secs = (i64::from(value) - UNIX_EPOCH_MINUTES) * 60;
    // Every u32 minute count lands inside chrono's representable range.
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Convert a UTC timestamp to an instance-date value, clamped to the
/// representable range (sub-minute precision is floored away).
pub fn from_utc(at: DateTime<Utc>) -> u32 {
    let minutes = at.timestamp().div_euclid(60) + UNIX_EPOCH_MINUTES;
    minutes.clamp(0, i64::from(u32::MAX)) as u32
}

/// Floor an instance-date value to midnight of its day.
pub fn day_floor(value: u32) -> u32 {
    value - value % MINUTES_PER_DAY
}

/// Instance-date day value for the calendar date of `at`.
pub fn day_value(at: DateTime<Utc>) -> u32 {
    day_floor(from_utc(at))
}

/// Absolute timestamp for a day value plus minutes past its midnight.
pub fn at_offset(day: u32, offset_minutes: u32) -> DateTime<Utc> {
    to_utc(day.saturating_add(offset_minutes))
}
