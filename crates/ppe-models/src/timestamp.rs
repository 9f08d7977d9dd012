//! Wall-clock formatting helpers.
//!
//! Alert bodies and evidence ids render times in a fixed, configured UTC
//! offset rather than the host's local zone.

use chrono::{DateTime, FixedOffset, Utc};
use thiserror::Error;

/// Maximum supported UTC offset, in hours.
pub const MAX_UTC_OFFSET_HOURS: i32 = 14;

/// Build a fixed offset from a whole number of hours east of UTC.
///
/// # Examples
/// ```
/// use ppe_models::timestamp::utc_offset_hours;
/// assert_eq!(utc_offset_hours(3).unwrap().local_minus_utc(), 3 * 3600);
/// assert!(utc_offset_hours(20).is_err());
/// ```
pub fn utc_offset_hours(hours: i32) -> Result<FixedOffset, TimestampError> {
    if hours.abs() > MAX_UTC_OFFSET_HOURS {
        return Err(TimestampError::OffsetOutOfRange(hours));
    }
    FixedOffset::east_opt(hours * 3600).ok_or(TimestampError::OffsetOutOfRange(hours))
}

/// Format a timestamp as `HH:MM:SS` in the given offset.
pub fn format_clock(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format("%H:%M:%S").to_string()
}

#[derive(Debug, Error, PartialEq)]
pub enum TimestampError {
    #[error("UTC offset out of range: {0} hours")]
    OffsetOutOfRange(i32),
}
