//! High-precision timestamp value type.
//!
//! Database timestamps carry up to nanosecond fractional seconds, a declared
//! scale and (for `TIMESTAMP_TZ`/`TIMESTAMP_LTZ`) a UTC offset. Neither
//! `std::time::SystemTime` nor a floating epoch value keeps all three, so
//! timestamp cells surface as [`HighPrecisionTimestamp`].

use std::fmt;

use crate::driver::RawTimestamp;
use crate::error::{CursorError, Result};
use crate::types::temporal::{
    MAX_SCALE, NANOS_PER_SECOND, SECONDS_PER_DAY, civil_from_days, push_fraction,
    truncate_to_scale,
};

/// Largest accepted UTC offset magnitude, in minutes.
pub const MAX_TIMEZONE_OFFSET_MINUTES: i32 = 24 * 60;

/// An immutable timestamp with nanosecond precision, scale and optional offset.
///
/// Epoch seconds and the fractional part are stored separately; the
/// fractional part never carries into the seconds.
///
/// # Example
///
/// ```rust
/// use sfcursor::HighPrecisionTimestamp;
///
/// let ts = HighPrecisionTimestamp::new(1_700_000_000, 123_456_789, 3, None).unwrap();
/// assert_eq!(ts.fractional_nanoseconds(), 123_000_000);
/// assert_eq!(ts.to_display_string(), "2023-11-14 22:13:20.123");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HighPrecisionTimestamp {
    epoch_seconds: i64,
    fractional_nanoseconds: u32,
    scale: u8,
    timezone_offset_minutes: Option<i32>,
}

impl HighPrecisionTimestamp {
    /// Build a timestamp, validating ranges.
    ///
    /// Fractional digits beyond `scale` are zero-filled, not rounded.
    pub fn new(
        epoch_seconds: i64,
        fractional_nanoseconds: u32,
        scale: u8,
        timezone_offset_minutes: Option<i32>,
    ) -> Result<Self> {
        if fractional_nanoseconds >= NANOS_PER_SECOND {
            return Err(CursorError::invalid_value(format!(
                "fractional nanoseconds out of range: {fractional_nanoseconds}"
            )));
        }
        if scale > MAX_SCALE {
            return Err(CursorError::invalid_value(format!(
                "timestamp scale out of range: {scale}"
            )));
        }
        if let Some(offset) = timezone_offset_minutes
            && offset.abs() > MAX_TIMEZONE_OFFSET_MINUTES
        {
            return Err(CursorError::invalid_value(format!(
                "timezone offset out of range: {offset} minutes"
            )));
        }

        Ok(Self {
            epoch_seconds,
            fractional_nanoseconds: truncate_to_scale(fractional_nanoseconds, scale),
            scale,
            timezone_offset_minutes,
        })
    }

    /// Wrap a driver-native timestamp.
    pub fn from_raw(raw: RawTimestamp) -> Result<Self> {
        Self::new(
            raw.epoch_seconds,
            raw.nanoseconds,
            raw.scale,
            raw.timezone_offset_minutes,
        )
    }

    /// Whole seconds since the Unix epoch (UTC).
    #[must_use]
    pub const fn epoch_seconds(&self) -> i64 {
        self.epoch_seconds
    }

    /// Sub-second remainder in nanoseconds, always in `[0, 999_999_999]`.
    ///
    /// This is the fractional part only, not nanoseconds since the epoch.
    #[must_use]
    pub const fn fractional_nanoseconds(&self) -> u32 {
        self.fractional_nanoseconds
    }

    /// Digits after the decimal point declared by the source column.
    #[must_use]
    pub const fn scale(&self) -> u8 {
        self.scale
    }

    /// Offset from UTC in minutes; `None` for timezone-naive columns.
    #[must_use]
    pub const fn timezone_offset_minutes(&self) -> Option<i32> {
        self.timezone_offset_minutes
    }

    /// True when the timestamp carries a UTC offset.
    #[must_use]
    pub const fn is_timezone_aware(&self) -> bool {
        self.timezone_offset_minutes.is_some()
    }

    /// Epoch seconds shifted into the local wall clock of the offset.
    #[must_use]
    pub const fn wall_clock_seconds(&self) -> i64 {
        match self.timezone_offset_minutes {
            Some(offset) => self.epoch_seconds.saturating_add(offset as i64 * 60),
            None => self.epoch_seconds,
        }
    }

    /// Render `YYYY-MM-DD HH:MM:SS[.F…][ ±HHMM]` with exactly `scale` digits.
    #[must_use]
    pub fn to_display_string(&self) -> String {
        let wall = self.wall_clock_seconds();
        let days = wall.div_euclid(SECONDS_PER_DAY);
        let secs_of_day = wall.rem_euclid(SECONDS_PER_DAY);
        let (year, month, day) = civil_from_days(days);

        let mut out = if year < 0 {
            format!("-{:04}", year.unsigned_abs())
        } else {
            format!("{year:04}")
        };
        out.push_str(&format!(
            "-{month:02}-{day:02} {:02}:{:02}:{:02}",
            secs_of_day / 3600,
            (secs_of_day / 60) % 60,
            secs_of_day % 60
        ));
        push_fraction(&mut out, self.fractional_nanoseconds, self.scale);

        if let Some(offset) = self.timezone_offset_minutes {
            let sign = if offset < 0 { '-' } else { '+' };
            let abs = offset.unsigned_abs();
            out.push_str(&format!(" {sign}{:02}{:02}", abs / 60, abs % 60));
        }
        out
    }
}

impl fmt::Display for HighPrecisionTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl TryFrom<RawTimestamp> for HighPrecisionTimestamp {
    type Error = CursorError;

    fn try_from(raw: RawTimestamp) -> Result<Self> {
        Self::from_raw(raw)
    }
}
