//! Calendar arithmetic and canonical rendering for temporal cells.
//!
//! Dates travel as days since the Unix epoch, times as nanoseconds since
//! midnight and timestamps as epoch seconds plus a fractional part. This module
//! converts between those and the `YYYY-MM-DD` / `HH:MM:SS[.F]` text forms
//! without going through floating point.

/// Nanoseconds in one second.
pub const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// Nanoseconds in one day.
pub const NANOS_PER_DAY: u64 = 86_400 * NANOS_PER_SECOND as u64;

/// Seconds in one day.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Largest fractional-second scale (nanoseconds).
pub const MAX_SCALE: u8 = 9;

/// Calculate days since Unix epoch (1970-01-01) from year, month, day.
#[must_use]
pub const fn days_from_ymd(year: i32, month: u32, day: u32) -> i32 {
    // Algorithm from https://howardhinnant.github.io/date_algorithms.html
    let y = if month <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u32;
    let doy = (153 * (if month > 2 { month - 3 } else { month + 9 }) + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe as i32 - 719_468
}

/// Inverse of [`days_from_ymd`]: civil (year, month, day) for a day count.
///
/// Works on `i64` so that any epoch-second value divided into days fits.
#[must_use]
pub const fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe as i64 + era * 400 + (if month <= 2 { 1 } else { 0 });
    (year, month, day)
}

/// Drop digits of `nanos` below `scale` (zero-fill, no rounding).
#[must_use]
pub const fn truncate_to_scale(nanos: u32, scale: u8) -> u32 {
    if scale >= MAX_SCALE {
        return nanos;
    }
    let unit = 10u32.pow((MAX_SCALE - scale) as u32);
    nanos - nanos % unit
}

/// Render `YYYY-MM-DD` for a day count, with a leading `-` for BCE years.
#[must_use]
pub fn format_date(days: i64) -> String {
    let (year, month, day) = civil_from_days(days);
    format!("{}-{month:02}-{day:02}", format_year(year))
}

/// Render `HH:MM:SS` plus exactly `scale` fractional digits.
#[must_use]
pub fn format_time(nanos_of_day: u64, scale: u8) -> String {
    let secs = nanos_of_day / u64::from(NANOS_PER_SECOND);
    let nanos = (nanos_of_day % u64::from(NANOS_PER_SECOND)) as u32;
    let mut out = format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60
    );
    push_fraction(&mut out, nanos, scale);
    out
}

/// Append `.F…` with exactly `scale` digits; nothing for scale 0.
pub fn push_fraction(out: &mut String, nanos: u32, scale: u8) {
    let scale = scale.min(MAX_SCALE);
    if scale == 0 {
        return;
    }
    let digits = nanos / 10u32.pow(u32::from(MAX_SCALE - scale));
    out.push('.');
    out.push_str(&format!("{digits:0width$}", width = usize::from(scale)));
}

fn format_year(year: i64) -> String {
    if year < 0 {
        format!("-{:04}", year.unsigned_abs())
    } else {
        format!("{year:04}")
    }
}
