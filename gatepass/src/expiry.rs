//! Expiration parsing and formatting
//!
//! Expirations travel on the wire as ISO-8601 strings with a UTC offset
//! designator and second precision. Parsing is deliberately lenient: an
//! absent or unparsable expiration maps to a fixed far-future sentinel,
//! never to an error, so a malformed `Exp` degrades to "effectively
//! unbounded" rather than breaking the token.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Default validity window for freshly issued tokens.
const DEFAULT_TTL_HOURS: i64 = 4;

/// Fallback formats tried after RFC 3339 and RFC 2822.
const LENIENT_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// The sentinel expiration used when no meaningful one is available.
pub fn far_future() -> DateTime<FixedOffset> {
    Utc.with_ymd_and_hms(2199, 12, 31, 23, 59, 59)
        .single()
        .expect("sentinel date is a valid calendar date")
        .fixed_offset()
}

/// The expiration assigned to a freshly created token.
pub fn fresh(now: DateTime<Utc>) -> DateTime<FixedOffset> {
    (now + Duration::hours(DEFAULT_TTL_HOURS)).fixed_offset()
}

/// Parses an expiration string, falling back to [`far_future()`] when the
/// input cannot be understood.
pub fn parse(value: &str) -> DateTime<FixedOffset> {
    let value = value.trim();
    if value.is_empty() {
        return far_future();
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return parsed;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return parsed;
    }
    for format in LENIENT_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(value, format) {
            return parsed;
        }
        // Offset-free timestamps are read as UTC.
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Utc.from_utc_datetime(&parsed).fixed_offset();
        }
    }

    far_future()
}

/// Renders a point in time in the on-wire expiration format: ISO-8601
/// with offset, second precision, no sub-second component.
pub fn format(when: DateTime<FixedOffset>) -> String {
    when.to_rfc3339_opts(SecondsFormat::Secs, false)
}
