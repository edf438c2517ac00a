//! Cell-level conversions shared by the delimited and spreadsheet parsers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::types::Value;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse index text into a timestamp.
///
/// Accepts `YYYY-MM-DD[ T]HH:MM[:SS[.fff]]`, the same with `/` separators, US-style
/// `MM/DD/YYYY HH:MM[:SS]`, bare dates (midnight), and RFC 3339 with an offset (converted to UTC).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc())
}

/// Convert an Excel serial day number (1900 date system) into a timestamp.
///
/// Sub-second precision is rounded to the millisecond.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(NaiveTime::MIN);
    let millis = (serial * 86_400_000.0).round();
    if millis > i64::MAX as f64 {
        return None;
    }
    epoch.checked_add_signed(TimeDelta::try_milliseconds(millis as i64)?)
}

/// Infer a typed value from delimited-text cell content.
///
/// Empty text, the missing marker and `NaN` become [`Value::Null`]; then integer, float and
/// boolean parses are tried in that order; anything else is kept as text.
///
/// There is no built-in list of null spellings: `NA`, `N/A`, `null` or `#N/A` stay
/// [`Value::Utf8`] unless one of them is the configured missing marker.
pub fn infer_text_value(raw: &str, missing_marker: &str) -> Value {
    let s = raw.trim();
    if s.is_empty() || s == missing_marker {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Int64(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return if f.is_nan() { Value::Null } else { Value::Float64(f) };
    }
    match s {
        "true" | "True" | "TRUE" => Value::Bool(true),
        "false" | "False" | "FALSE" => Value::Bool(false),
        _ => Value::Utf8(s.to_string()),
    }
}
