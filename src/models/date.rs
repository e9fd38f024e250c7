//! The rental API sends dates as strings in several layouts, as epoch
//! milliseconds, or as `[year, month, day, ...]` arrays. Everything is
//! normalized to `NaiveDateTime` here and nowhere else.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

/// Layout used when sending date-times back to the API.
pub const API_FORMAT: &str = "%Y-%m-%d %H:%M";

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

pub fn parse_flexible(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => parse_str(s),
        Value::Array(parts) => parse_parts(parts),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.naive_utc()),
        _ => None,
    }
}

pub fn parse_str(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// [Y, M, D] with a 1-based month, optionally followed by h, m, s.
fn parse_parts(parts: &[Value]) -> Option<NaiveDateTime> {
    if parts.len() < 3 {
        return None;
    }
    let nums: Vec<i64> = parts
        .iter()
        .take(6)
        .map(|p| p.as_i64())
        .collect::<Option<Vec<_>>>()?;

    let date = NaiveDate::from_ymd_opt(
        i32::try_from(nums[0]).ok()?,
        u32::try_from(nums[1]).ok()?,
        u32::try_from(nums[2]).ok()?,
    )?;
    let at = |i: usize| nums.get(i).copied().unwrap_or(0);
    date.and_hms_opt(
        u32::try_from(at(3)).ok()?,
        u32::try_from(at(4)).ok()?,
        u32::try_from(at(5)).ok()?,
    )
}

/// True when the value carries something worth parsing, whether or not it
/// parses.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// serde adapter for optional flexible date fields; unparseable input is `None`.
pub fn flexible<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_flexible))
}

pub fn format_api(dt: &NaiveDateTime) -> String {
    dt.format(API_FORMAT).to_string()
}

/// Serializes optional date-times in the API layout, `null` when absent.
pub fn serialize_api<S: Serializer>(dt: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error> {
    match dt {
        Some(dt) => serializer.serialize_str(&format_api(dt)),
        None => serializer.serialize_none(),
    }
}
