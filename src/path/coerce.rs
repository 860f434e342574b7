//! Scalar coercion of node text

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use std::borrow::Cow;

/// Base-10 integer, surrounding whitespace ignored
pub fn to_int(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

/// Float using `separator` as the decimal mark
pub fn to_float(value: &str, separator: char) -> Option<f64> {
    let normalized = if separator == '.' {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(value.replace(separator, "."))
    };
    normalized.trim().parse().ok()
}

/// `true` or `1`, case-insensitive; anything else is false
pub fn to_bool(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("true") || value == "1"
}

/// Seconds since the Unix epoch
pub fn to_timestamp(value: &str) -> Option<i64> {
    parse_date_time(value).map(|dt| dt.timestamp())
}

/// Best-effort date/time parsing. Values without an offset are taken as UTC.
pub fn parse_date_time(value: &str) -> Option<DateTime<FixedOffset>> {
    parse_date_time_at(value, Utc::now())
}

const ZONED_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f %z", "%Y-%m-%dT%H:%M:%S%.f%z"];

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d.%m.%Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d %B %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%Y%m%d",
];

pub(crate) fn parse_date_time_at(value: &str, now: DateTime<Utc>) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(relative) = parse_relative(value, now) {
        return Some(relative.fixed_offset());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt);
    }
    if let Some(dt) = ZONED_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(value, fmt).ok())
    {
        return Some(dt);
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc().fixed_offset())
}

/// `@<epoch seconds>` and the words now, today, yesterday, tomorrow
fn parse_relative(value: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if let Some(epoch) = value.strip_prefix('@') {
        return DateTime::from_timestamp(epoch.parse().ok()?, 0);
    }

    let today = now.date_naive();
    let day = match value.to_ascii_lowercase().as_str() {
        "now" => return Some(now),
        "today" | "midnight" => today,
        "yesterday" => today.checked_sub_days(Days::new(1))?,
        "tomorrow" => today.checked_add_days(Days::new(1))?,
        _ => return None,
    };
    day.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc())
}
