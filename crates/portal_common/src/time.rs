// --- File: crates/portal_common/src/time.rs ---
//! Timestamp normalization.
//!
//! Dates reach the portal as RFC 3339 strings, bare dates, provider timestamp
//! objects (`{"_seconds": .., "_nanoseconds": ..}` or `{"seconds": .., "nanos": ..}`)
//! and epoch milliseconds. Everything is turned into `DateTime<Utc>` here and
//! stored as RFC 3339 text with millisecond precision.

use chrono::{
    DateTime, Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat,
    TimeZone, Utc,
};
use chrono_tz::Tz;
use serde_json::Value;

use crate::error::{validation_error, PortalError};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Years the portal accepts, the range RFC 3339 can write.
const YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

fn in_range<T: Datelike>(value: T, input: &dyn std::fmt::Display) -> Result<T, PortalError> {
    if YEARS.contains(&value.year()) {
        Ok(value)
    } else {
        Err(validation_error(format!("Date out of range: {}", input)))
    }
}

/// Normalizes any supported JSON encoding of an instant.
pub fn normalize_timestamp(value: &Value) -> Result<DateTime<Utc>, PortalError> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => {
            let millis = n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.round() as i64))
                .ok_or_else(|| validation_error(format!("Invalid timestamp: {}", n)))?;
            let instant = DateTime::from_timestamp_millis(millis)
                .ok_or_else(|| validation_error(format!("Timestamp out of range: {}", millis)))?;
            in_range(instant, &millis)
        }
        Value::Object(map) => {
            let seconds = map
                .get("_seconds")
                .or_else(|| map.get("seconds"))
                .and_then(Value::as_i64)
                .ok_or_else(|| validation_error("Timestamp object without seconds"))?;
            let nanos = map
                .get("_nanoseconds")
                .or_else(|| map.get("nanoseconds"))
                .or_else(|| map.get("nanos"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            let nanos = u32::try_from(nanos)
                .map_err(|_| validation_error("Timestamp nanoseconds out of range"))?;
            let instant = DateTime::from_timestamp(seconds, nanos)
                .ok_or_else(|| validation_error(format!("Timestamp out of range: {}", seconds)))?;
            in_range(instant, &seconds)
        }
        other => Err(validation_error(format!("Unsupported timestamp value: {}", other))),
    }
}

/// Parses a textual timestamp. Strings without an offset are read as UTC.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, PortalError> {
    let input = input.trim();
    in_range(parse_any_timestamp(input)?, &input)
}

fn parse_any_timestamp(input: &str) -> Result<DateTime<Utc>, PortalError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    Err(validation_error(format!("Invalid timestamp: {}", input)))
}

/// Parses a `YYYY-MM-DD` query parameter.
pub fn parse_date(input: &str) -> Result<NaiveDate, PortalError> {
    let date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| validation_error(format!("Invalid date '{}', expected YYYY-MM-DD", input)))?;
    in_range(date, &input)
}

/// `date` moved by `days`, or a validation error at the ends of the calendar.
pub fn shift_days(date: NaiveDate, days: i64) -> Result<NaiveDate, PortalError> {
    let step = Days::new(days.unsigned_abs());
    let shifted = if days >= 0 {
        date.checked_add_days(step)
    } else {
        date.checked_sub_days(step)
    };
    shifted.ok_or_else(|| validation_error(format!("Date out of range: {}", date)))
}

/// Canonical storage form: RFC 3339, UTC, millisecond precision.
pub fn to_storage(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn from_storage(stored: &str) -> Result<DateTime<Utc>, PortalError> {
    parse_timestamp(stored)
}

/// Monday of the week containing `date`.
pub fn week_monday(date: NaiveDate) -> Result<NaiveDate, PortalError> {
    shift_days(date, -i64::from(date.weekday().num_days_from_monday()))
}

/// The instant at which `date` reaches `time` in `tz`.
///
/// A local time skipped by a DST change resolves to the first valid instant after it.
pub fn local_instant(date: NaiveDate, time: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let mut naive = date.and_time(time);
    for _ in 0..4 {
        if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
            return dt.with_timezone(&Utc);
        }
        naive += Duration::minutes(30);
    }
    // no zone has a gap longer than two hours
    tz.from_utc_datetime(&naive).with_timezone(&Utc)
}

/// `[Monday 00:00, next Monday 00:00)` of the week containing `date`, in `tz`.
pub fn week_bounds(
    date: NaiveDate,
    tz: Tz,
) -> Result<(DateTime<Utc>, DateTime<Utc>), PortalError> {
    let monday = week_monday(date)?;
    let next_monday = shift_days(monday, 7)?;
    Ok((
        local_instant(monday, NaiveTime::MIN, tz),
        local_instant(next_monday, NaiveTime::MIN, tz),
    ))
}

/// Calendar date of `instant` in `tz`.
pub fn local_date(instant: &DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Parses an IANA time zone name from configuration.
pub fn parse_time_zone(name: &str) -> Result<Tz, PortalError> {
    name.parse::<Tz>()
        .map_err(|_| crate::error::config_error(format!("Unknown time zone '{}'", name)))
}
