// --- File: crates/portal_schedule/src/tasks.rs ---
//! Task request validation and the week window used to query tasks.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use portal_common::error::{validation_error, PortalError};
use portal_common::models::TaskDraft;
use portal_common::time::{
    local_date, normalize_timestamp, parse_date, parse_time_zone, parse_timestamp, week_bounds,
};
use portal_config::GcalConfig;
use serde::Deserialize;
use serde_json::Value;

/// Calendar and time zone the schedule is laid out in.
#[derive(Debug, Clone)]
pub struct ScheduleSettings {
    pub calendar_id: String,
    pub time_zone: Tz,
}

impl ScheduleSettings {
    pub fn from_config(config: &GcalConfig) -> Result<Self, PortalError> {
        Ok(Self {
            calendar_id: config.calendar_id_or_default(),
            time_zone: parse_time_zone(&config.time_zone)?,
        })
    }
}

/// Body of task creation and replacement.
///
/// Dates may arrive in any encoding `normalize_timestamp` understands.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskRequest {
    pub technician_id: String,
    pub technician_name: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "2025-06-10T09:00:00+02:00"))]
    pub start_date: Value,
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "2025-06-10T13:00:00+02:00"))]
    pub end_date: Value,
    pub description: String,
    pub address: Option<String>,
    pub links: Option<Vec<String>>,
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

impl TaskRequest {
    pub fn validate(self) -> Result<TaskDraft, PortalError> {
        if self.technician_id.trim().is_empty()
            || self.technician_name.trim().is_empty()
            || self.description.trim().is_empty()
            || is_blank(&self.start_date)
            || is_blank(&self.end_date)
        {
            return Err(validation_error(
                "technicianId, technicianName, startDate, endDate and description are required",
            ));
        }

        let start_date = normalize_timestamp(&self.start_date)?;
        let end_date = normalize_timestamp(&self.end_date)?;
        if end_date < start_date {
            return Err(validation_error("endDate must not be before startDate"));
        }

        Ok(TaskDraft {
            technician_id: self.technician_id.trim().to_string(),
            technician_name: self.technician_name.trim().to_string(),
            start_date,
            end_date,
            description: self.description.trim().to_string(),
            address: self.address.unwrap_or_default().trim().to_string(),
            links: self
                .links
                .unwrap_or_default()
                .into_iter()
                .map(|link| link.trim().to_string())
                .filter(|link| !link.is_empty())
                .collect(),
        })
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksQuery {
    /// Any day of the requested week, `YYYY-MM-DD`
    pub week_start: Option<String>,
    pub technician_id: Option<String>,
}

/// Reads `weekStart` as a date, or as a timestamp taken in `tz`.
pub fn parse_week_start(raw: Option<&str>, tz: Tz) -> Result<NaiveDate, PortalError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| validation_error("weekStart parameter is required"))?;
    parse_date(raw).or_else(|_| parse_timestamp(raw).map(|instant| local_date(&instant, tz)))
}

/// `[Monday 00:00, next Monday 00:00)` in `tz` for the week of `raw`.
pub fn week_window(
    raw: Option<&str>,
    tz: Tz,
) -> Result<(NaiveDate, DateTime<Utc>, DateTime<Utc>), PortalError> {
    let date = parse_week_start(raw, tz)?;
    let (from, to) = week_bounds(date, tz)?;
    Ok((date, from, to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(start: Value, end: Value) -> TaskRequest {
        TaskRequest {
            technician_id: "tech-1".into(),
            technician_name: "Luis".into(),
            start_date: start,
            end_date: end,
            description: "Replace router".into(),
            ..Default::default()
        }
    }

    #[test]
    fn mixed_date_encodings_normalize_to_the_same_instant() {
        let draft = request(
            json!({"_seconds": 1749538800, "_nanoseconds": 0}),
            json!("2025-06-10T09:00:00.000+02:00"),
        )
        .validate()
        .unwrap();
        assert_eq!(draft.start_date, draft.end_date);
        assert_eq!(draft.address, "");
        assert!(draft.links.is_empty());
    }

    #[test]
    fn missing_fields_and_reversed_dates_are_rejected() {
        let mut missing = request(json!("2025-06-10"), json!("2025-06-11"));
        missing.description = "  ".into();
        assert!(matches!(missing.validate(), Err(PortalError::ValidationError(_))));

        let no_end = request(json!("2025-06-10"), Value::Null);
        assert!(matches!(no_end.validate(), Err(PortalError::ValidationError(_))));

        let reversed = request(json!("2025-06-11"), json!("2025-06-10"));
        assert!(matches!(reversed.validate(), Err(PortalError::ValidationError(_))));

        let garbled = request(json!("next tuesday"), json!("2025-06-10"));
        assert!(matches!(garbled.validate(), Err(PortalError::ValidationError(_))));
    }

    #[test]
    fn week_start_accepts_dates_and_timestamps() {
        let tz = chrono_tz::Europe::Madrid;
        let (date, from, to) = week_window(Some("2025-06-12"), tz).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 6, 12).unwrap());
        assert_eq!(from.to_rfc3339(), "2025-06-08T22:00:00+00:00");
        assert_eq!(to - from, chrono::Duration::days(7));

        let date = parse_week_start(Some("2025-06-11T23:30:00Z"), tz).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 6, 12).unwrap());

        assert!(parse_week_start(None, tz).is_err());
        assert!(parse_week_start(Some("june"), tz).is_err());
    }

    #[test]
    fn far_out_week_start_is_a_validation_error() {
        let tz = chrono_tz::Europe::Madrid;
        for raw in ["+262142-12-31", "-262143-01-02", "+262142-12-31T10:00"] {
            let err = week_window(Some(raw), tz).unwrap_err();
            assert!(matches!(err, PortalError::ValidationError(_)), "{}", raw);
        }
    }
}
