// --- File: crates/portal_schedule/src/week.rs ---
//! Weekly calendar view.
//!
//! [`merge_week`] groups the tasks and calendar events of one Monday-aligned
//! week by local day and tags each entry with its technician assignment.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use portal_common::error::PortalError;
use portal_common::models::Task;
use portal_common::services::{CalendarEvent, EventTime};
use portal_common::time::{local_date, local_instant, shift_days, week_monday};
use serde::{Deserialize, Serialize};

pub const DAYS_PER_WEEK: i64 = 7;

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedTechnician {
    pub technician_id: String,
    pub technician_name: String,
}

/// Technician status of an entry in the weekly view.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Assignment {
    Assigned(AssignedTechnician),
    NeedsAssignment,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEntry {
    pub id: String,
    pub description: String,
    pub address: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub assignment: Assignment,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEntry {
    pub id: String,
    pub summary: String,
    pub client_name: Option<String>,
    pub start: EventTime,
    pub end: Option<EventTime>,
    pub assignment: Assignment,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WeekEntry {
    Task(TaskEntry),
    Event(EventEntry),
}

impl WeekEntry {
    pub fn id(&self) -> &str {
        match self {
            WeekEntry::Task(task) => &task.id,
            WeekEntry::Event(event) => &event.id,
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayEntries {
    pub date: NaiveDate,
    pub items: Vec<WeekEntry>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekView {
    pub week_start: NaiveDate,
    pub days: Vec<DayEntries>,
}

impl From<&Task> for TaskEntry {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            description: task.description.clone(),
            address: task.address.clone(),
            start: task.start_date,
            end: task.end_date,
            assignment: Assignment::Assigned(AssignedTechnician {
                technician_id: task.technician_id.clone(),
                technician_name: task.technician_name.clone(),
            }),
        }
    }
}

fn event_entry(event: &CalendarEvent, start: EventTime) -> EventEntry {
    let properties = event.booking_properties();
    let assignment = match properties.technician_id {
        Some(technician_id) => Assignment::Assigned(AssignedTechnician {
            technician_id,
            technician_name: properties.technician_name.unwrap_or_default(),
        }),
        None => Assignment::NeedsAssignment,
    };
    EventEntry {
        id: event.id.clone(),
        summary: event.summary.clone().unwrap_or_else(|| "Untitled".to_string()),
        client_name: properties.client_name,
        start,
        end: event.end,
        assignment,
    }
}

fn event_day(start: &EventTime, tz: Tz) -> NaiveDate {
    match start {
        EventTime::At(instant) => local_date(instant, tz),
        EventTime::AllDay(date) => *date,
    }
}

/// Buckets `tasks` and `events` into the seven local days of the week that
/// contains `week_start`.
///
/// A task lands on every day its closed interval `[start, end]` touches. An
/// event lands on the day its start falls on. Within a day, tasks come first,
/// then events, each in input order.
pub fn merge_week(
    tasks: &[Task],
    events: &[CalendarEvent],
    week_start: NaiveDate,
    tz: Tz,
) -> Result<WeekView, PortalError> {
    let monday = week_monday(week_start)?;
    let days = (0..DAYS_PER_WEEK)
        .map(|offset| {
            let date = shift_days(monday, offset)?;
            let day_start = local_instant(date, NaiveTime::MIN, tz);
            let day_end = local_instant(shift_days(date, 1)?, NaiveTime::MIN, tz);

            let task_entries = tasks
                .iter()
                .filter(|task| task.start_date < day_end && task.end_date >= day_start)
                .map(|task| WeekEntry::Task(TaskEntry::from(task)));
            let event_entries = events.iter().filter_map(|event| {
                let start = event.start?;
                (event_day(&start, tz) == date).then(|| WeekEntry::Event(event_entry(event, start)))
            });

            Ok(DayEntries {
                date,
                items: task_entries.chain(event_entries).collect(),
            })
        })
        .collect::<Result<Vec<_>, PortalError>>()?;

    Ok(WeekView {
        week_start: monday,
        days,
    })
}
