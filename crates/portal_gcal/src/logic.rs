// --- File: crates/portal_gcal/src/logic.rs ---
//! Slot calculation, event listing and technician assignment.
//!
//! [`build_slots`] is the pure part of the slot calculator; [`compute_slots`]
//! feeds it the events fetched from the calendar provider.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use portal_common::error::{config_error, validation_error, PortalError};
use portal_common::services::{
    BookingProperties, CalendarEvent, DynCalendarService, EventTime,
};
use portal_common::time::{local_instant, parse_time_zone, shift_days};
use portal_config::GcalConfig;
use portal_db::BookingRepository;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Window scanned by the event listing and by reconciliation.
pub const EVENT_WINDOW_DAYS: i64 = 365;

// --- Settings ---

/// Bookable hours of a day, local time, `start` inclusive and `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingHours {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start_hour: 9,
            end_hour: 18,
        }
    }
}

/// Everything the slot calculator and the booking writer read from configuration.
#[derive(Debug, Clone)]
pub struct BookingSettings {
    pub calendar_id: String,
    pub time_zone: Tz,
    pub working_hours: WorkingHours,
    pub slot_duration: Duration,
}

impl BookingSettings {
    pub fn from_config(config: &GcalConfig) -> Result<Self, PortalError> {
        let working_hours = WorkingHours {
            start_hour: config.work_start_hour,
            end_hour: config.work_end_hour,
        };
        if working_hours.start_hour >= working_hours.end_hour || working_hours.end_hour > 24 {
            return Err(config_error(format!(
                "Invalid working hours {}-{}",
                working_hours.start_hour, working_hours.end_hour
            )));
        }
        if config.slot_duration_minutes <= 0 {
            return Err(config_error("slot_duration_minutes must be positive"));
        }
        Ok(Self {
            calendar_id: config.calendar_id_or_default(),
            time_zone: parse_time_zone(&config.time_zone)?,
            working_hours,
            slot_duration: Duration::minutes(config.slot_duration_minutes),
        })
    }

    /// `[dayStart, dayEnd)` of `date` in the configured zone.
    pub fn day_window(
        &self,
        date: NaiveDate,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), PortalError> {
        Ok((
            self.local_hour(date, self.working_hours.start_hour)?,
            self.local_hour(date, self.working_hours.end_hour)?,
        ))
    }

    fn local_hour(&self, date: NaiveDate, hour: u32) -> Result<DateTime<Utc>, PortalError> {
        Ok(match NaiveTime::from_hms_opt(hour, 0, 0) {
            Some(time) => local_instant(date, time, self.time_zone),
            // hour 24 is midnight of the next day
            None => local_instant(shift_days(date, 1)?, NaiveTime::MIN, self.time_zone),
        })
    }
}

// --- Slot calculator ---

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub available: bool,
}

#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    /// Day to inspect, `YYYY-MM-DD`.
    pub date: Option<String>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub date: String,
    pub slots: Vec<TimeSlot>,
}

/// Partitions `[day_start, day_end)` into `duration`-long slots.
///
/// The last slot starts before `day_end` and may extend past it. A slot is
/// unavailable iff it overlaps a timed event, see [`occupies`]. All-day
/// events are ignored.
pub fn build_slots(
    day_start: DateTime<Utc>,
    day_end: DateTime<Utc>,
    duration: Duration,
    events: &[CalendarEvent],
) -> Vec<TimeSlot> {
    if duration <= Duration::zero() {
        return Vec::new();
    }
    let busy: Vec<(DateTime<Utc>, DateTime<Utc>)> =
        events.iter().filter_map(CalendarEvent::timed_interval).collect();

    let mut slots = Vec::new();
    let mut current = day_start;
    while current < day_end {
        let end = current + duration;
        let occupied = busy
            .iter()
            .any(|&(event_start, event_end)| occupies((event_start, event_end), (current, end)));
        slots.push(TimeSlot {
            start: current,
            end,
            available: !occupied,
        });
        current = end;
    }
    slots
}

/// Whether an event blocks a slot.
///
/// True when the slot starts inside the event, ends inside it, or contains
/// it. Touching boundaries do not block, except that a zero-length event
/// blocks both slots meeting at its instant.
pub fn occupies(
    (event_start, event_end): (DateTime<Utc>, DateTime<Utc>),
    (slot_start, slot_end): (DateTime<Utc>, DateTime<Utc>),
) -> bool {
    (slot_start >= event_start && slot_start < event_end)
        || (slot_end > event_start && slot_end <= event_end)
        || (slot_start <= event_start && slot_end >= event_end)
}

/// Slots of `date` against the events currently in the calendar.
pub async fn compute_slots(
    calendar: &DynCalendarService,
    settings: &BookingSettings,
    date: NaiveDate,
) -> Result<Vec<TimeSlot>, PortalError> {
    let (day_start, day_end) = settings.day_window(date)?;
    let events = calendar
        .list_events(&settings.calendar_id, day_start, day_end)
        .await?;
    Ok(build_slots(day_start, day_end, settings.slot_duration, &events))
}

// --- Event listing ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFilter {
    #[default]
    Upcoming,
    Past,
    All,
}

impl EventFilter {
    /// Unknown values list everything.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some("upcoming") => EventFilter::Upcoming,
            Some("past") => EventFilter::Past,
            Some(_) => EventFilter::All,
        }
    }

    pub fn window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let span = Duration::days(EVENT_WINDOW_DAYS);
        match self {
            EventFilter::Upcoming => (now, now + span),
            EventFilter::Past => (now - span, now),
            EventFilter::All => (now - span, now + span),
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// `upcoming` (default), `past` or `all`.
    pub filter: Option<String>,
}

/// A calendar event as shown in the bookings panel.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingEvent {
    pub id: String,
    pub google_event_id: String,
    pub summary: String,
    pub description: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub start_date_time: Option<EventTime>,
    pub end_date_time: Option<EventTime>,
    pub status: String,
    pub html_link: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub technician_id: Option<String>,
    pub technician_name: Option<String>,
}

impl From<CalendarEvent> for BookingEvent {
    fn from(event: CalendarEvent) -> Self {
        let props = event.booking_properties();
        Self {
            google_event_id: event.id.clone(),
            id: event.id,
            summary: event.summary.unwrap_or_else(|| "Untitled".to_string()),
            description: event.description.unwrap_or_default(),
            client_name: props.client_name.unwrap_or_else(|| "Unnamed".to_string()),
            client_email: props.client_email.unwrap_or_default(),
            client_phone: props.client_phone.unwrap_or_default(),
            start_date_time: event.start,
            end_date_time: event.end,
            status: event.status.unwrap_or_else(|| "confirmed".to_string()),
            html_link: event.html_link,
            created_at: event.created,
            technician_id: props.technician_id,
            technician_name: props.technician_name,
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize)]
pub struct EventsResponse {
    pub events: Vec<BookingEvent>,
}

/// Applies `filter` to events fetched for its window.
///
/// Upcoming keeps events starting at or after `now`, ascending; past keeps
/// events starting before `now`, descending; all is descending.
pub fn select_events(
    events: Vec<CalendarEvent>,
    filter: EventFilter,
    now: DateTime<Utc>,
) -> Vec<BookingEvent> {
    let start_of = |e: &CalendarEvent| e.start.as_ref().map(EventTime::sort_key);
    let mut selected: Vec<CalendarEvent> = match filter {
        EventFilter::Upcoming => events
            .into_iter()
            .filter(|e| matches!(start_of(e), Some(s) if s >= now))
            .collect(),
        EventFilter::Past => events
            .into_iter()
            .filter(|e| matches!(start_of(e), Some(s) if s < now))
            .collect(),
        EventFilter::All => events,
    };
    match filter {
        EventFilter::Upcoming => selected.sort_by_key(start_of),
        // `Reverse` keeps undated events last
        EventFilter::Past | EventFilter::All => {
            selected.sort_by_key(|e| std::cmp::Reverse(start_of(e)))
        }
    }
    selected.into_iter().map(BookingEvent::from).collect()
}

pub async fn list_events(
    calendar: &DynCalendarService,
    settings: &BookingSettings,
    filter: EventFilter,
    now: DateTime<Utc>,
) -> Result<Vec<BookingEvent>, PortalError> {
    let (from, to) = filter.window(now);
    let events = calendar.list_events(&settings.calendar_id, from, to).await?;
    Ok(select_events(events, filter, now))
}

// --- Technician assignment ---

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssignTechnicianRequest {
    pub technician_id: String,
    pub technician_name: String,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize)]
pub struct AssignmentResponse {
    pub success: bool,
    pub event: BookingEvent,
}

/// Records the technician on the calendar event and, best-effort, on the
/// booking that mirrors it.
pub async fn assign_technician(
    calendar: &DynCalendarService,
    bookings: &dyn BookingRepository,
    settings: &BookingSettings,
    event_id: &str,
    request: AssignTechnicianRequest,
    now: DateTime<Utc>,
) -> Result<BookingEvent, PortalError> {
    let technician_id = request.technician_id.trim();
    let technician_name = request.technician_name.trim();
    if technician_id.is_empty() || technician_name.is_empty() {
        return Err(validation_error("technicianId and technicianName are required"));
    }

    let properties = BookingProperties {
        technician_id: Some(technician_id.to_string()),
        technician_name: Some(technician_name.to_string()),
        assigned_at: Some(portal_common::time::to_storage(&now)),
        ..Default::default()
    };
    let event = calendar
        .update_private_properties(&settings.calendar_id, event_id, properties.into_map())
        .await?;
    info!("Assigned technician {} to event {}", technician_id, event_id);

    match bookings
        .record_assignment(event_id, technician_id, technician_name, now)
        .await
    {
        Ok(true) => {}
        Ok(false) => info!("No booking record mirrors event {}", event_id),
        Err(e) => warn!("Could not mirror assignment of event {}: {}", event_id, e),
    }

    Ok(event.into())
}
