// --- File: crates/portal_gcal/src/service.rs ---
//! Google Calendar service implementation.
//!
//! This module provides an implementation of the CalendarService trait for Google Calendar.

use chrono::{DateTime, Utc};
use google_calendar3::api::{Event, EventDateTime, EventExtendedProperties};
use portal_common::error::{not_found, upstream_failure, PortalError};
use portal_common::services::{
    BoxFuture, CalendarEvent, CalendarService, EventTime, NewCalendarEvent,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::HubType;

/// Errors that can occur when interacting with Google Calendar.
#[derive(Error, Debug)]
pub enum GcalServiceError {
    #[error("Google API Error: {0}")]
    ApiError(#[from] google_calendar3::Error),
    #[error("Event not found: {0}")]
    NotFound(String),
    #[error("Calendar configuration error: {0}")]
    Config(String),
}

impl From<GcalServiceError> for PortalError {
    fn from(err: GcalServiceError) -> Self {
        match err {
            GcalServiceError::NotFound(id) => not_found(format!("Event {} not found", id)),
            GcalServiceError::Config(message) => PortalError::ConfigError(message),
            GcalServiceError::ApiError(api) => upstream_failure("calendar", api),
        }
    }
}

/// Whether the API answered 404 for the addressed resource.
fn is_not_found(err: &google_calendar3::Error) -> bool {
    match err {
        google_calendar3::Error::BadRequest(body) => {
            body.pointer("/error/code").and_then(|c| c.as_u64()) == Some(404)
        }
        google_calendar3::Error::Failure(response) => response.status().as_u16() == 404,
        _ => false,
    }
}

/// Google Calendar service implementation.
pub struct GoogleCalendarService {
    calendar_hub: Arc<HubType>,
}

impl GoogleCalendarService {
    /// Create a new Google Calendar service.
    pub fn new(calendar_hub: Arc<HubType>) -> Self {
        Self { calendar_hub }
    }
}

impl CalendarService for GoogleCalendarService {
    type Error = GcalServiceError;

    /// Lists the events overlapping `[start, end)`.
    ///
    /// Recurring events are expanded into single instances (`singleEvents=true`)
    /// so they can be ordered by start time.
    fn list_events(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<CalendarEvent>, Self::Error> {
        let calendar_id = calendar_id.to_string();
        let calendar_hub = self.calendar_hub.clone();

        Box::pin(async move {
            let (_response, events) = calendar_hub
                .events()
                .list(&calendar_id)
                .time_min(start)
                .time_max(end)
                .single_events(true)
                .order_by("startTime")
                .doit()
                .await?;

            let items: Vec<CalendarEvent> = events
                .items
                .unwrap_or_default()
                .into_iter()
                .filter_map(to_calendar_event)
                .collect();
            debug!("Fetched {} events from {} to {}", items.len(), start, end);
            Ok(items)
        })
    }

    fn create_event(
        &self,
        calendar_id: &str,
        event: NewCalendarEvent,
    ) -> BoxFuture<'_, CalendarEvent, Self::Error> {
        let calendar_id = calendar_id.to_string();
        let calendar_hub = self.calendar_hub.clone();

        Box::pin(async move {
            let new_event = Event {
                summary: Some(event.summary),
                description: Some(event.description),
                start: Some(event_date_time(event.start, &event.time_zone)),
                end: Some(event_date_time(event.end, &event.time_zone)),
                extended_properties: Some(EventExtendedProperties {
                    private: Some(event.private_properties),
                    ..Default::default()
                }),
                ..Default::default()
            };

            let (_response, created) = calendar_hub
                .events()
                .insert(new_event, &calendar_id)
                .doit()
                .await?;

            to_calendar_event(created)
                .ok_or_else(|| GcalServiceError::NotFound("created event has no id".to_string()))
        })
    }

    /// Reads the event, merges `properties` into its private bag and patches it back.
    fn update_private_properties(
        &self,
        calendar_id: &str,
        event_id: &str,
        properties: HashMap<String, String>,
    ) -> BoxFuture<'_, CalendarEvent, Self::Error> {
        let calendar_id = calendar_id.to_string();
        let event_id = event_id.to_string();
        let calendar_hub = self.calendar_hub.clone();

        Box::pin(async move {
            let current = match calendar_hub.events().get(&calendar_id, &event_id).doit().await {
                Ok((_response, event)) => event,
                Err(err) if is_not_found(&err) => {
                    return Err(GcalServiceError::NotFound(event_id));
                }
                Err(err) => return Err(err.into()),
            };

            let mut private = current
                .extended_properties
                .and_then(|props| props.private)
                .unwrap_or_default();
            private.extend(properties);

            let patch = Event {
                extended_properties: Some(EventExtendedProperties {
                    private: Some(private),
                    ..Default::default()
                }),
                ..Default::default()
            };

            let (_response, updated) = calendar_hub
                .events()
                .patch(patch, &calendar_id, &event_id)
                .doit()
                .await
                .map_err(|err| {
                    if is_not_found(&err) {
                        GcalServiceError::NotFound(event_id.clone())
                    } else {
                        err.into()
                    }
                })?;

            to_calendar_event(updated).ok_or(GcalServiceError::NotFound(event_id))
        })
    }
}

fn event_date_time(instant: DateTime<Utc>, time_zone: &str) -> EventDateTime {
    EventDateTime {
        date_time: Some(instant),
        time_zone: Some(time_zone.to_string()),
        ..Default::default()
    }
}

fn event_time(value: Option<EventDateTime>) -> Option<EventTime> {
    let value = value?;
    match (value.date_time, value.date) {
        (Some(dt), _) => Some(EventTime::At(dt)),
        (None, Some(date)) => Some(EventTime::AllDay(date)),
        (None, None) => None,
    }
}

/// Converts an API event. Events without an id are dropped.
fn to_calendar_event(event: Event) -> Option<CalendarEvent> {
    let Some(id) = event.id else {
        warn!("Skipping calendar event without id: {:?}", event.summary);
        return None;
    };
    Some(CalendarEvent {
        id,
        summary: event.summary,
        description: event.description,
        start: event_time(event.start),
        end: event_time(event.end),
        status: event.status,
        html_link: event.html_link,
        created: event.created,
        private_properties: event
            .extended_properties
            .and_then(|props| props.private)
            .unwrap_or_default(),
    })
}
