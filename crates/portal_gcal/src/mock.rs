// --- File: crates/portal_gcal/src/mock.rs ---
//! In-process calendar used by the handler tests and by local runs without a
//! service-account key. Every call is recorded so tests can assert which
//! provider operations a request reached.

use chrono::{DateTime, Utc};
use portal_common::error::{not_found, upstream_failure, PortalError};
use portal_common::services::{BoxFuture, CalendarEvent, CalendarService, EventTime, NewCalendarEvent};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// A provider operation as seen by [`InMemoryCalendarService`].
#[derive(Debug, Clone, PartialEq)]
pub enum CalendarCall {
    List {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    Create(NewCalendarEvent),
    UpdateProperties {
        event_id: String,
        properties: HashMap<String, String>,
    },
}

#[derive(Debug, Default)]
struct Inner {
    events: Vec<CalendarEvent>,
    calls: Vec<CalendarCall>,
    failure: Option<String>,
    next_id: u64,
}

#[derive(Debug, Default)]
pub struct InMemoryCalendarService {
    inner: Mutex<Inner>,
    write_delay: Option<Duration>,
}

impl InMemoryCalendarService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long before each event is created, widening the
    /// check-then-write window for concurrency tests.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed an existing event.
    pub fn insert(&self, event: CalendarEvent) {
        self.lock().events.push(event);
    }

    pub fn events(&self) -> Vec<CalendarEvent> {
        self.lock().events.clone()
    }

    pub fn calls(&self) -> Vec<CalendarCall> {
        self.lock().calls.clone()
    }

    /// Make every subsequent call fail with an upstream error (`None` restores it).
    pub fn fail_with(&self, message: Option<&str>) {
        self.lock().failure = message.map(str::to_string);
    }

    fn record(&self, call: CalendarCall) -> Result<(), PortalError> {
        let mut inner = self.lock();
        inner.calls.push(call);
        match &inner.failure {
            Some(message) => Err(upstream_failure("calendar", message)),
            None => Ok(()),
        }
    }
}

fn bounds(event: &CalendarEvent) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = event.start.as_ref()?.sort_key();
    let end = event.end.as_ref().map(EventTime::sort_key).unwrap_or(start);
    Some((start, end))
}

impl CalendarService for InMemoryCalendarService {
    type Error = PortalError;

    fn list_events(
        &self,
        _calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<CalendarEvent>, Self::Error> {
        Box::pin(async move {
            self.record(CalendarCall::List { start, end })?;
            let mut events: Vec<CalendarEvent> = self
                .lock()
                .events
                .iter()
                .filter(|e| matches!(bounds(e), Some((s, e_end)) if s < end && e_end > start))
                .cloned()
                .collect();
            events.sort_by_key(|e| e.start.as_ref().map(EventTime::sort_key));
            Ok(events)
        })
    }

    fn create_event(
        &self,
        _calendar_id: &str,
        event: NewCalendarEvent,
    ) -> BoxFuture<'_, CalendarEvent, Self::Error> {
        Box::pin(async move {
            self.record(CalendarCall::Create(event.clone()))?;
            if let Some(delay) = self.write_delay {
                tokio::time::sleep(delay).await;
            }
            let mut inner = self.lock();
            inner.next_id += 1;
            let id = format!("evt-{}", inner.next_id);
            let created = CalendarEvent {
                html_link: Some(format!("https://calendar.example/event?eid={}", id)),
                id,
                summary: Some(event.summary),
                description: Some(event.description),
                start: Some(EventTime::At(event.start)),
                end: Some(EventTime::At(event.end)),
                status: Some("confirmed".to_string()),
                created: Some(Utc::now()),
                private_properties: event.private_properties,
            };
            inner.events.push(created.clone());
            Ok(created)
        })
    }

    fn update_private_properties(
        &self,
        _calendar_id: &str,
        event_id: &str,
        properties: HashMap<String, String>,
    ) -> BoxFuture<'_, CalendarEvent, Self::Error> {
        let event_id = event_id.to_string();
        Box::pin(async move {
            self.record(CalendarCall::UpdateProperties {
                event_id: event_id.clone(),
                properties: properties.clone(),
            })?;
            let mut inner = self.lock();
            let event = inner
                .events
                .iter_mut()
                .find(|e| e.id == event_id)
                .ok_or_else(|| not_found(format!("Event {} not found", event_id)))?;
            event.private_properties.extend(properties);
            Ok(event.clone())
        })
    }
}
