// --- File: crates/portal_gcal/src/booking.rs ---
//! Public reservations.
//!
//! A reservation re-validates the requested slot against the calendar, writes
//! the calendar event and then the booking record. The calendar is the source
//! of truth: a booking record that fails to be written can be recreated from
//! the event by [`reconcile_bookings`].
//!
//! Concurrent submissions for the same slot are serialized by
//! [`ReservationGuard`], which also remembers the outcome of each
//! `Idempotency-Key` so a retried request does not book twice. A key reused
//! for a different reservation is a conflict. The guard is
//! process-local; a deployment with several backend instances needs a shared
//! lock instead.

use chrono::{DateTime, Duration, Utc};
use portal_common::error::{conflict, validation_error, PortalError};
use portal_common::models::{BookingStatus, NewBooking};
use portal_common::services::{
    BookingProperties, CalendarEvent, DynCalendarService, NewCalendarEvent, BOOKING_TYPE_PUBLIC,
};
use portal_common::time::{local_date, parse_timestamp};
use portal_db::BookingRepository;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OwnedMutexGuard;
use tracing::{error, info};

use crate::logic::{compute_slots, BookingSettings, EVENT_WINDOW_DAYS};

/// Header carrying the client's idempotency key.
pub const IDEMPOTENCY_HEADER: &str = "idempotency-key";

const DESCRIPTION_LABEL: &str = "Problem description: ";
const NO_DESCRIPTION: &str = "Not specified";
const MAX_REMEMBERED_KEYS: usize = 1024;

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReserveRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub description: String,
    pub start_date_time: String,
    pub end_date_time: String,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    pub success: bool,
    pub booking_id: String,
    pub event_id: String,
    pub message: String,
}

/// A reservation request whose fields passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidReservation {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReserveRequest {
    pub fn validate(self) -> Result<ValidReservation, PortalError> {
        let name = self.name.trim();
        let email = self.email.trim();
        let phone = self.phone.trim();
        if name.is_empty()
            || email.is_empty()
            || phone.is_empty()
            || self.start_date_time.trim().is_empty()
            || self.end_date_time.trim().is_empty()
        {
            return Err(validation_error(
                "name, email, phone, startDateTime and endDateTime are required",
            ));
        }
        let start = parse_timestamp(&self.start_date_time)?;
        let end = parse_timestamp(&self.end_date_time)?;
        if start >= end {
            return Err(validation_error("startDateTime must be before endDateTime"));
        }
        Ok(ValidReservation {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            description: self.description.trim().to_string(),
            start,
            end,
        })
    }
}

impl ValidReservation {
    fn calendar_event(&self, settings: &BookingSettings) -> NewCalendarEvent {
        let description = if self.description.is_empty() {
            NO_DESCRIPTION
        } else {
            &self.description
        };
        let properties = BookingProperties {
            client_name: Some(self.name.clone()),
            client_email: Some(self.email.clone()),
            client_phone: Some(self.phone.clone()),
            booking_type: Some(BOOKING_TYPE_PUBLIC.to_string()),
            ..Default::default()
        };
        NewCalendarEvent {
            summary: format!("Appointment - {}", self.name),
            description: format!(
                "Client: {}\nEmail: {}\nPhone: {}\n{}{}",
                self.name, self.email, self.phone, DESCRIPTION_LABEL, description
            ),
            start: self.start,
            end: self.end,
            time_zone: settings.time_zone.name().to_string(),
            private_properties: properties.into_map(),
        }
    }
}

type SlotKey = (DateTime<Utc>, DateTime<Utc>);

#[derive(Debug, Default)]
struct Remembered {
    results: HashMap<String, (ValidReservation, ReservationResponse)>,
    order: VecDeque<String>,
}

/// Per-slot locks and idempotency results for [`reserve`].
#[derive(Debug, Default)]
pub struct ReservationGuard {
    slots: Mutex<HashMap<SlotKey, Arc<tokio::sync::Mutex<()>>>>,
    remembered: Mutex<Remembered>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ReservationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other reservation holds `[start, end)`.
    pub async fn lock_slot(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> OwnedMutexGuard<()> {
        let slot_lock = {
            let mut slots = lock(&self.slots);
            // unused entries are only referenced by the map
            slots.retain(|_, m| Arc::strong_count(m) > 1);
            slots.entry((start, end)).or_default().clone()
        };
        slot_lock.lock_owned().await
    }

    /// The response first given for `key`, if `reservation` matches the
    /// request it was given for.
    pub fn remembered(
        &self,
        key: &str,
        reservation: &ValidReservation,
    ) -> Result<Option<ReservationResponse>, PortalError> {
        match lock(&self.remembered).results.get(key) {
            None => Ok(None),
            Some((original, response)) if original == reservation => Ok(Some(response.clone())),
            Some(_) => Err(conflict(
                "Idempotency-Key was already used for a different reservation",
            )),
        }
    }

    pub fn remember(
        &self,
        key: String,
        reservation: ValidReservation,
        response: ReservationResponse,
    ) {
        let mut remembered = lock(&self.remembered);
        if remembered
            .results
            .insert(key.clone(), (reservation, response))
            .is_none()
        {
            remembered.order.push_back(key);
        }
        while remembered.order.len() > MAX_REMEMBERED_KEYS {
            if let Some(oldest) = remembered.order.pop_front() {
                remembered.results.remove(&oldest);
            }
        }
    }
}

/// Books `request` into the calendar and mirrors it as a booking record.
///
/// Validation happens before any provider call. Fails with `Conflict` when
/// the requested interval is not exactly one free slot of its day.
pub async fn reserve(
    calendar: &DynCalendarService,
    bookings: &dyn BookingRepository,
    guard: &ReservationGuard,
    settings: &BookingSettings,
    request: ReserveRequest,
    idempotency_key: Option<String>,
) -> Result<ReservationResponse, PortalError> {
    let reservation = request.validate()?;
    let idempotency_key = idempotency_key.filter(|k| !k.trim().is_empty());

    let replay = |key: Option<&str>| match key {
        Some(key) => guard.remembered(key, &reservation),
        None => Ok(None),
    };

    if let Some(previous) = replay(idempotency_key.as_deref())? {
        info!("Replaying reservation for idempotency key {:?}", idempotency_key);
        return Ok(previous);
    }

    let _slot = guard.lock_slot(reservation.start, reservation.end).await;

    // a request with the same key may have finished while we waited
    if let Some(previous) = replay(idempotency_key.as_deref())? {
        return Ok(previous);
    }

    let day = local_date(&reservation.start, settings.time_zone);
    let slots = compute_slots(calendar, settings, day).await?;
    let requested = slots
        .iter()
        .find(|slot| slot.start == reservation.start && slot.end == reservation.end);
    if !requested.is_some_and(|slot| slot.available) {
        info!(
            "Rejected reservation {} - {}: slot unavailable",
            reservation.start, reservation.end
        );
        return Err(conflict("The selected time slot is no longer available"));
    }

    let event = calendar
        .create_event(&settings.calendar_id, reservation.calendar_event(settings))
        .await?;
    info!("Created calendar event {} for {}", event.id, reservation.start);

    let booking = bookings
        .create(NewBooking {
            google_event_id: event.id.clone(),
            client_name: reservation.name.clone(),
            client_email: reservation.email.clone(),
            client_phone: reservation.phone.clone(),
            description: reservation.description.clone(),
            start_date_time: reservation.start,
            end_date_time: reservation.end,
            status: BookingStatus::Confirmed,
        })
        .await
        .map_err(|e| {
            error!(
                "Calendar event {} has no booking record, run reconciliation: {}",
                event.id, e
            );
            PortalError::from(e)
        })?;

    let response = ReservationResponse {
        success: true,
        booking_id: booking.id,
        event_id: event.id,
        message: "Booking confirmed. You will receive a confirmation email.".to_string(),
    };
    if let Some(key) = idempotency_key {
        guard.remember(key, reservation, response.clone());
    }
    Ok(response)
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Public booking events inspected.
    pub scanned: usize,
    /// Booking records recreated from their events.
    pub created: usize,
}

/// Recreates the booking record of every public booking event that lacks one.
pub async fn reconcile_bookings(
    calendar: &DynCalendarService,
    bookings: &dyn BookingRepository,
    settings: &BookingSettings,
    now: DateTime<Utc>,
) -> Result<ReconcileReport, PortalError> {
    let span = Duration::days(EVENT_WINDOW_DAYS);
    let events = calendar
        .list_events(&settings.calendar_id, now - span, now + span)
        .await?;

    let mut report = ReconcileReport {
        scanned: 0,
        created: 0,
    };
    for event in events {
        let props = event.booking_properties();
        let Some((start, end)) = event.timed_interval() else {
            continue;
        };
        if !props.is_public_booking() {
            continue;
        }
        report.scanned += 1;
        if bookings.find_by_event_id(&event.id).await?.is_some() {
            continue;
        }
        bookings
            .create(NewBooking {
                google_event_id: event.id.clone(),
                client_name: props.client_name.unwrap_or_default(),
                client_email: props.client_email.unwrap_or_default(),
                client_phone: props.client_phone.unwrap_or_default(),
                description: client_description(&event),
                start_date_time: start,
                end_date_time: end,
                status: BookingStatus::Confirmed,
            })
            .await?;
        info!("Recreated booking record for event {}", event.id);
        report.created += 1;
    }
    info!(
        "Reconciliation scanned {} booking events, created {} records",
        report.scanned, report.created
    );
    Ok(report)
}

/// The client's free text, read back from the event description.
fn client_description(event: &CalendarEvent) -> String {
    event
        .description
        .as_deref()
        .unwrap_or_default()
        .lines()
        .find_map(|line| line.strip_prefix(DESCRIPTION_LABEL))
        .filter(|text| *text != NO_DESCRIPTION)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(start: &str, end: &str) -> ReserveRequest {
        ReserveRequest {
            name: "Ana Ruiz".into(),
            email: "ana@example.com".into(),
            phone: "600 000 000".into(),
            description: "Alarm keeps beeping".into(),
            start_date_time: start.into(),
            end_date_time: end.into(),
        }
    }

    #[test]
    fn validation_rejects_missing_fields_and_reversed_intervals() {
        let mut missing = request("2025-06-10T07:00:00Z", "2025-06-10T08:00:00Z");
        missing.phone = "  ".into();
        assert!(matches!(missing.validate(), Err(PortalError::ValidationError(_))));

        let reversed = request("2025-06-10T08:00:00Z", "2025-06-10T07:00:00Z");
        assert!(matches!(reversed.validate(), Err(PortalError::ValidationError(_))));

        let empty = request("2025-06-10T07:00:00Z", "2025-06-10T07:00:00Z");
        assert!(matches!(empty.validate(), Err(PortalError::ValidationError(_))));

        let garbage = request("tomorrow", "2025-06-10T07:00:00Z");
        assert!(matches!(garbage.validate(), Err(PortalError::ValidationError(_))));

        let ok = request("2025-06-10T09:00:00+02:00", "2025-06-10T10:00:00+02:00")
            .validate()
            .unwrap();
        assert_eq!(ok.start.to_rfc3339(), "2025-06-10T07:00:00+00:00");
    }

    #[test]
    fn event_description_round_trips_the_client_text() {
        let settings = crate::logic::BookingSettings::from_config(&Default::default()).unwrap();
        let reservation = request("2025-06-10T07:00:00Z", "2025-06-10T08:00:00Z")
            .validate()
            .unwrap();
        let new_event = reservation.calendar_event(&settings);
        assert_eq!(new_event.summary, "Appointment - Ana Ruiz");
        assert_eq!(new_event.time_zone, "Europe/Madrid");
        assert_eq!(new_event.private_properties["bookingType"], "public");

        let event = CalendarEvent {
            id: "evt".into(),
            description: Some(new_event.description),
            ..Default::default()
        };
        assert_eq!(client_description(&event), "Alarm keeps beeping");

        let mut blank = reservation.clone();
        blank.description.clear();
        let event = CalendarEvent {
            id: "evt".into(),
            description: Some(blank.calendar_event(&settings).description),
            ..Default::default()
        };
        assert_eq!(client_description(&event), "");
    }

    fn response(id: usize) -> ReservationResponse {
        ReservationResponse {
            success: true,
            booking_id: id.to_string(),
            event_id: id.to_string(),
            message: String::new(),
        }
    }

    #[test]
    fn remembered_results_are_bounded() {
        let guard = ReservationGuard::new();
        let reservation = request("2025-06-10T07:00:00Z", "2025-06-10T08:00:00Z")
            .validate()
            .unwrap();
        for i in 0..(MAX_REMEMBERED_KEYS + 5) {
            guard.remember(format!("key-{}", i), reservation.clone(), response(i));
        }
        assert!(guard.remembered("key-0", &reservation).unwrap().is_none());
        let last = format!("key-{}", MAX_REMEMBERED_KEYS + 4);
        assert!(guard.remembered(&last, &reservation).unwrap().is_some());
    }

    #[test]
    fn key_reused_for_another_reservation_conflicts() {
        let guard = ReservationGuard::new();
        let first = request("2025-06-10T07:00:00Z", "2025-06-10T08:00:00Z")
            .validate()
            .unwrap();
        guard.remember("key".into(), first.clone(), response(1));

        assert_eq!(guard.remembered("key", &first).unwrap(), Some(response(1)));

        let other_slot = request("2025-06-10T08:00:00Z", "2025-06-10T09:00:00Z")
            .validate()
            .unwrap();
        assert!(matches!(
            guard.remembered("key", &other_slot),
            Err(PortalError::Conflict(_))
        ));

        let mut other_client = first.clone();
        other_client.email = "luis@example.com".into();
        assert!(matches!(
            guard.remembered("key", &other_client),
            Err(PortalError::Conflict(_))
        ));
    }
}
