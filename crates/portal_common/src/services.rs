// --- File: crates/portal_common/src/services.rs ---
//! Service abstractions for the external platforms.
//!
//! The calendar provider and the identity platform sit behind these traits so
//! handlers can be exercised against in-memory fakes.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::error::PortalError;
use crate::models::{Role, UserRecord};

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A calendar service with its errors already mapped into the portal taxonomy.
pub type DynCalendarService = dyn CalendarService<Error = PortalError>;

/// Operations the portal performs against the calendar provider.
pub trait CalendarService: Send + Sync {
    /// Error type returned by calendar service operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Events overlapping `[start, end)`, recurring events expanded, ordered by start.
    fn list_events(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<CalendarEvent>, Self::Error>;

    /// Create an event and return it as stored by the provider.
    fn create_event(
        &self,
        calendar_id: &str,
        event: NewCalendarEvent,
    ) -> BoxFuture<'_, CalendarEvent, Self::Error>;

    /// Merge `properties` into the event's private extended properties.
    fn update_private_properties(
        &self,
        calendar_id: &str,
        event_id: &str,
        properties: HashMap<String, String>,
    ) -> BoxFuture<'_, CalendarEvent, Self::Error>;
}

/// Adapts any calendar implementation whose errors convert into [`PortalError`]
/// into a [`DynCalendarService`].
pub struct PortalCalendar<S>(pub S);

impl<S> CalendarService for PortalCalendar<S>
where
    S: CalendarService,
    S::Error: Into<PortalError>,
{
    type Error = PortalError;

    fn list_events(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<CalendarEvent>, Self::Error> {
        let fut = self.0.list_events(calendar_id, start, end);
        Box::pin(async move { fut.await.map_err(Into::into) })
    }

    fn create_event(
        &self,
        calendar_id: &str,
        event: NewCalendarEvent,
    ) -> BoxFuture<'_, CalendarEvent, Self::Error> {
        let fut = self.0.create_event(calendar_id, event);
        Box::pin(async move { fut.await.map_err(Into::into) })
    }

    fn update_private_properties(
        &self,
        calendar_id: &str,
        event_id: &str,
        properties: HashMap<String, String>,
    ) -> BoxFuture<'_, CalendarEvent, Self::Error> {
        let fut = self.0.update_private_properties(calendar_id, event_id, properties);
        Box::pin(async move { fut.await.map_err(Into::into) })
    }
}

/// Verifies identity tokens and resolves the caller.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> BoxFuture<'_, AuthUser, PortalError>;
}

/// Account administration on the identity platform.
pub trait IdentityAdmin: Send + Sync {
    fn list_users(&self, max_results: usize) -> BoxFuture<'_, Vec<UserRecord>, PortalError>;

    /// Store `role` as the account's custom claim.
    fn set_role(&self, uid: &str, role: Role) -> BoxFuture<'_, (), PortalError>;

    /// Force existing sessions to pick up new claims on their next refresh.
    fn revoke_refresh_tokens(&self, uid: &str) -> BoxFuture<'_, (), PortalError>;
}

/// A factory for the external service instances the backend wires into its routers.
pub trait ServiceFactory: Send + Sync {
    fn calendar_service(&self) -> Arc<DynCalendarService>;

    fn token_verifier(&self) -> Arc<dyn TokenVerifier>;

    fn identity_admin(&self) -> Arc<dyn IdentityAdmin>;
}

/// Start or end of a calendar event.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTime {
    /// A timed event boundary.
    At(DateTime<Utc>),
    /// An all-day event boundary.
    AllDay(NaiveDate),
}

impl EventTime {
    /// The instant of a timed boundary; all-day boundaries have none.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            EventTime::At(dt) => Some(*dt),
            EventTime::AllDay(_) => None,
        }
    }

    /// Ordering key. All-day boundaries sort at midnight UTC.
    pub fn sort_key(&self) -> DateTime<Utc> {
        match self {
            EventTime::At(dt) => *dt,
            EventTime::AllDay(date) => date.and_time(NaiveTime::MIN).and_utc(),
        }
    }
}

/// An event as read back from the calendar provider.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub status: Option<String>,
    pub html_link: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub private_properties: HashMap<String, String>,
}

impl CalendarEvent {
    /// `[start, end)` for timed events. All-day or incomplete events yield `None`.
    pub fn timed_interval(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.start.as_ref()?.instant()?;
        let end = self.end.as_ref()?.instant()?;
        Some((start, end))
    }

    pub fn booking_properties(&self) -> BookingProperties {
        BookingProperties::from_map(&self.private_properties)
    }
}

/// Event to be written to the calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCalendarEvent {
    pub summary: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// IANA zone recorded on the event.
    pub time_zone: String,
    pub private_properties: HashMap<String, String>,
}

pub const PROP_CLIENT_NAME: &str = "clientName";
pub const PROP_CLIENT_EMAIL: &str = "clientEmail";
pub const PROP_CLIENT_PHONE: &str = "clientPhone";
pub const PROP_BOOKING_TYPE: &str = "bookingType";
pub const PROP_TECHNICIAN_ID: &str = "technicianId";
pub const PROP_TECHNICIAN_NAME: &str = "technicianName";
pub const PROP_ASSIGNED_AT: &str = "assignedAt";

/// `bookingType` of events created from public reservations.
pub const BOOKING_TYPE_PUBLIC: &str = "public";

/// Typed view of the private extended properties the portal keeps on an event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookingProperties {
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub booking_type: Option<String>,
    pub technician_id: Option<String>,
    pub technician_name: Option<String>,
    pub assigned_at: Option<String>,
}

impl BookingProperties {
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).filter(|v| !v.is_empty()).cloned();
        Self {
            client_name: get(PROP_CLIENT_NAME),
            client_email: get(PROP_CLIENT_EMAIL),
            client_phone: get(PROP_CLIENT_PHONE),
            booking_type: get(PROP_BOOKING_TYPE),
            technician_id: get(PROP_TECHNICIAN_ID),
            technician_name: get(PROP_TECHNICIAN_NAME),
            assigned_at: get(PROP_ASSIGNED_AT),
        }
    }

    pub fn into_map(self) -> HashMap<String, String> {
        [
            (PROP_CLIENT_NAME, self.client_name),
            (PROP_CLIENT_EMAIL, self.client_email),
            (PROP_CLIENT_PHONE, self.client_phone),
            (PROP_BOOKING_TYPE, self.booking_type),
            (PROP_TECHNICIAN_ID, self.technician_id),
            (PROP_TECHNICIAN_NAME, self.technician_name),
            (PROP_ASSIGNED_AT, self.assigned_at),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
        .collect()
    }

    pub fn is_public_booking(&self) -> bool {
        self.booking_type.as_deref() == Some(BOOKING_TYPE_PUBLIC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_properties_skip_unset_keys() {
        let props = BookingProperties {
            client_name: Some("Ana".into()),
            booking_type: Some(BOOKING_TYPE_PUBLIC.into()),
            ..Default::default()
        };
        let map = props.clone().into_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map[PROP_CLIENT_NAME], "Ana");
        assert_eq!(BookingProperties::from_map(&map), props);
        assert!(props.is_public_booking());
    }

    #[test]
    fn all_day_events_have_no_timed_interval() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let event = CalendarEvent {
            id: "holiday".into(),
            start: Some(EventTime::AllDay(date)),
            end: Some(EventTime::AllDay(date.succ_opt().unwrap())),
            ..Default::default()
        };
        assert!(event.timed_interval().is_none());
        assert_eq!(
            event.start.unwrap().sort_key(),
            date.and_time(NaiveTime::MIN).and_utc()
        );
    }
}
