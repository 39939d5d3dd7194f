// File: crates/portal_gcal/src/handlers.rs
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRef, Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::Json,
};
use chrono::Utc;
use portal_common::auth::{AdminUser, AuthUser, Authenticator};
use portal_common::error::{validation_error, PortalError};
use portal_common::services::DynCalendarService;
use portal_common::time::parse_date;
use portal_db::BookingRepository;
use std::sync::Arc;
use tracing::info;

use crate::booking::{
    reconcile_bookings, reserve, ReconcileReport, ReservationGuard, ReservationResponse,
    ReserveRequest, IDEMPOTENCY_HEADER,
};
use crate::logic::{
    assign_technician, compute_slots, list_events, AssignTechnicianRequest, AssignmentResponse,
    AvailabilityQuery, AvailabilityResponse, BookingSettings, EventFilter, EventsQuery,
    EventsResponse,
};

/// Shared state of the booking routes.
#[derive(Clone)]
pub struct GcalState {
    pub settings: Arc<BookingSettings>,
    pub calendar: Arc<DynCalendarService>,
    pub bookings: Arc<dyn BookingRepository>,
    pub reservations: Arc<ReservationGuard>,
    pub auth: Authenticator,
}

impl GcalState {
    pub fn new(
        settings: BookingSettings,
        calendar: Arc<DynCalendarService>,
        bookings: Arc<dyn BookingRepository>,
        auth: Authenticator,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            calendar,
            bookings,
            reservations: Arc::new(ReservationGuard::new()),
            auth,
        }
    }
}

impl FromRef<GcalState> for Authenticator {
    fn from_ref(state: &GcalState) -> Self {
        state.auth.clone()
    }
}

/// Handler to get the slots of one day.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/booking/availability",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Slots of the day", body = AvailabilityResponse),
        (status = 400, description = "Missing or invalid date"),
        (status = 500, description = "Calendar provider failure")
    ),
    tag = "Booking"
))]
pub async fn get_availability_handler(
    State(state): State<GcalState>,
    query: Result<Query<AvailabilityQuery>, QueryRejection>,
) -> Result<Json<AvailabilityResponse>, PortalError> {
    let Query(query) = query?;
    let raw = query
        .date
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| validation_error("Query parameter 'date' is required (YYYY-MM-DD)"))?;
    let date = parse_date(&raw)?;

    let slots = compute_slots(state.calendar.as_ref(), &state.settings, date).await?;
    Ok(Json(AvailabilityResponse { date: raw, slots }))
}

/// Handler for public reservations.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/booking/reserve",
    request_body = ReserveRequest,
    params(
        ("Idempotency-Key" = Option<String>, Header, description = "Replays the first result for a repeated key")
    ),
    responses(
        (status = 201, description = "Booking created", body = ReservationResponse),
        (status = 400, description = "Missing fields or invalid dates"),
        (status = 409, description = "Slot no longer available, or Idempotency-Key reused for another reservation"),
        (status = 500, description = "Calendar or database failure")
    ),
    tag = "Booking"
))]
pub async fn reserve_handler(
    State(state): State<GcalState>,
    headers: HeaderMap,
    payload: Result<Json<ReserveRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ReservationResponse>), PortalError> {
    let Json(request) = payload?;
    let idempotency_key = headers
        .get(IDEMPOTENCY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let response = reserve(
        state.calendar.as_ref(),
        state.bookings.as_ref(),
        &state.reservations,
        &state.settings,
        request,
        idempotency_key,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Handler listing calendar events for signed-in staff.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/booking/events",
    params(EventsQuery),
    responses(
        (status = 200, description = "Calendar events", body = EventsResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = [])),
    tag = "Booking"
))]
pub async fn list_events_handler(
    State(state): State<GcalState>,
    _user: AuthUser,
    query: Result<Query<EventsQuery>, QueryRejection>,
) -> Result<Json<EventsResponse>, PortalError> {
    let Query(query) = query?;
    let filter = EventFilter::parse(query.filter.as_deref());
    let events = list_events(state.calendar.as_ref(), &state.settings, filter, Utc::now()).await?;
    Ok(Json(EventsResponse { events }))
}

/// Handler assigning a technician to a calendar event.
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/booking/events/{event_id}",
    params(("event_id" = String, Path, description = "Calendar event id")),
    request_body = AssignTechnicianRequest,
    responses(
        (status = 200, description = "Technician assigned", body = AssignmentResponse),
        (status = 400, description = "Missing technician fields"),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Unknown event")
    ),
    security(("bearer" = [])),
    tag = "Booking"
))]
pub async fn assign_technician_handler(
    State(state): State<GcalState>,
    AdminUser(admin): AdminUser,
    event_id: Result<Path<String>, PathRejection>,
    payload: Result<Json<AssignTechnicianRequest>, JsonRejection>,
) -> Result<Json<AssignmentResponse>, PortalError> {
    let Path(event_id) = event_id?;
    let Json(request) = payload?;
    info!("{} assigns technician on event {}", admin.subject, event_id);
    let event = assign_technician(
        state.calendar.as_ref(),
        state.bookings.as_ref(),
        &state.settings,
        &event_id,
        request,
        Utc::now(),
    )
    .await?;
    Ok(Json(AssignmentResponse {
        success: true,
        event,
    }))
}

/// Handler recreating booking records missing for public booking events.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/booking/reconcile",
    responses(
        (status = 200, description = "Reconciliation report", body = ReconcileReport),
        (status = 403, description = "Administrator role required")
    ),
    security(("bearer" = [])),
    tag = "Booking"
))]
pub async fn reconcile_handler(
    State(state): State<GcalState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<ReconcileReport>, PortalError> {
    info!("{} started booking reconciliation", admin.subject);
    let report = reconcile_bookings(
        state.calendar.as_ref(),
        state.bookings.as_ref(),
        &state.settings,
        Utc::now(),
    )
    .await?;
    Ok(Json(report))
}
