// File: crates/portal_gcal/src/doc.rs
#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::booking::{ReconcileReport, ReservationResponse, ReserveRequest};
use crate::logic::{
    AssignTechnicianRequest, AssignmentResponse, AvailabilityResponse, BookingEvent,
    EventsResponse, TimeSlot,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::get_availability_handler,
        crate::handlers::reserve_handler,
        crate::handlers::list_events_handler,
        crate::handlers::assign_technician_handler,
        crate::handlers::reconcile_handler
    ),
    components(
        schemas(
            TimeSlot,
            AvailabilityResponse,
            ReserveRequest,
            ReservationResponse,
            BookingEvent,
            EventsResponse,
            AssignTechnicianRequest,
            AssignmentResponse,
            ReconcileReport
        )
    ),
    tags(
        (name = "Booking", description = "Appointment availability, reservations and assignment")
    )
)]
pub struct GcalApiDoc;
