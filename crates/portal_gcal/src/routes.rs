// --- File: crates/portal_gcal/src/routes.rs ---

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::{
    assign_technician_handler, get_availability_handler, list_events_handler, reconcile_handler,
    reserve_handler, GcalState,
};

/// Creates a router containing all booking routes. Paths are relative to `/api`.
pub fn routes(state: GcalState) -> Router {
    Router::new()
        .route("/booking/availability", get(get_availability_handler))
        .route("/booking/reserve", post(reserve_handler))
        .route("/booking/events", get(list_events_handler))
        .route("/booking/events/{event_id}", put(assign_technician_handler))
        .route("/booking/reconcile", post(reconcile_handler))
        .with_state(state)
}
