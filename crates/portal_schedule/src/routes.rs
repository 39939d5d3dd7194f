// --- File: crates/portal_schedule/src/routes.rs ---

use axum::{
    routing::{delete, get, put},
    Router,
};

use crate::handlers::{
    create_task_handler, create_technician_handler, delete_task_handler,
    delete_technician_handler, list_tasks_handler, list_technicians_handler, update_task_handler,
    week_view_handler, ScheduleState,
};

/// Creates the schedule router. Paths are relative to `/api`.
pub fn routes(state: ScheduleState) -> Router {
    Router::new()
        .route(
            "/technicians",
            get(list_technicians_handler).post(create_technician_handler),
        )
        .route("/technicians/{id}", delete(delete_technician_handler))
        .route("/tasks", get(list_tasks_handler).post(create_task_handler))
        .route(
            "/tasks/{id}",
            put(update_task_handler).delete(delete_task_handler),
        )
        .route("/calendar/week", get(week_view_handler))
        .with_state(state)
}
