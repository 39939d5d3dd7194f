// --- File: crates/portal_schedule/src/handlers.rs ---
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRef, Path, Query, State,
    },
    http::StatusCode,
    response::Json,
};
use portal_common::auth::{AdminUser, AuthUser, Authenticator};
use portal_common::error::{not_found, validation_error, PortalError};
use portal_common::models::{NewTechnician, Task, Technician};
use portal_common::services::DynCalendarService;
use portal_common::{CreatedResponse, MessageResponse};
use portal_db::{TaskRepository, TechnicianRepository};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::tasks::{week_window, ScheduleSettings, TaskRequest, TasksQuery};
use crate::week::{merge_week, WeekView};

/// Shared state of the technician, task and weekly view routes.
#[derive(Clone)]
pub struct ScheduleState {
    pub settings: Arc<ScheduleSettings>,
    pub technicians: Arc<dyn TechnicianRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub calendar: Arc<DynCalendarService>,
    pub auth: Authenticator,
}

impl FromRef<ScheduleState> for Authenticator {
    fn from_ref(state: &ScheduleState) -> Self {
        state.auth.clone()
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TechnicianRequest {
    pub name: String,
    pub city: String,
}

#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekQuery {
    /// Any day of the requested week, `YYYY-MM-DD`
    pub week_start: Option<String>,
}

// --- Technicians ---

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/technicians",
    responses(
        (status = 200, description = "Technician roster ordered by name", body = [Technician]),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = [])),
    tag = "Schedule"
))]
pub async fn list_technicians_handler(
    State(state): State<ScheduleState>,
    _user: AuthUser,
) -> Result<Json<Vec<Technician>>, PortalError> {
    Ok(Json(state.technicians.list().await?))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/technicians",
    request_body = TechnicianRequest,
    responses(
        (status = 201, description = "Technician created", body = CreatedResponse),
        (status = 400, description = "Missing name or city"),
        (status = 403, description = "Administrator role required")
    ),
    security(("bearer" = [])),
    tag = "Schedule"
))]
pub async fn create_technician_handler(
    State(state): State<ScheduleState>,
    AdminUser(caller): AdminUser,
    payload: Result<Json<TechnicianRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), PortalError> {
    let Json(request) = payload?;
    let (name, city) = (request.name.trim(), request.city.trim());
    if name.is_empty() || city.is_empty() {
        return Err(validation_error("Name and city are required"));
    }

    let technician = state
        .technicians
        .create(NewTechnician {
            name: name.to_string(),
            city: city.to_string(),
        })
        .await?;
    info!("{} added technician {} ({})", caller.subject, technician.name, technician.id);

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id: technician.id,
            message: "Technician created successfully".to_string(),
        }),
    ))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/technicians/{id}",
    params(("id" = String, Path, description = "Technician id")),
    responses(
        (status = 200, description = "Technician deleted", body = MessageResponse),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Unknown technician")
    ),
    security(("bearer" = [])),
    tag = "Schedule"
))]
pub async fn delete_technician_handler(
    State(state): State<ScheduleState>,
    AdminUser(caller): AdminUser,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<MessageResponse>, PortalError> {
    let Path(id) = id?;
    if !state.technicians.delete(&id).await? {
        return Err(not_found("Technician not found"));
    }
    info!("{} removed technician {}", caller.subject, id);
    Ok(Json(MessageResponse::new("Technician deleted successfully")))
}

// --- Tasks ---

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tasks",
    params(TasksQuery),
    responses(
        (status = 200, description = "Tasks overlapping the week, ordered by start", body = [Task]),
        (status = 400, description = "Missing or invalid weekStart"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = [])),
    tag = "Schedule"
))]
pub async fn list_tasks_handler(
    State(state): State<ScheduleState>,
    _user: AuthUser,
    query: Result<Query<TasksQuery>, QueryRejection>,
) -> Result<Json<Vec<Task>>, PortalError> {
    let Query(query) = query?;
    let (_, from, to) = week_window(query.week_start.as_deref(), state.settings.time_zone)?;
    let technician_id = query
        .technician_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());
    Ok(Json(state.tasks.list_overlapping(from, to, technician_id).await?))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/tasks",
    request_body = TaskRequest,
    responses(
        (status = 201, description = "Task created", body = CreatedResponse),
        (status = 400, description = "Missing fields or invalid dates"),
        (status = 403, description = "Administrator role required")
    ),
    security(("bearer" = [])),
    tag = "Schedule"
))]
pub async fn create_task_handler(
    State(state): State<ScheduleState>,
    AdminUser(caller): AdminUser,
    payload: Result<Json<TaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), PortalError> {
    let Json(request) = payload?;
    let task = state.tasks.create(request.validate()?).await?;
    info!(
        "{} scheduled task {} for {}",
        caller.subject, task.id, task.technician_name
    );
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id: task.id,
            message: "Task created successfully".to_string(),
        }),
    ))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/tasks/{id}",
    params(("id" = String, Path, description = "Task id")),
    request_body = TaskRequest,
    responses(
        (status = 200, description = "Task updated", body = MessageResponse),
        (status = 400, description = "Missing fields or invalid dates"),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Unknown task")
    ),
    security(("bearer" = [])),
    tag = "Schedule"
))]
pub async fn update_task_handler(
    State(state): State<ScheduleState>,
    AdminUser(caller): AdminUser,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<TaskRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, PortalError> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let draft = request.validate()?;
    if state.tasks.update(&id, draft).await?.is_none() {
        return Err(not_found("Task not found"));
    }
    info!("{} updated task {}", caller.subject, id);
    Ok(Json(MessageResponse::new("Task updated successfully")))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/tasks/{id}",
    params(("id" = String, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task deleted", body = MessageResponse),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Unknown task")
    ),
    security(("bearer" = [])),
    tag = "Schedule"
))]
pub async fn delete_task_handler(
    State(state): State<ScheduleState>,
    AdminUser(caller): AdminUser,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<MessageResponse>, PortalError> {
    let Path(id) = id?;
    if !state.tasks.delete(&id).await? {
        return Err(not_found("Task not found"));
    }
    info!("{} deleted task {}", caller.subject, id);
    Ok(Json(MessageResponse::new("Task deleted successfully")))
}

// --- Weekly view ---

/// Tasks and calendar events of one week, bucketed per local day.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/calendar/week",
    params(WeekQuery),
    responses(
        (status = 200, description = "Seven days of tasks and bookings", body = WeekView),
        (status = 400, description = "Missing or invalid weekStart"),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Calendar provider failure")
    ),
    security(("bearer" = [])),
    tag = "Schedule"
))]
pub async fn week_view_handler(
    State(state): State<ScheduleState>,
    _user: AuthUser,
    query: Result<Query<WeekQuery>, QueryRejection>,
) -> Result<Json<WeekView>, PortalError> {
    let Query(query) = query?;
    let tz = state.settings.time_zone;
    let (date, from, to) = week_window(query.week_start.as_deref(), tz)?;

    let tasks = state.tasks.list_overlapping(from, to, None).await?;
    let events = state
        .calendar
        .list_events(&state.settings.calendar_id, from, to)
        .await?;

    Ok(Json(merge_week(&tasks, &events, date, tz)?))
}
