// --- File: crates/portal_schedule/src/doc.rs ---
#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::handlers::TechnicianRequest;
use crate::tasks::TaskRequest;
use crate::week::{
    AssignedTechnician, Assignment, DayEntries, EventEntry, TaskEntry, WeekEntry, WeekView,
};
use portal_common::models::{Task, Technician};
use portal_common::{CreatedResponse, MessageResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::list_technicians_handler,
        crate::handlers::create_technician_handler,
        crate::handlers::delete_technician_handler,
        crate::handlers::list_tasks_handler,
        crate::handlers::create_task_handler,
        crate::handlers::update_task_handler,
        crate::handlers::delete_task_handler,
        crate::handlers::week_view_handler
    ),
    components(
        schemas(
            Technician,
            TechnicianRequest,
            Task,
            TaskRequest,
            CreatedResponse,
            MessageResponse,
            AssignedTechnician,
            Assignment,
            TaskEntry,
            EventEntry,
            WeekEntry,
            DayEntries,
            WeekView
        )
    ),
    tags(
        (name = "Schedule", description = "Technicians, tasks and the weekly calendar")
    )
)]
pub struct ScheduleApiDoc;
