// --- File: crates/portal_schedule/src/lib.rs ---
//! Technician roster, task scheduling and the weekly calendar view.
//!
//! - `GET /technicians`, `POST /technicians`, `DELETE /technicians/{id}`
//! - `GET /tasks?weekStart=`, `POST /tasks`, `PUT /tasks/{id}`, `DELETE /tasks/{id}`
//! - `GET /calendar/week?weekStart=`
//!
//! Reads need an authenticated user, mutations an administrator.

pub mod doc;
pub mod handlers;
pub mod routes;
pub mod tasks;
pub mod week;
#[cfg(test)]
mod week_proptest;

pub use handlers::ScheduleState;
pub use routes::routes;
pub use tasks::ScheduleSettings;
pub use week::{merge_week, WeekView};

#[cfg(feature = "openapi")]
pub mod openapi {
    pub use crate::doc::ScheduleApiDoc;
}
