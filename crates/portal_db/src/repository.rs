//! Repository traits
//!
//! One trait per record type. Methods return boxed futures so the repositories
//! can be shared as `Arc<dyn ...>` between handlers. Each trait has an SQL and an
//! in-memory implementation.

use chrono::{DateTime, Utc};
use portal_common::models::{
    Booking, NewBooking, NewPost, NewTechnician, Post, Task, TaskDraft, Technician,
};
use portal_common::services::BoxFuture;

use crate::error::DbError;

pub trait BookingRepository: Send + Sync {
    /// Store a new booking record.
    fn create(&self, booking: NewBooking) -> BoxFuture<'_, Booking, DbError>;

    /// The booking mirrored from calendar event `event_id`, if any.
    fn find_by_event_id(&self, event_id: &str) -> BoxFuture<'_, Option<Booking>, DbError>;

    /// Copy a technician assignment onto the booking of `event_id`.
    ///
    /// Returns `false` when no booking references the event.
    fn record_assignment(
        &self,
        event_id: &str,
        technician_id: &str,
        technician_name: &str,
        assigned_at: DateTime<Utc>,
    ) -> BoxFuture<'_, bool, DbError>;
}

pub trait TechnicianRepository: Send + Sync {
    /// Every technician, ordered by name.
    fn list(&self) -> BoxFuture<'_, Vec<Technician>, DbError>;

    /// Store a new, active technician.
    fn create(&self, technician: NewTechnician) -> BoxFuture<'_, Technician, DbError>;

    /// Returns `false` when the id is unknown.
    fn delete(&self, id: &str) -> BoxFuture<'_, bool, DbError>;
}

pub trait TaskRepository: Send + Sync {
    /// Tasks whose `[start_date, end_date]` overlaps `[from, to)`, ordered by start.
    fn list_overlapping(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        technician_id: Option<String>,
    ) -> BoxFuture<'_, Vec<Task>, DbError>;

    fn create(&self, draft: TaskDraft) -> BoxFuture<'_, Task, DbError>;

    /// Replace the task's fields and stamp `updated_at`. `None` when the id is unknown.
    fn update(&self, id: &str, draft: TaskDraft) -> BoxFuture<'_, Option<Task>, DbError>;

    /// Returns `false` when the id is unknown.
    fn delete(&self, id: &str) -> BoxFuture<'_, bool, DbError>;
}

pub trait PostRepository: Send + Sync {
    /// Posts with `expires_at > now`, latest expiry first.
    fn list_active(&self, now: DateTime<Utc>) -> BoxFuture<'_, Vec<Post>, DbError>;

    fn create(&self, post: NewPost) -> BoxFuture<'_, Post, DbError>;

    /// Returns `false` when the id is unknown.
    fn delete(&self, id: &str) -> BoxFuture<'_, bool, DbError>;
}

/// Fresh record id.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
