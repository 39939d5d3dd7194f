//! In-process repositories
//!
//! Selected with `database.url = "memory"`; also what the handler tests run
//! against. Data lives as long as the value does.

use chrono::{DateTime, Utc};
use portal_common::models::{
    Booking, NewBooking, NewPost, NewTechnician, Post, Task, TaskDraft, Technician,
};
use portal_common::services::BoxFuture;
use std::sync::{Mutex, MutexGuard};

use crate::error::DbError;
use crate::repository::{
    new_id, BookingRepository, PostRepository, TaskRepository, TechnicianRepository,
};

// A poisoned lock only means another request panicked mid-update; the Vec is still usable
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
pub struct InMemoryBookingRepository {
    bookings: Mutex<Vec<Booking>>,
    fail_writes: Mutex<bool>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, to exercise partial-failure paths.
    pub fn fail_writes(&self, fail: bool) {
        *lock(&self.fail_writes) = fail;
    }

    pub fn all(&self) -> Vec<Booking> {
        lock(&self.bookings).clone()
    }

    fn check_writable(&self) -> Result<(), DbError> {
        if *lock(&self.fail_writes) {
            return Err(DbError::QueryError("writes disabled".to_string()));
        }
        Ok(())
    }
}

impl BookingRepository for InMemoryBookingRepository {
    fn create(&self, booking: NewBooking) -> BoxFuture<'_, Booking, DbError> {
        Box::pin(async move {
            self.check_writable()?;
            let record = Booking {
                id: new_id(),
                google_event_id: booking.google_event_id,
                client_name: booking.client_name,
                client_email: booking.client_email,
                client_phone: booking.client_phone,
                description: booking.description,
                start_date_time: booking.start_date_time,
                end_date_time: booking.end_date_time,
                status: booking.status,
                technician_id: None,
                technician_name: None,
                assigned_at: None,
                created_at: Utc::now(),
            };
            lock(&self.bookings).push(record.clone());
            Ok(record)
        })
    }

    fn find_by_event_id(&self, event_id: &str) -> BoxFuture<'_, Option<Booking>, DbError> {
        let event_id = event_id.to_string();
        Box::pin(async move {
            Ok(lock(&self.bookings)
                .iter()
                .find(|b| b.google_event_id == event_id)
                .cloned())
        })
    }

    fn record_assignment(
        &self,
        event_id: &str,
        technician_id: &str,
        technician_name: &str,
        assigned_at: DateTime<Utc>,
    ) -> BoxFuture<'_, bool, DbError> {
        let event_id = event_id.to_string();
        let technician_id = technician_id.to_string();
        let technician_name = technician_name.to_string();
        Box::pin(async move {
            self.check_writable()?;
            let mut bookings = lock(&self.bookings);
            let mut updated = false;
            for booking in bookings.iter_mut().filter(|b| b.google_event_id == event_id) {
                booking.technician_id = Some(technician_id.clone());
                booking.technician_name = Some(technician_name.clone());
                booking.assigned_at = Some(assigned_at);
                updated = true;
            }
            Ok(updated)
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTechnicianRepository {
    technicians: Mutex<Vec<Technician>>,
}

impl InMemoryTechnicianRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TechnicianRepository for InMemoryTechnicianRepository {
    fn list(&self) -> BoxFuture<'_, Vec<Technician>, DbError> {
        Box::pin(async move {
            let mut technicians = lock(&self.technicians).clone();
            technicians.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(technicians)
        })
    }

    fn create(&self, technician: NewTechnician) -> BoxFuture<'_, Technician, DbError> {
        Box::pin(async move {
            let record = Technician {
                id: new_id(),
                name: technician.name,
                city: technician.city,
                is_active: true,
                created_at: Utc::now(),
            };
            lock(&self.technicians).push(record.clone());
            Ok(record)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, bool, DbError> {
        let id = id.to_string();
        Box::pin(async move {
            let mut technicians = lock(&self.technicians);
            let before = technicians.len();
            technicians.retain(|t| t.id != id);
            Ok(technicians.len() != before)
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    tasks: Mutex<Vec<Task>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskRepository for InMemoryTaskRepository {
    fn list_overlapping(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        technician_id: Option<String>,
    ) -> BoxFuture<'_, Vec<Task>, DbError> {
        Box::pin(async move {
            let mut tasks: Vec<Task> = lock(&self.tasks)
                .iter()
                .filter(|t| t.start_date < to && t.end_date >= from)
                .filter(|t| {
                    technician_id
                        .as_deref()
                        .map_or(true, |id| t.technician_id == id)
                })
                .cloned()
                .collect();
            tasks.sort_by_key(|t| t.start_date);
            Ok(tasks)
        })
    }

    fn create(&self, draft: TaskDraft) -> BoxFuture<'_, Task, DbError> {
        Box::pin(async move {
            let record = Task {
                id: new_id(),
                technician_id: draft.technician_id,
                technician_name: draft.technician_name,
                start_date: draft.start_date,
                end_date: draft.end_date,
                description: draft.description,
                address: draft.address,
                links: draft.links,
                created_at: Utc::now(),
                updated_at: None,
            };
            lock(&self.tasks).push(record.clone());
            Ok(record)
        })
    }

    fn update(&self, id: &str, draft: TaskDraft) -> BoxFuture<'_, Option<Task>, DbError> {
        let id = id.to_string();
        Box::pin(async move {
            let mut tasks = lock(&self.tasks);
            let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
                return Ok(None);
            };
            task.technician_id = draft.technician_id;
            task.technician_name = draft.technician_name;
            task.start_date = draft.start_date;
            task.end_date = draft.end_date;
            task.description = draft.description;
            task.address = draft.address;
            task.links = draft.links;
            task.updated_at = Some(Utc::now());
            Ok(Some(task.clone()))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, bool, DbError> {
        let id = id.to_string();
        Box::pin(async move {
            let mut tasks = lock(&self.tasks);
            let before = tasks.len();
            tasks.retain(|t| t.id != id);
            Ok(tasks.len() != before)
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPostRepository {
    posts: Mutex<Vec<Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PostRepository for InMemoryPostRepository {
    fn list_active(&self, now: DateTime<Utc>) -> BoxFuture<'_, Vec<Post>, DbError> {
        Box::pin(async move {
            let mut posts: Vec<Post> = lock(&self.posts)
                .iter()
                .filter(|p| p.expires_at > now)
                .cloned()
                .collect();
            posts.sort_by(|a, b| b.expires_at.cmp(&a.expires_at));
            Ok(posts)
        })
    }

    fn create(&self, post: NewPost) -> BoxFuture<'_, Post, DbError> {
        Box::pin(async move {
            let record = Post {
                id: new_id(),
                title: post.title,
                content: post.content,
                category: post.category,
                author: post.author,
                author_email: post.author_email,
                image_url: post.image_url,
                duration: post.duration,
                created_at: post.created_at,
                expires_at: post.expires_at,
            };
            lock(&self.posts).push(record.clone());
            Ok(record)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, bool, DbError> {
        let id = id.to_string();
        Box::pin(async move {
            let mut posts = lock(&self.posts);
            let before = posts.len();
            posts.retain(|p| p.id != id);
            Ok(posts.len() != before)
        })
    }
}
