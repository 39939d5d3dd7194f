//! Persistence for Portal SAT
//!
//! Repository traits for bookings, technicians, tasks and posts with two
//! implementations each: SQL through an sqlx `Any` pool (SQLite by default)
//! and an in-process store.
//!
//! ```rust,no_run
//! use portal_config::DatabaseConfig;
//! use portal_db::Repositories;
//!
//! async fn setup() -> Result<Repositories, portal_db::error::DbError> {
//!     let config = DatabaseConfig { url: "sqlite:data/portal.db".to_string() };
//!     Repositories::from_config(&config).await
//! }
//! ```

pub mod client;
pub mod error;
pub mod factory;
pub mod repositories;
pub mod repository;

pub use client::DbClient;
pub use error::DbError;
pub use factory::Repositories;
pub use repositories::{
    InMemoryBookingRepository, InMemoryPostRepository, InMemoryTaskRepository,
    InMemoryTechnicianRepository,
};
pub use repository::{BookingRepository, PostRepository, TaskRepository, TechnicianRepository};
