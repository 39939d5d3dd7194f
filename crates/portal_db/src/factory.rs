//! Builds the repository set selected by the `[database]` configuration.

use portal_config::DatabaseConfig;
use std::sync::Arc;
use tracing::info;

use crate::client::DbClient;
use crate::error::DbError;
use crate::repositories::{
    InMemoryBookingRepository, InMemoryPostRepository, InMemoryTaskRepository,
    InMemoryTechnicianRepository, SqlBookingRepository, SqlPostRepository, SqlTaskRepository,
    SqlTechnicianRepository,
};
use crate::repository::{BookingRepository, PostRepository, TaskRepository, TechnicianRepository};

/// Every repository the portal uses, ready to be shared between routers.
#[derive(Clone)]
pub struct Repositories {
    pub bookings: Arc<dyn BookingRepository>,
    pub technicians: Arc<dyn TechnicianRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub posts: Arc<dyn PostRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            bookings: Arc::new(InMemoryBookingRepository::new()),
            technicians: Arc::new(InMemoryTechnicianRepository::new()),
            tasks: Arc::new(InMemoryTaskRepository::new()),
            posts: Arc::new(InMemoryPostRepository::new()),
        }
    }

    /// SQL repositories over `db_client`, with their tables created if missing.
    pub async fn sql(db_client: DbClient) -> Result<Self, DbError> {
        let bookings = SqlBookingRepository::new(db_client.clone());
        let technicians = SqlTechnicianRepository::new(db_client.clone());
        let tasks = SqlTaskRepository::new(db_client.clone());
        let posts = SqlPostRepository::new(db_client);

        bookings.init_schema().await?;
        technicians.init_schema().await?;
        tasks.init_schema().await?;
        posts.init_schema().await?;

        Ok(Self {
            bookings: Arc::new(bookings),
            technicians: Arc::new(technicians),
            tasks: Arc::new(tasks),
            posts: Arc::new(posts),
        })
    }

    /// `memory` selects the in-process store, anything else is an sqlx URL.
    pub async fn from_config(db_config: &DatabaseConfig) -> Result<Self, DbError> {
        if db_config.is_memory() {
            info!("Using in-memory repositories");
            return Ok(Self::in_memory());
        }
        let db_client = DbClient::from_config(db_config).await?;
        Self::sql(db_client).await
    }
}
