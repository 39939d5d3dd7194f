//! SQL implementation of the technician repository

use chrono::Utc;
use portal_common::models::{NewTechnician, Technician};
use portal_common::services::BoxFuture;
use portal_common::time::to_storage;
use sqlx::any::AnyRow;
use tracing::{debug, error, info};

use super::{integer, text, timestamp};
use crate::error::DbError;
use crate::repository::{new_id, TechnicianRepository};
use crate::DbClient;

const TABLE: &str = "technicians";

#[derive(Debug, Clone)]
pub struct SqlTechnicianRepository {
    db_client: DbClient,
}

impl SqlTechnicianRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing technician schema");
        let query = r#"
            CREATE TABLE IF NOT EXISTS technicians (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                city TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            )
        "#;
        self.db_client.execute(query).await?;
        info!("Technician schema initialized successfully");
        Ok(())
    }
}

fn technician_from_row(row: &AnyRow) -> Result<Technician, DbError> {
    Ok(Technician {
        id: text(row, TABLE, "id")?,
        name: text(row, TABLE, "name")?,
        city: text(row, TABLE, "city")?,
        is_active: integer(row, TABLE, "is_active")? != 0,
        created_at: timestamp(row, TABLE, "created_at")?,
    })
}

impl TechnicianRepository for SqlTechnicianRepository {
    fn list(&self) -> BoxFuture<'_, Vec<Technician>, DbError> {
        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT id, name, city, is_active, created_at FROM technicians ORDER BY name",
            )
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list technicians: {}", e);
                DbError::QueryError(e.to_string())
            })?;
            rows.iter().map(technician_from_row).collect()
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
            sqlx::query(
                "INSERT INTO technicians (id, name, city, is_active, created_at) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(&record.id)
            .bind(&record.name)
            .bind(&record.city)
            .bind(1_i64)
            .bind(to_storage(&record.created_at))
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to insert technician: {}", e);
                DbError::QueryError(e.to_string())
            })?;
            Ok(record)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, bool, DbError> {
        let id = id.to_string();
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM technicians WHERE id = $1")
                .bind(&id)
                .execute(self.db_client.pool())
                .await
                .map_err(|e| DbError::QueryError(e.to_string()))?;
            Ok(result.rows_affected() > 0)
        })
    }
}
