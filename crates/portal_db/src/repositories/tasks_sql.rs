//! SQL implementation of the task repository

use chrono::{DateTime, Utc};
use portal_common::models::{Task, TaskDraft};
use portal_common::services::BoxFuture;
use portal_common::time::to_storage;
use sqlx::any::AnyRow;
use tracing::{debug, error, info};

use super::{opt_timestamp, text, timestamp};
use crate::error::DbError;
use crate::repository::{new_id, TaskRepository};
use crate::DbClient;

const TABLE: &str = "tasks";

const COLUMNS: &str = "id, technician_id, technician_name, start_date, end_date, description, \
    address, links, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct SqlTaskRepository {
    db_client: DbClient,
}

impl SqlTaskRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing task schema");
        let query = r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                technician_id TEXT NOT NULL,
                technician_name TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                description TEXT NOT NULL,
                address TEXT NOT NULL DEFAULT '',
                links TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT
            )
        "#;
        self.db_client.execute(query).await?;
        self.db_client
            .execute("CREATE INDEX IF NOT EXISTS idx_tasks_start ON tasks (start_date)")
            .await?;
        info!("Task schema initialized successfully");
        Ok(())
    }

    async fn find(&self, id: &str) -> Result<Option<Task>, DbError> {
        let query = format!("SELECT {} FROM tasks WHERE id = $1", COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        row.as_ref().map(task_from_row).transpose()
    }
}

fn task_from_row(row: &AnyRow) -> Result<Task, DbError> {
    let links: String = text(row, TABLE, "links")?;
    Ok(Task {
        id: text(row, TABLE, "id")?,
        technician_id: text(row, TABLE, "technician_id")?,
        technician_name: text(row, TABLE, "technician_name")?,
        start_date: timestamp(row, TABLE, "start_date")?,
        end_date: timestamp(row, TABLE, "end_date")?,
        description: text(row, TABLE, "description")?,
        address: text(row, TABLE, "address")?,
        links: serde_json::from_str(&links).map_err(|e| DbError::DecodeError {
            table: TABLE,
            message: format!("links: {}", e),
        })?,
        created_at: timestamp(row, TABLE, "created_at")?,
        updated_at: opt_timestamp(row, TABLE, "updated_at")?,
    })
}

fn encode_links(links: &[String]) -> Result<String, DbError> {
    serde_json::to_string(links).map_err(|e| DbError::Other(format!("links: {}", e)))
}

impl TaskRepository for SqlTaskRepository {
    fn list_overlapping(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        technician_id: Option<String>,
    ) -> BoxFuture<'_, Vec<Task>, DbError> {
        Box::pin(async move {
            let filter = if technician_id.is_some() {
                " AND technician_id = $3"
            } else {
                ""
            };
            let query = format!(
                "SELECT {} FROM tasks WHERE start_date < $1 AND end_date >= $2{} ORDER BY start_date",
                COLUMNS, filter
            );
            let mut statement = sqlx::query(&query)
                .bind(to_storage(&to))
                .bind(to_storage(&from));
            if let Some(technician_id) = &technician_id {
                statement = statement.bind(technician_id);
            }
            let rows = statement
                .fetch_all(self.db_client.pool())
                .await
                .map_err(|e| {
                    error!("Failed to list tasks: {}", e);
                    DbError::QueryError(e.to_string())
                })?;
            rows.iter().map(task_from_row).collect()
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
            let query = r#"
                INSERT INTO tasks (id, technician_id, technician_name, start_date, end_date,
                    description, address, links, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#;
            sqlx::query(query)
                .bind(&record.id)
                .bind(&record.technician_id)
                .bind(&record.technician_name)
                .bind(to_storage(&record.start_date))
                .bind(to_storage(&record.end_date))
                .bind(&record.description)
                .bind(&record.address)
                .bind(encode_links(&record.links)?)
                .bind(to_storage(&record.created_at))
                .execute(self.db_client.pool())
                .await
                .map_err(|e| {
                    error!("Failed to insert task: {}", e);
                    DbError::QueryError(e.to_string())
                })?;
            Ok(record)
        })
    }

    fn update(&self, id: &str, draft: TaskDraft) -> BoxFuture<'_, Option<Task>, DbError> {
        let id = id.to_string();
        Box::pin(async move {
            let query = r#"
                UPDATE tasks
                SET technician_id = $1, technician_name = $2, start_date = $3, end_date = $4,
                    description = $5, address = $6, links = $7, updated_at = $8
                WHERE id = $9
            "#;
            let result = sqlx::query(query)
                .bind(&draft.technician_id)
                .bind(&draft.technician_name)
                .bind(to_storage(&draft.start_date))
                .bind(to_storage(&draft.end_date))
                .bind(&draft.description)
                .bind(&draft.address)
                .bind(encode_links(&draft.links)?)
                .bind(to_storage(&Utc::now()))
                .bind(&id)
                .execute(self.db_client.pool())
                .await
                .map_err(|e| {
                    error!("Failed to update task {}: {}", id, e);
                    DbError::QueryError(e.to_string())
                })?;
            if result.rows_affected() == 0 {
                return Ok(None);
            }
            self.find(&id).await
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, bool, DbError> {
        let id = id.to_string();
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
                .bind(&id)
                .execute(self.db_client.pool())
                .await
                .map_err(|e| DbError::QueryError(e.to_string()))?;
            Ok(result.rows_affected() > 0)
        })
    }
}
