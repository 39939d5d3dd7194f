//! SQL implementation of the booking repository

use chrono::{DateTime, Utc};
use portal_common::models::{Booking, BookingStatus, NewBooking};
use portal_common::services::BoxFuture;
use portal_common::time::to_storage;
use sqlx::any::AnyRow;
use tracing::{debug, error, info};

use super::{opt_text, opt_timestamp, text, timestamp};
use crate::error::DbError;
use crate::repository::{new_id, BookingRepository};
use crate::DbClient;

const TABLE: &str = "bookings";

const COLUMNS: &str = "id, google_event_id, client_name, client_email, client_phone, description, \
    start_date_time, end_date_time, status, technician_id, technician_name, assigned_at, created_at";

#[derive(Debug, Clone)]
pub struct SqlBookingRepository {
    db_client: DbClient,
}

impl SqlBookingRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing booking schema");
        let query = r#"
            CREATE TABLE IF NOT EXISTS bookings (
                id TEXT PRIMARY KEY,
                google_event_id TEXT NOT NULL,
                client_name TEXT NOT NULL,
                client_email TEXT NOT NULL,
                client_phone TEXT NOT NULL,
                description TEXT NOT NULL,
                start_date_time TEXT NOT NULL,
                end_date_time TEXT NOT NULL,
                status TEXT NOT NULL,
                technician_id TEXT,
                technician_name TEXT,
                assigned_at TEXT,
                created_at TEXT NOT NULL
            )
        "#;
        self.db_client.execute(query).await?;
        self.db_client
            .execute("CREATE INDEX IF NOT EXISTS idx_bookings_event ON bookings (google_event_id)")
            .await?;
        info!("Booking schema initialized successfully");
        Ok(())
    }
}

fn booking_from_row(row: &AnyRow) -> Result<Booking, DbError> {
    let status: String = text(row, TABLE, "status")?;
    Ok(Booking {
        id: text(row, TABLE, "id")?,
        google_event_id: text(row, TABLE, "google_event_id")?,
        client_name: text(row, TABLE, "client_name")?,
        client_email: text(row, TABLE, "client_email")?,
        client_phone: text(row, TABLE, "client_phone")?,
        description: text(row, TABLE, "description")?,
        start_date_time: timestamp(row, TABLE, "start_date_time")?,
        end_date_time: timestamp(row, TABLE, "end_date_time")?,
        status: status
            .parse::<BookingStatus>()
            .map_err(|message| DbError::DecodeError { table: TABLE, message })?,
        technician_id: opt_text(row, TABLE, "technician_id")?,
        technician_name: opt_text(row, TABLE, "technician_name")?,
        assigned_at: opt_timestamp(row, TABLE, "assigned_at")?,
        created_at: timestamp(row, TABLE, "created_at")?,
    })
}

impl BookingRepository for SqlBookingRepository {
    fn create(&self, booking: NewBooking) -> BoxFuture<'_, Booking, DbError> {
        Box::pin(async move {
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
            debug!("Inserting booking for event {}", record.google_event_id);

            let query = r#"
                INSERT INTO bookings (id, google_event_id, client_name, client_email, client_phone,
                    description, start_date_time, end_date_time, status, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#;
            sqlx::query(query)
                .bind(&record.id)
                .bind(&record.google_event_id)
                .bind(&record.client_name)
                .bind(&record.client_email)
                .bind(&record.client_phone)
                .bind(&record.description)
                .bind(to_storage(&record.start_date_time))
                .bind(to_storage(&record.end_date_time))
                .bind(record.status.as_str())
                .bind(to_storage(&record.created_at))
                .execute(self.db_client.pool())
                .await
                .map_err(|e| {
                    error!("Failed to insert booking: {}", e);
                    DbError::QueryError(e.to_string())
                })?;

            Ok(record)
        })
    }

    fn find_by_event_id(&self, event_id: &str) -> BoxFuture<'_, Option<Booking>, DbError> {
        let event_id = event_id.to_string();
        Box::pin(async move {
            let query = format!(
                "SELECT {} FROM bookings WHERE google_event_id = $1 ORDER BY created_at LIMIT 1",
                COLUMNS
            );
            let row = sqlx::query(&query)
                .bind(&event_id)
                .fetch_optional(self.db_client.pool())
                .await
                .map_err(|e| DbError::QueryError(e.to_string()))?;
            row.as_ref().map(booking_from_row).transpose()
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
            let query = r#"
                UPDATE bookings
                SET technician_id = $1, technician_name = $2, assigned_at = $3
                WHERE google_event_id = $4
            "#;
            let result = sqlx::query(query)
                .bind(&technician_id)
                .bind(&technician_name)
                .bind(to_storage(&assigned_at))
                .bind(&event_id)
                .execute(self.db_client.pool())
                .await
                .map_err(|e| DbError::QueryError(e.to_string()))?;
            Ok(result.rows_affected() > 0)
        })
    }
}
