//! Repository implementations
//!
//! `*_sql` modules talk to the sqlx pool; `memory` keeps everything in process.

pub mod bookings_sql;
pub mod memory;
pub mod posts_sql;
pub mod tasks_sql;
pub mod technicians_sql;

pub use bookings_sql::SqlBookingRepository;
pub use memory::{
    InMemoryBookingRepository, InMemoryPostRepository, InMemoryTaskRepository,
    InMemoryTechnicianRepository,
};
pub use posts_sql::SqlPostRepository;
pub use tasks_sql::SqlTaskRepository;
pub use technicians_sql::SqlTechnicianRepository;

use crate::error::DbError;
use chrono::{DateTime, Utc};
use portal_common::time::from_storage;
use sqlx::any::AnyRow;
use sqlx::Row;

// Timestamps are stored as RFC 3339 text: DateTime<Utc> has no Decode impl for sqlx::Any

pub(crate) fn text(row: &AnyRow, table: &'static str, column: &str) -> Result<String, DbError> {
    row.try_get::<String, _>(column)
        .map_err(|e| decode_error(table, column, e))
}

pub(crate) fn opt_text(
    row: &AnyRow,
    table: &'static str,
    column: &str,
) -> Result<Option<String>, DbError> {
    row.try_get::<Option<String>, _>(column)
        .map_err(|e| decode_error(table, column, e))
}

pub(crate) fn integer(row: &AnyRow, table: &'static str, column: &str) -> Result<i64, DbError> {
    row.try_get::<i64, _>(column)
        .map_err(|e| decode_error(table, column, e))
}

pub(crate) fn timestamp(
    row: &AnyRow,
    table: &'static str,
    column: &str,
) -> Result<DateTime<Utc>, DbError> {
    let raw = text(row, table, column)?;
    from_storage(&raw).map_err(|e| decode_error(table, column, e))
}

pub(crate) fn opt_timestamp(
    row: &AnyRow,
    table: &'static str,
    column: &str,
) -> Result<Option<DateTime<Utc>>, DbError> {
    opt_text(row, table, column)?
        .map(|raw| from_storage(&raw).map_err(|e| decode_error(table, column, e)))
        .transpose()
}

fn decode_error(table: &'static str, column: &str, err: impl std::fmt::Display) -> DbError {
    DbError::DecodeError {
        table,
        message: format!("{}: {}", column, err),
    }
}
