//! Error types for the database client

use portal_common::PortalError;
use thiserror::Error;

/// Errors that can occur when working with the database client
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// Error with database query
    #[error("Database query error: {0}")]
    QueryError(String),

    /// A stored row could not be turned back into a record
    #[error("Corrupt row in {table}: {message}")]
    DecodeError { table: &'static str, message: String },

    /// Other errors
    #[error("Other database error: {0}")]
    Other(String),
}

impl From<DbError> for PortalError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ConfigError(msg) => PortalError::ConfigError(msg),
            other => PortalError::DatabaseError(other.to_string()),
        }
    }
}
