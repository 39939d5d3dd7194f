// --- File: crates/portal_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The error type shared by every portal crate.
///
/// Feature crates convert their own errors with `From<SpecificError> for PortalError`.
/// Each variant maps onto exactly one HTTP status, see [`HttpStatusCode`].
#[derive(Error, Debug)]
pub enum PortalError {
    /// Missing, malformed or expired identity token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but the role claim does not allow the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Missing or malformed request fields.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The requested slot (or resource) is already taken.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The calendar provider, identity platform or another remote call failed.
    #[error("Upstream failure: {service} - {message}")]
    UpstreamFailure { service: String, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for PortalError {
    fn status_code(&self) -> u16 {
        match self {
            PortalError::Unauthorized(_) => 401,
            PortalError::Forbidden(_) => 403,
            PortalError::ValidationError(_) => 400,
            PortalError::Conflict(_) => 409,
            PortalError::NotFound(_) => 404,
            PortalError::UpstreamFailure { .. } => 500,
            PortalError::ConfigError(_) => 500,
            PortalError::DatabaseError(_) => 500,
            PortalError::InternalError(_) => 500,
        }
    }
}

impl PortalError {
    /// Message safe to show to a caller. Server-side failures are reduced to a
    /// generic sentence; the detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            PortalError::Unauthorized(msg)
            | PortalError::Forbidden(msg)
            | PortalError::ValidationError(msg)
            | PortalError::Conflict(msg)
            | PortalError::NotFound(msg) => msg.clone(),
            PortalError::UpstreamFailure { service, .. } => {
                format!("The {} service could not complete the request", service)
            }
            PortalError::ConfigError(_) => "Server configuration error".to_string(),
            PortalError::DatabaseError(_) | PortalError::InternalError(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

/// A trait for adding context to errors.
pub trait Context<T, E> {
    /// Adds context to an error.
    fn context<C>(self, context: C) -> Result<T, PortalError>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Adds context to an error with a lazy context provider.
    fn with_context<C, F>(self, f: F) -> Result<T, PortalError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E: std::error::Error + Send + Sync + 'static> Context<T, E> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, PortalError>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|error| PortalError::InternalError(format!("{}: {}", context, error)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, PortalError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|error| PortalError::InternalError(format!("{}: {}", f(), error)))
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(err: reqwest::Error) -> Self {
        upstream_failure("http", err)
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        PortalError::InternalError(err.to_string())
    }
}

pub fn unauthorized<T: fmt::Display>(message: T) -> PortalError {
    PortalError::Unauthorized(message.to_string())
}

pub fn forbidden<T: fmt::Display>(message: T) -> PortalError {
    PortalError::Forbidden(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> PortalError {
    PortalError::ValidationError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> PortalError {
    PortalError::NotFound(message.to_string())
}

pub fn conflict<T: fmt::Display>(message: T) -> PortalError {
    PortalError::Conflict(message.to_string())
}

pub fn upstream_failure<T: fmt::Display>(service: &str, message: T) -> PortalError {
    PortalError::UpstreamFailure {
        service: service.to_string(),
        message: message.to_string(),
    }
}

pub fn config_error<T: fmt::Display>(message: T) -> PortalError {
    PortalError::ConfigError(message.to_string())
}

pub fn internal_error<T: fmt::Display>(message: T) -> PortalError {
    PortalError::InternalError(message.to_string())
}
