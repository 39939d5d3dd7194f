// --- File: crates/portal_common/src/lib.rs ---

pub mod auth; // Request authentication extractors
pub mod error; // Error taxonomy
pub mod http; // HTTP utilities
pub mod logging; // Logging bootstrap
pub mod models; // Records shared across crates
pub mod services; // Service abstractions
pub mod time; // Timestamp normalization

pub use auth::{AdminUser, AuthUser, Authenticator, StaticTokenVerifier};

pub use error::{
    config_error, conflict, forbidden, internal_error, not_found, unauthorized, upstream_failure,
    validation_error, Context, HttpStatusCode, PortalError,
};

pub use http::{
    client::{create_client, HTTP_CLIENT},
    CreatedResponse, IntoHttpResponse, MessageResponse,
};

pub use logging::{init, init_with_level};
