//! Identity platform integration for Portal SAT
//!
//! This crate verifies the ID tokens that portal users sign in with and
//! administers their accounts through the identity platform's REST API.
//!
//! # Features
//!
//! - RS256 ID token verification against the published signing keys, with an
//!   in-memory key cache ([`FirebaseTokenVerifier`])
//! - Account listing, role custom claims and refresh token revocation
//!   ([`FirebaseAdminClient`])
//! - Service account authentication for the admin API
//! - An in-memory account directory for local runs and tests
//! - Integration with Axum for the admin panel endpoints
//! - OpenAPI/Swagger documentation (with the `openapi` feature)
//!
//! # Example
//!
//! ```rust,no_run
//! use portal_common::Authenticator;
//! use portal_firebase::{routes, FirebaseState, FirebaseTokenVerifier, InMemoryIdentityAdmin};
//! use std::sync::Arc;
//!
//! let verifier = Arc::new(FirebaseTokenVerifier::new("my-project"));
//! let state = FirebaseState {
//!     admin: Arc::new(InMemoryIdentityAdmin::new()),
//!     auth: Authenticator::new(verifier),
//! };
//! let app: axum::Router = routes(state);
//! ```
//!
//! # API Endpoints
//!
//! - `GET /admin/users` - List portal accounts (admin)
//! - `PATCH /admin/users` - Change the role of an account (admin)

pub mod auth;
pub mod client;
pub mod doc;
pub mod handlers;
#[cfg(test)]
mod handlers_test;
pub mod mock;
pub mod routes;
pub mod verifier;

pub use client::{FirebaseAdminClient, FirebaseError};
pub use handlers::FirebaseState;
pub use mock::InMemoryIdentityAdmin;
pub use routes::routes;
pub use verifier::FirebaseTokenVerifier;

#[cfg(feature = "openapi")]
pub mod openapi {
    pub use crate::doc::FirebaseApiDoc;
}
