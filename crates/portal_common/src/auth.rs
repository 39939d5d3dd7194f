// --- File: crates/portal_common/src/auth.rs ---
//! Request authentication.
//!
//! [`AuthUser`] and [`AdminUser`] are axum extractors: a handler that names one
//! in its signature is only reached with a verified caller. Any state `S` works
//! as long as it exposes an [`Authenticator`] through `FromRef`.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{forbidden, unauthorized, PortalError};
use crate::models::Role;
use crate::services::{BoxFuture, TokenVerifier};

pub const DEFAULT_SESSION_COOKIE: &str = "__session";

/// The verified caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Identity platform user id (`sub` claim).
    pub subject: String,
    pub email: Option<String>,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A caller whose role claim is `admin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser(pub AuthUser);

/// Resolves callers from bearer tokens or the session cookie.
#[derive(Clone)]
pub struct Authenticator {
    verifier: Arc<dyn TokenVerifier>,
    session_cookie: Arc<str>,
}

impl Authenticator {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            verifier,
            session_cookie: Arc::from(DEFAULT_SESSION_COOKIE),
        }
    }

    pub fn with_session_cookie(mut self, name: &str) -> Self {
        self.session_cookie = Arc::from(name);
        self
    }

    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthUser, PortalError> {
        let token = session_token(headers, &self.session_cookie)
            .ok_or_else(|| unauthorized("Missing authentication token"))?;
        self.verifier.verify(token).await
    }
}

/// Token from `Authorization: Bearer ..`, falling back to the named cookie.
pub fn session_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    bearer_token(headers).or_else(|| cookie_value(headers, cookie_name))
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}

pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value)
}

/// Verifier backed by a fixed token table, for tests and local runs without
/// an identity project.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    users: HashMap<String, AuthUser>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, token: &str, subject: &str, role: Role) -> Self {
        self.users.insert(
            token.to_string(),
            AuthUser {
                subject: subject.to_string(),
                email: Some(format!("{}@example.com", subject)),
                role,
            },
        );
        self
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> BoxFuture<'_, AuthUser, PortalError> {
        let user = self.users.get(token).cloned();
        Box::pin(async move { user.ok_or_else(|| unauthorized("Invalid or expired token")) })
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    Authenticator: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = PortalError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let authenticator = Authenticator::from_ref(state);
        authenticator.authenticate(&parts.headers).await
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    Authenticator: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = PortalError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(forbidden("Administrator role required"));
        }
        Ok(AdminUser(user))
    }
}
