// --- File: crates/services/portal_backend/src/guard.rs ---
//! Session guard for the portal pages.
//!
//! Only the presence of a session token is checked here. The API routes
//! verify tokens themselves and are never redirected.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use portal_common::auth::session_token;
use portal_config::PortalConfig;
use std::sync::Arc;
use tracing::debug;

/// Paths served without a session: the API and static assets.
const UNGUARDED_PREFIXES: &[&str] = &["/api", "/_next/static", "/_next/image", "/favicon.ico"];

#[derive(Debug, Clone)]
pub struct GuardSettings {
    pub login_path: String,
    pub home_path: String,
    pub session_cookie: String,
}

impl GuardSettings {
    pub fn from_config(config: &PortalConfig) -> Self {
        Self {
            login_path: config.login_path.clone(),
            home_path: config.home_path.clone(),
            session_cookie: config.session_cookie.clone(),
        }
    }
}

/// What the guard does with a request.
#[derive(Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    RedirectToLogin,
    RedirectHome,
}

fn is_unguarded(path: &str) -> bool {
    UNGUARDED_PREFIXES
        .iter()
        .any(|prefix| path == *prefix || path.starts_with(&format!("{}/", prefix)))
}

pub fn decide(settings: &GuardSettings, path: &str, has_session: bool) -> GuardDecision {
    if is_unguarded(path) {
        return GuardDecision::Pass;
    }
    let on_login = path.starts_with(settings.login_path.as_str());
    match (has_session, on_login) {
        (false, false) => GuardDecision::RedirectToLogin,
        (true, true) => GuardDecision::RedirectHome,
        _ => GuardDecision::Pass,
    }
}

/// Axum middleware applying [`decide`] to every request.
pub async fn session_guard(
    State(settings): State<Arc<GuardSettings>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let has_session = session_token(request.headers(), &settings.session_cookie).is_some();

    match decide(&settings, &path, has_session) {
        GuardDecision::Pass => next.run(request).await,
        GuardDecision::RedirectToLogin => {
            debug!("No session for {}, redirecting to {}", path, settings.login_path);
            Redirect::temporary(&settings.login_path).into_response()
        }
        GuardDecision::RedirectHome => Redirect::temporary(&settings.home_path).into_response(),
    }
}
