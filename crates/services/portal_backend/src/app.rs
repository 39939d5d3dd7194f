// --- File: crates/services/portal_backend/src/app.rs ---
use axum::{http::StatusCode, middleware, routing::get, Router};
use portal_common::error::PortalError;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app_state::AppState;
use crate::guard::{session_guard, GuardSettings};

/// Assembles the API under `/api`, the guarded portal pages and, with the
/// `openapi` feature, Swagger UI at `/api/docs`.
pub fn build_app(state: &AppState) -> Result<Router, PortalError> {
    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to the Portal SAT API!" }))
        .merge(portal_gcal::routes(state.gcal_state()?))
        .merge(portal_schedule::routes(state.schedule_state()?))
        .merge(portal_firebase::routes(state.firebase_state()))
        .merge(portal_posts::routes(state.posts_state()));

    #[allow(unused_mut)] // only reassigned with the openapi feature
    let mut app = Router::new().nest("/api", api_router);

    #[cfg(feature = "openapi")]
    {
        use utoipa_swagger_ui::SwaggerUi;

        info!("Adding Swagger UI at /api/docs");
        app = app.merge(
            SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", crate::doc::api_doc()),
        );
    }

    let app = match state.config.portal.static_dir.as_deref() {
        Some(dir) => {
            info!("Serving portal pages from {}", dir);
            app.fallback_service(ServeDir::new(dir))
        }
        None => app.fallback(|| async { StatusCode::NOT_FOUND }),
    };

    let guard = Arc::new(GuardSettings::from_config(&state.config.portal));
    Ok(app
        .layer(middleware::from_fn_with_state(guard, session_guard))
        .layer(TraceLayer::new_for_http()))
}
