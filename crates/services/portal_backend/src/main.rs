// File: crates/services/portal_backend/src/main.rs
use portal_backend::{build_app, AppState};
use portal_common::logging;
use portal_config::load_config;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let _log_guard = logging::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{}", message);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), String> {
    let config = Arc::new(load_config().map_err(|e| format!("Failed to load config: {}", e))?);

    let state = AppState::new(config.clone())
        .await
        .map_err(|e| format!("Failed to initialize services: {}", e))?;
    let app = build_app(&state).map_err(|e| format!("Failed to build routes: {}", e))?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Cannot bind {}: {}", addr, e))?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(|e| format!("Server error: {}", e))
}
