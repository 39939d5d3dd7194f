//! Logging bootstrap for the portal services.
//!
//! Installs a `tracing` subscriber with an `EnvFilter` (honours `RUST_LOG`) and a
//! console formatter. Setting `PORTAL_LOG_DIR` adds a daily-rolling log file.

use std::env;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Crate targets raised to the requested level.
const PORTAL_TARGETS: &[&str] = &[
    "portal_backend",
    "portal_common",
    "portal_config",
    "portal_db",
    "portal_firebase",
    "portal_gcal",
    "portal_posts",
    "portal_schedule",
];

/// Initialize the tracing subscriber at INFO.
///
/// Keep the returned guard alive for the lifetime of the process when file
/// logging is enabled, otherwise buffered lines are lost on exit.
///
/// ```
/// use portal_common::logging;
///
/// let _guard = logging::init();
/// ```
pub fn init() -> Option<WorkerGuard> {
    init_with_level(Level::INFO)
}

/// Initialize the tracing subscriber with a specific log level for the portal crates.
pub fn init_with_level(level: Level) -> Option<WorkerGuard> {
    let mut filter = EnvFilter::from_default_env();
    for target in PORTAL_TARGETS {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    let (file_layer, guard) = match env::var("PORTAL_LOG_DIR") {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "portal.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    // try_init: a subscriber may already be installed (tests, embedding)
    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true),
        )
        .with(file_layer)
        .with(filter)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
    guard
}
