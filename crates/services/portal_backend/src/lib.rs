// --- File: crates/services/portal_backend/src/lib.rs ---
//! The Portal SAT service: every feature router nested under `/api`, the
//! session-guarded portal pages and, with the `openapi` feature, Swagger UI.

pub mod app;
pub mod app_state;
pub mod doc;
pub mod guard;
pub mod service_factory;

pub use app::build_app;
pub use app_state::AppState;
pub use service_factory::PortalServiceFactory;
