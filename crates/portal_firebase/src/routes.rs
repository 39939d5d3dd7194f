// --- File: crates/portal_firebase/src/routes.rs ---

use axum::{routing::get, Router};

use crate::handlers::{list_users_handler, update_role_handler, FirebaseState};

/// Creates the user administration router. Paths are relative to `/api`.
pub fn routes(state: FirebaseState) -> Router {
    Router::new()
        .route(
            "/admin/users",
            get(list_users_handler).patch(update_role_handler),
        )
        .with_state(state)
}
