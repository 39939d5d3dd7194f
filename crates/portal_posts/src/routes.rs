// --- File: crates/portal_posts/src/routes.rs ---

use axum::{
    routing::{delete, get},
    Router,
};

use crate::handlers::{create_post_handler, delete_post_handler, list_posts_handler, PostsState};

/// Creates the posts router. Paths are relative to `/api`.
pub fn routes(state: PostsState) -> Router {
    Router::new()
        .route("/posts", get(list_posts_handler).post(create_post_handler))
        .route("/posts/{id}", delete(delete_post_handler))
        .with_state(state)
}
