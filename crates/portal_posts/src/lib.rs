// --- File: crates/portal_posts/src/lib.rs ---
pub mod doc;
pub mod handlers;
pub mod routes;

pub use handlers::PostsState;
pub use routes::routes;

#[cfg(feature = "openapi")]
pub mod openapi {
    pub use crate::doc::PostsApiDoc;
}
