// --- File: crates/portal_posts/src/doc.rs ---
#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::handlers::PostRequest;
use portal_common::models::{Post, PostCategory};
use portal_common::{CreatedResponse, MessageResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::list_posts_handler,
        crate::handlers::create_post_handler,
        crate::handlers::delete_post_handler
    ),
    components(schemas(Post, PostCategory, PostRequest, CreatedResponse, MessageResponse)),
    tags(
        (name = "Posts", description = "Time-limited announcements")
    )
)]
pub struct PostsApiDoc;
