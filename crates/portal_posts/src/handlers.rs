// --- File: crates/portal_posts/src/handlers.rs ---
//! Announcement posts.
//!
//! Staff read the posts that have not expired yet; administrators publish
//! posts with a lifetime in days and can remove them early.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRef, Path, State,
    },
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Duration, Utc};
use portal_common::auth::{AdminUser, AuthUser, Authenticator};
use portal_common::error::{not_found, validation_error, PortalError};
use portal_common::models::{NewPost, Post, PostCategory};
use portal_common::{CreatedResponse, MessageResponse};
use portal_db::PostRepository;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Shared state of the post routes.
#[derive(Clone)]
pub struct PostsState {
    pub posts: Arc<dyn PostRepository>,
    pub auth: Authenticator,
}

impl FromRef<PostsState> for Authenticator {
    fn from_ref(state: &PostsState) -> Self {
        state.auth.clone()
    }
}

/// Body of `POST /posts`.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostRequest {
    pub title: String,
    pub content: String,
    /// `urgente`, `nueva-herramienta`, `reforma`, `mantenimiento` or `general`
    pub category: String,
    pub image_url: Option<String>,
    /// Lifetime in days, at least 1
    pub duration: Option<i64>,
}

impl PostRequest {
    /// Checks the fields and stamps author and expiry.
    pub fn into_new_post(
        self,
        author: &AuthUser,
        now: DateTime<Utc>,
    ) -> Result<NewPost, PortalError> {
        let title = self.title.trim();
        let content = self.content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(validation_error("title and content are required"));
        }
        let category: PostCategory = self.category.trim().parse().map_err(validation_error)?;
        let duration = self
            .duration
            .filter(|days| *days >= 1)
            .ok_or_else(|| validation_error("duration must be at least 1 day"))?;
        let expires_at = Duration::try_days(duration)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| validation_error("duration is too long"))?;

        let author_email = author.email.clone().unwrap_or_else(|| author.subject.clone());
        Ok(NewPost {
            title: title.to_string(),
            content: content.to_string(),
            category,
            author: author_email.clone(),
            author_email,
            image_url: self
                .image_url
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty()),
            duration,
            created_at: now,
            expires_at,
        })
    }
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/posts",
    responses(
        (status = 200, description = "Posts that have not expired, latest expiry first", body = [Post]),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = [])),
    tag = "Posts"
))]
pub async fn list_posts_handler(
    State(state): State<PostsState>,
    _user: AuthUser,
) -> Result<Json<Vec<Post>>, PortalError> {
    Ok(Json(state.posts.list_active(Utc::now()).await?))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/posts",
    request_body = PostRequest,
    responses(
        (status = 201, description = "Post published", body = CreatedResponse),
        (status = 400, description = "Missing fields, unknown category or duration below one day"),
        (status = 403, description = "Administrator role required")
    ),
    security(("bearer" = [])),
    tag = "Posts"
))]
pub async fn create_post_handler(
    State(state): State<PostsState>,
    AdminUser(caller): AdminUser,
    payload: Result<Json<PostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), PortalError> {
    let Json(request) = payload?;
    let new_post = request.into_new_post(&caller, Utc::now())?;
    let post = state.posts.create(new_post).await?;
    info!(
        "{} published post {} until {}",
        post.author, post.id, post.expires_at
    );

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id: post.id,
            message: "Post created successfully".to_string(),
        }),
    ))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/posts/{id}",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post deleted", body = MessageResponse),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Unknown post")
    ),
    security(("bearer" = [])),
    tag = "Posts"
))]
pub async fn delete_post_handler(
    State(state): State<PostsState>,
    AdminUser(caller): AdminUser,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<MessageResponse>, PortalError> {
    let Path(id) = id?;
    if !state.posts.delete(&id).await? {
        return Err(not_found("Post not found"));
    }
    info!("{} deleted post {}", caller.subject, id);
    Ok(Json(MessageResponse::new("Post deleted successfully")))
}
