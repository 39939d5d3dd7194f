//! HTTP handlers for user administration
//!
//! This module provides the admin panel endpoints that list portal accounts
//! and change their role. Both require an administrator; the role is stored
//! as the `role` custom claim of the account and reaches the user's session
//! the next time an ID token is issued, which is why a role change also
//! revokes the account's refresh tokens.
//!
//! The handlers are designed to be used with the Axum web framework and include
//! OpenAPI documentation when the `openapi` feature is enabled.

use axum::{
    extract::{rejection::JsonRejection, FromRef, Json, State},
    response::IntoResponse,
};
use portal_common::auth::{AdminUser, Authenticator};
use portal_common::error::{validation_error, PortalError};
use portal_common::models::{Role, UserRecord};
use portal_common::services::IdentityAdmin;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Upper bound on the accounts returned by the listing.
pub const MAX_LISTED_USERS: usize = 1000;

/// Shared state for the user administration handlers
#[derive(Clone)]
pub struct FirebaseState {
    /// Account directory of the identity platform
    pub admin: Arc<dyn IdentityAdmin>,

    /// Resolves the caller of each request
    pub auth: Authenticator,
}

impl FromRef<FirebaseState> for Authenticator {
    fn from_ref(state: &FirebaseState) -> Self {
        state.auth.clone()
    }
}

/// Response body of the user listing
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UsersResponse {
    pub users: Vec<UserRecord>,
}

/// Request body for changing a user's role
///
/// `role` is kept as free text so that an unknown value is reported as a
/// validation error rather than a deserialization failure.
#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct UpdateRoleRequest {
    /// Identity platform user id
    pub uid: String,

    /// `admin` or `user`
    pub role: String,
}

/// Response body of a role change
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateRoleResponse {
    pub success: bool,
    pub message: String,
}

/// Handler that lists the portal accounts
///
/// # Returns
///
/// Up to [`MAX_LISTED_USERS`] accounts with their role, defaulting to `user`
/// for accounts that never received a role claim.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "Portal accounts", body = UsersResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Administrator role required"),
        (status = 500, description = "Identity platform failure")
    ),
    security(("bearer" = [])),
    tag = "Admin"
))]
pub async fn list_users_handler(
    State(state): State<FirebaseState>,
    AdminUser(_caller): AdminUser,
) -> Result<Json<UsersResponse>, PortalError> {
    let users = state.admin.list_users(MAX_LISTED_USERS).await?;
    Ok(Json(UsersResponse { users }))
}

/// Handler that changes the role of one account
///
/// The role claim is written first. Refresh token revocation afterwards is
/// best effort: a failure is logged and the request still succeeds.
///
/// # Errors
///
/// * 400 when `uid` is empty or `role` is neither `admin` nor `user`
/// * 404 when the identity platform does not know `uid`
#[cfg_attr(feature = "openapi", utoipa::path(
    patch,
    path = "/admin/users",
    request_body(content = UpdateRoleRequest, example = json!({
        "uid": "Vx2PqL0aT1",
        "role": "admin"
    })),
    responses(
        (status = 200, description = "Role updated", body = UpdateRoleResponse),
        (status = 400, description = "Missing uid or unknown role"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Unknown user")
    ),
    security(("bearer" = [])),
    tag = "Admin"
))]
pub async fn update_role_handler(
    State(state): State<FirebaseState>,
    AdminUser(caller): AdminUser,
    payload: Result<Json<UpdateRoleRequest>, JsonRejection>,
) -> Result<impl IntoResponse, PortalError> {
    let Json(request) = payload?;
    let uid = request.uid.trim();
    if uid.is_empty() {
        return Err(validation_error("uid is required"));
    }
    let role: Role = request
        .role
        .trim()
        .parse()
        .map_err(|_| validation_error("role must be 'admin' or 'user'"))?;

    state.admin.set_role(uid, role).await?;
    info!("{} set role of {} to {}", caller.subject, uid, role);

    if let Err(e) = state.admin.revoke_refresh_tokens(uid).await {
        warn!("Could not revoke refresh tokens of {}: {}", uid, e);
    }

    Ok(Json(UpdateRoleResponse {
        success: true,
        message: "User role updated successfully".to_string(),
    }))
}
