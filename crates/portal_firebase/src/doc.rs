// --- File: crates/portal_firebase/src/doc.rs ---
#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::handlers::{UpdateRoleRequest, UpdateRoleResponse, UsersResponse};
use portal_common::models::{Role, UserRecord};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::list_users_handler,
        crate::handlers::update_role_handler
    ),
    components(
        schemas(Role, UserRecord, UsersResponse, UpdateRoleRequest, UpdateRoleResponse)
    ),
    tags(
        (name = "Admin", description = "Portal accounts and roles")
    )
)]
pub struct FirebaseApiDoc;
