//! Identity Toolkit admin client
//!
//! This module provides a client for the account administration endpoints of
//! the identity platform's REST API (Identity Toolkit v1). It lists portal
//! accounts, stores the `role` custom claim and revokes refresh tokens so that
//! a changed role reaches the user's next ID token.
//!
//! The main component is [`FirebaseAdminClient`], which implements
//! [`IdentityAdmin`] from `portal_common`.

use chrono::{DateTime, Utc};
use portal_common::error::{not_found, upstream_failure, PortalError};
use portal_common::models::{Role, UserRecord};
use portal_common::services::{BoxFuture, IdentityAdmin};
use portal_common::time::to_storage;
use portal_common::HTTP_CLIENT;
use portal_config::FirebaseConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::auth::{service_account_token_source, AccessTokenSource};

/// Default Identity Toolkit endpoint.
pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Errors that can occur when talking to the identity platform
#[derive(Error, Debug)]
pub enum FirebaseError {
    /// Error while obtaining an access token
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error during HTTP request to the identity API
    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Missing required configuration
    #[error("Missing configuration: {0}")]
    ConfigError(String),

    /// Non-success answer from the identity API
    #[error("Identity API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// The addressed account does not exist
    #[error("User not found: {0}")]
    UserNotFound(String),
}

impl From<FirebaseError> for PortalError {
    fn from(err: FirebaseError) -> Self {
        match err {
            FirebaseError::UserNotFound(uid) => not_found(format!("User {} not found", uid)),
            FirebaseError::ConfigError(message) => PortalError::ConfigError(message),
            other => upstream_failure("identity", other),
        }
    }
}

/// An account as returned by `accounts:batchGet`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityAccount {
    local_id: String,
    email: Option<String>,
    /// JSON object encoded as a string, e.g. `{"role":"admin"}`.
    custom_attributes: Option<String>,
    /// Epoch milliseconds as a string.
    last_login_at: Option<String>,
    created_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BatchGetResponse {
    #[serde(default)]
    users: Vec<IdentityAccount>,
}

/// Body of `accounts:update`. Unset fields are left untouched by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountUpdate<'a> {
    local_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_attributes: Option<String>,
    /// Epoch seconds; tokens issued before it are rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    valid_since: Option<String>,
}

fn millis_to_string(millis: Option<&str>) -> Option<String> {
    let millis = millis?.parse::<i64>().ok()?;
    DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| to_storage(&dt))
}

impl From<IdentityAccount> for UserRecord {
    fn from(account: IdentityAccount) -> Self {
        let role_claim = account
            .custom_attributes
            .as_deref()
            .and_then(|attrs| serde_json::from_str::<Value>(attrs).ok())
            .and_then(|attrs| attrs.get("role").and_then(Value::as_str).map(str::to_string));
        UserRecord {
            uid: account.local_id,
            email: account.email,
            role: Role::from_claim(role_claim.as_deref()),
            last_sign_in_time: millis_to_string(account.last_login_at.as_deref()),
            creation_time: millis_to_string(account.created_at.as_deref()),
        }
    }
}

/// Client for the identity platform's account administration API
pub struct FirebaseAdminClient {
    /// HTTP client for making requests to the identity API
    client: Client,

    base_url: String,

    project_id: String,

    /// Source of the OAuth2 bearer token sent with each request
    tokens: Arc<dyn AccessTokenSource>,
}

impl FirebaseAdminClient {
    /// Creates a client for `project_id` using the shared HTTP client.
    pub fn new(project_id: impl Into<String>, tokens: Arc<dyn AccessTokenSource>) -> Self {
        Self {
            client: HTTP_CLIENT.clone(),
            base_url: DEFAULT_IDENTITY_BASE_URL.to_string(),
            project_id: project_id.into(),
            tokens,
        }
    }

    /// Points the client at another endpoint (emulator, test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builds the client from `[firebase]`, authenticating with the service account key.
    pub async fn from_config(config: &FirebaseConfig) -> Result<Self, FirebaseError> {
        let project_id = config
            .project_id
            .clone()
            .ok_or_else(|| FirebaseError::ConfigError("Missing firebase.project_id".to_string()))?;
        let tokens = service_account_token_source(config).await?;
        let client = Self::new(project_id, tokens);
        Ok(match config.identity_base_url.as_deref() {
            Some(url) => client.with_base_url(url),
            None => client,
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/projects/{}/{}", self.base_url, self.project_id, method)
    }

    /// Turns a non-success response into a `FirebaseError`.
    async fn check(response: reqwest::Response, uid: Option<&str>) -> Result<reqwest::Response, FirebaseError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(body);
        if let Some(uid) = uid {
            if message.starts_with("USER_NOT_FOUND") || status.as_u16() == 404 {
                return Err(FirebaseError::UserNotFound(uid.to_string()));
            }
        }
        Err(FirebaseError::ApiError {
            status: status.as_u16(),
            message,
        })
    }

    /// Fetches up to `max_results` accounts.
    pub async fn batch_get(&self, max_results: usize) -> Result<Vec<UserRecord>, FirebaseError> {
        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .get(self.url("accounts:batchGet"))
            .bearer_auth(token)
            .query(&[("maxResults", max_results.to_string())])
            .send()
            .await?;
        let page: BatchGetResponse = Self::check(response, None).await?.json().await?;
        debug!("Identity API returned {} accounts", page.users.len());
        Ok(page.users.into_iter().map(UserRecord::from).collect())
    }

    async fn update_account(&self, update: AccountUpdate<'_>) -> Result<(), FirebaseError> {
        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .post(self.url("accounts:update"))
            .bearer_auth(token)
            .json(&update)
            .send()
            .await?;
        Self::check(response, Some(update.local_id)).await?;
        Ok(())
    }

    /// Replaces the account's custom claims with `{"role": role}`.
    pub async fn set_custom_role(&self, uid: &str, role: Role) -> Result<(), FirebaseError> {
        let claims = serde_json::json!({ "role": role.as_str() }).to_string();
        self.update_account(AccountUpdate {
            local_id: uid,
            custom_attributes: Some(claims),
            valid_since: None,
        })
        .await?;
        info!("Set role {} on account {}", role, uid);
        Ok(())
    }

    /// Invalidates every refresh token issued to the account so far.
    pub async fn revoke_tokens(&self, uid: &str) -> Result<(), FirebaseError> {
        self.update_account(AccountUpdate {
            local_id: uid,
            custom_attributes: None,
            valid_since: Some(Utc::now().timestamp().to_string()),
        })
        .await
    }
}

impl IdentityAdmin for FirebaseAdminClient {
    fn list_users(&self, max_results: usize) -> BoxFuture<'_, Vec<UserRecord>, PortalError> {
        Box::pin(async move { Ok(self.batch_get(max_results).await?) })
    }

    fn set_role(&self, uid: &str, role: Role) -> BoxFuture<'_, (), PortalError> {
        let uid = uid.to_string();
        Box::pin(async move { Ok(self.set_custom_role(&uid, role).await?) })
    }

    fn revoke_refresh_tokens(&self, uid: &str) -> BoxFuture<'_, (), PortalError> {
        let uid = uid.to_string();
        Box::pin(async move { Ok(self.revoke_tokens(&uid).await?) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accounts_map_to_user_records() {
        let account: IdentityAccount = serde_json::from_value(serde_json::json!({
            "localId": "u1",
            "email": "marta@example.com",
            "customAttributes": "{\"role\":\"admin\"}",
            "lastLoginAt": "1749538800000",
            "createdAt": "not-a-number"
        }))
        .unwrap();
        let user = UserRecord::from(account);
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.last_sign_in_time.as_deref(), Some("2025-06-10T07:00:00.000Z"));
        assert_eq!(user.creation_time, None);

        let bare: IdentityAccount =
            serde_json::from_value(serde_json::json!({"localId": "u2"})).unwrap();
        assert_eq!(UserRecord::from(bare).role, Role::User);
    }

    #[test]
    fn unknown_user_maps_to_not_found() {
        let err: PortalError = FirebaseError::UserNotFound("u9".into()).into();
        assert!(matches!(err, PortalError::NotFound(_)));
        let err: PortalError = FirebaseError::ApiError {
            status: 403,
            message: "PERMISSION_DENIED".into(),
        }
        .into();
        assert!(matches!(err, PortalError::UpstreamFailure { .. }));
    }
}
