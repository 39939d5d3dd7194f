//! OAuth2 access tokens for the identity admin API
//!
//! The admin endpoints of the identity platform are called with an OAuth2
//! access token obtained from a service account key. The key path comes from
//! `firebase.key_path`.

use hyper_util::client::legacy::connect::Connect;
use portal_common::services::BoxFuture;
use portal_config::FirebaseConfig;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use yup_oauth2::authenticator::Authenticator;
use yup_oauth2::{read_service_account_key, ServiceAccountAuthenticator};

use crate::client::FirebaseError;

/// Scopes requested for Identity Toolkit administration.
pub const IDENTITY_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/cloud-platform",
    "https://www.googleapis.com/auth/identitytoolkit",
];

/// Something that can hand out a bearer token for the identity admin API.
pub trait AccessTokenSource: Send + Sync {
    fn access_token(&self) -> BoxFuture<'_, String, FirebaseError>;
}

/// Tokens minted from a service account. The authenticator caches and
/// refreshes them.
struct ServiceAccountTokenSource<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    auth: Authenticator<C>,
}

impl<C> AccessTokenSource for ServiceAccountTokenSource<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    fn access_token(&self) -> BoxFuture<'_, String, FirebaseError> {
        Box::pin(async move {
            let token = self
                .auth
                .token(IDENTITY_SCOPES)
                .await
                .map_err(|e| FirebaseError::AuthError(e.to_string()))?;
            token
                .token()
                .map(str::to_string)
                .ok_or_else(|| FirebaseError::AuthError("No token available".to_string()))
        })
    }
}

/// Builds a token source from the service account key named in `config`.
///
/// # Errors
///
/// Returns a `FirebaseError` if:
/// * `key_path` is missing from the configuration
/// * the key file cannot be read
/// * the authenticator cannot be built
pub async fn service_account_token_source(
    config: &FirebaseConfig,
) -> Result<Arc<dyn AccessTokenSource>, FirebaseError> {
    let key_path = config
        .key_path
        .as_deref()
        .ok_or_else(|| FirebaseError::ConfigError("Missing firebase.key_path".to_string()))?;

    let sa_key = read_service_account_key(Path::new(key_path))
        .await
        .map_err(|e| FirebaseError::ConfigError(format!("Cannot read {}: {}", key_path, e)))?;

    let auth = ServiceAccountAuthenticator::builder(sa_key)
        .build()
        .await
        .map_err(|e| FirebaseError::AuthError(e.to_string()))?;

    info!("Identity admin credentials loaded from {}", key_path);
    Ok(Arc::new(ServiceAccountTokenSource { auth }))
}

/// A fixed bearer token, for emulators and tests.
#[derive(Debug, Clone)]
pub struct FixedAccessToken(pub String);

impl AccessTokenSource for FixedAccessToken {
    fn access_token(&self) -> BoxFuture<'_, String, FirebaseError> {
        let token = self.0.clone();
        Box::pin(async move { Ok(token) })
    }
}
