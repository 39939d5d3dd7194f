//! ID token verification
//!
//! Portal pages and API calls carry an identity platform ID token, either as a
//! bearer token or in the session cookie. [`FirebaseTokenVerifier`] checks the
//! RS256 signature against the platform's published signing keys and validates
//! the audience, the issuer and the expiry. The `role` custom claim becomes the
//! caller's [`Role`].
//!
//! Signing keys rotate. They are cached for [`DEFAULT_KEY_TTL`] and fetched
//! again early when a token names a key id the cache does not know.

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use portal_common::auth::AuthUser;
use portal_common::error::{unauthorized, upstream_failure, PortalError};
use portal_common::models::Role;
use portal_common::services::{BoxFuture, TokenVerifier};
use portal_common::HTTP_CLIENT;
use portal_config::FirebaseConfig;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::client::FirebaseError;

/// Public keys used to sign ID tokens, in JWK form.
pub const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

pub const DEFAULT_KEY_TTL: Duration = Duration::from_secs(60 * 60);

const ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// Claims read from a verified ID token.
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
}

/// Verifies identity platform ID tokens for one project.
pub struct FirebaseTokenVerifier {
    client: Client,
    project_id: String,
    jwks_url: String,
    key_ttl: Duration,
    cache: RwLock<Option<CachedKeys>>,
}

impl FirebaseTokenVerifier {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            client: HTTP_CLIENT.clone(),
            project_id: project_id.into(),
            jwks_url: DEFAULT_JWKS_URL.to_string(),
            key_ttl: DEFAULT_KEY_TTL,
            cache: RwLock::new(None),
        }
    }

    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = url.into();
        self
    }

    pub fn with_key_ttl(mut self, ttl: Duration) -> Self {
        self.key_ttl = ttl;
        self
    }

    pub fn from_config(config: &FirebaseConfig) -> Result<Self, FirebaseError> {
        let project_id = config
            .project_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| FirebaseError::ConfigError("Missing firebase.project_id".to_string()))?;
        let verifier = Self::new(project_id);
        Ok(match config.jwks_url.as_deref() {
            Some(url) => verifier.with_jwks_url(url),
            None => verifier,
        })
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[format!("{}{}", ISSUER_PREFIX, self.project_id)]);
        validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);
        validation
    }

    async fn fetch_keys(&self) -> Result<JwkSet, FirebaseError> {
        let response = self.client.get(&self.jwks_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FirebaseError::ApiError {
                status: status.as_u16(),
                message: format!("Signing key endpoint returned {}", status),
            });
        }
        Ok(response.json::<JwkSet>().await?)
    }

    /// Returns the decoding key for `kid`, refreshing the key set when it is
    /// stale or does not contain `kid`.
    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, PortalError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.fetched_at.elapsed() < self.key_ttl {
                    if let Some(jwk) = cached.keys.find(kid) {
                        return DecodingKey::from_jwk(jwk)
                            .map_err(|e| unauthorized(format!("Unusable signing key: {}", e)));
                    }
                }
            }
        }

        let mut cache = self.cache.write().await;
        let keys = self
            .fetch_keys()
            .await
            .map_err(|e| upstream_failure("identity", e))?;
        info!("Fetched {} identity signing keys", keys.keys.len());
        let key = keys
            .find(kid)
            .map(DecodingKey::from_jwk)
            .transpose()
            .map_err(|e| unauthorized(format!("Unusable signing key: {}", e)))?;
        *cache = Some(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });
        key.ok_or_else(|| {
            warn!("ID token signed with unknown key {}", kid);
            unauthorized("Invalid or expired token")
        })
    }

    /// Verifies `token` and returns the caller it identifies.
    pub async fn verify_id_token(&self, token: &str) -> Result<AuthUser, PortalError> {
        let header = decode_header(token).map_err(|_| unauthorized("Malformed token"))?;
        let kid = header
            .kid
            .ok_or_else(|| unauthorized("Token has no key id"))?;
        let key = self.decoding_key(&kid).await?;

        let data = decode::<IdTokenClaims>(token, &key, &self.validation()).map_err(|e| {
            debug!("Rejected ID token: {}", e);
            unauthorized("Invalid or expired token")
        })?;
        let claims = data.claims;
        if claims.sub.trim().is_empty() {
            return Err(unauthorized("Invalid or expired token"));
        }

        Ok(AuthUser {
            subject: claims.sub,
            email: claims.email,
            role: Role::from_claim(claims.role.as_deref()),
        })
    }
}

impl TokenVerifier for FirebaseTokenVerifier {
    fn verify(&self, token: &str) -> BoxFuture<'_, AuthUser, PortalError> {
        let token = token.to_string();
        Box::pin(async move { self.verify_id_token(&token).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_pins_project_audience_and_issuer() {
        let verifier = FirebaseTokenVerifier::new("portal-sat");
        let validation = verifier.validation();
        assert_eq!(validation.algorithms, vec![Algorithm::RS256]);
        assert!(validation
            .iss
            .as_ref()
            .is_some_and(|iss| iss.contains("https://securetoken.google.com/portal-sat")));
        assert!(validation
            .aud
            .as_ref()
            .is_some_and(|aud| aud.contains("portal-sat")));
    }

    #[test]
    fn config_without_project_is_rejected() {
        let err = FirebaseTokenVerifier::from_config(&FirebaseConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, FirebaseError::ConfigError(_)));
    }

    #[tokio::test]
    async fn garbage_tokens_are_unauthorized_without_fetching_keys() {
        let verifier =
            FirebaseTokenVerifier::new("portal-sat").with_jwks_url("http://127.0.0.1:9/keys");
        let err = verifier.verify_id_token("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, PortalError::Unauthorized(_)));
    }
}
