// --- File: crates/services/portal_backend/src/service_factory.rs ---
//! Service factory implementation.
//!
//! Picks the production calendar and identity services when their
//! configuration sections are complete and in-process stand-ins otherwise, so
//! the service starts on a bare checkout.
use portal_common::error::PortalError;
use portal_common::services::{
    DynCalendarService, IdentityAdmin, PortalCalendar, ServiceFactory, TokenVerifier,
};
use portal_common::StaticTokenVerifier;
use portal_config::{AppConfig, FirebaseConfig, GcalConfig};
use portal_firebase::{FirebaseAdminClient, FirebaseTokenVerifier, InMemoryIdentityAdmin};
use portal_gcal::{auth::create_calendar_hub, GoogleCalendarService, InMemoryCalendarService};
use std::sync::Arc;
use tracing::{info, warn};

/// External services shared by every router.
pub struct PortalServiceFactory {
    calendar_service: Arc<DynCalendarService>,
    token_verifier: Arc<dyn TokenVerifier>,
    identity_admin: Arc<dyn IdentityAdmin>,
}

fn is_set(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

impl PortalServiceFactory {
    /// Create the services described by `config`.
    ///
    /// A section that is present but unusable (unreadable key file, bad
    /// credentials) is an error rather than a silent fallback.
    pub async fn new(config: &AppConfig) -> Result<Self, PortalError> {
        Ok(Self {
            calendar_service: calendar_service(config.gcal.as_ref()).await?,
            token_verifier: token_verifier(config.firebase.as_ref())?,
            identity_admin: identity_admin(config.firebase.as_ref()).await?,
        })
    }

    /// Assemble a factory from ready-made services.
    pub fn from_services(
        calendar_service: Arc<DynCalendarService>,
        token_verifier: Arc<dyn TokenVerifier>,
        identity_admin: Arc<dyn IdentityAdmin>,
    ) -> Self {
        Self {
            calendar_service,
            token_verifier,
            identity_admin,
        }
    }
}

async fn calendar_service(
    gcal: Option<&GcalConfig>,
) -> Result<Arc<DynCalendarService>, PortalError> {
    match gcal.filter(|c| is_set(c.key_path.as_ref())) {
        Some(gcal) => {
            info!("Initializing Google Calendar service...");
            let hub = create_calendar_hub(gcal).await?;
            let service = GoogleCalendarService::new(Arc::new(hub));
            info!("Google Calendar service initialized.");
            Ok(Arc::new(PortalCalendar(service)))
        }
        None => {
            warn!("gcal.key_path not configured, bookings are kept in an in-memory calendar");
            Ok(Arc::new(InMemoryCalendarService::new()))
        }
    }
}

fn token_verifier(
    firebase: Option<&FirebaseConfig>,
) -> Result<Arc<dyn TokenVerifier>, PortalError> {
    match firebase.filter(|c| is_set(c.project_id.as_ref())) {
        Some(firebase) => {
            let verifier = FirebaseTokenVerifier::from_config(firebase)?;
            info!("ID tokens are verified for the configured identity project.");
            Ok(Arc::new(verifier))
        }
        None => {
            warn!("firebase.project_id not configured, every authenticated request is rejected");
            Ok(Arc::new(StaticTokenVerifier::new()))
        }
    }
}

async fn identity_admin(
    firebase: Option<&FirebaseConfig>,
) -> Result<Arc<dyn IdentityAdmin>, PortalError> {
    match firebase.filter(|c| is_set(c.project_id.as_ref()) && is_set(c.key_path.as_ref())) {
        Some(firebase) => {
            let client = FirebaseAdminClient::from_config(firebase).await?;
            info!("Identity admin client initialized.");
            Ok(Arc::new(client))
        }
        None => {
            warn!("firebase.key_path not configured, user administration uses an empty in-memory directory");
            Ok(Arc::new(InMemoryIdentityAdmin::new()))
        }
    }
}

impl ServiceFactory for PortalServiceFactory {
    fn calendar_service(&self) -> Arc<DynCalendarService> {
        self.calendar_service.clone()
    }

    fn token_verifier(&self) -> Arc<dyn TokenVerifier> {
        self.token_verifier.clone()
    }

    fn identity_admin(&self) -> Arc<dyn IdentityAdmin> {
        self.identity_admin.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn bare_configuration_falls_back_to_in_process_services() {
        let factory = PortalServiceFactory::new(&AppConfig::default()).await.unwrap();

        let now = Utc::now();
        let events = factory
            .calendar_service()
            .list_events("primary", now, now + Duration::days(1))
            .await
            .unwrap();
        assert!(events.is_empty());

        assert!(factory.identity_admin().list_users(10).await.unwrap().is_empty());
        assert!(matches!(
            factory.token_verifier().verify("any-token").await,
            Err(PortalError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn unreadable_calendar_key_is_a_startup_error() {
        let config = AppConfig {
            gcal: Some(GcalConfig {
                key_path: Some("/nonexistent/portal-sat-key.json".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            PortalServiceFactory::new(&config).await,
            Err(PortalError::ConfigError(_))
        ));
    }
}
