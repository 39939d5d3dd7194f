// --- File: crates/services/portal_backend/src/app_state.rs ---
use portal_common::error::PortalError;
use portal_common::services::ServiceFactory;
use portal_common::Authenticator;
use portal_config::AppConfig;
use portal_db::Repositories;
use portal_firebase::FirebaseState;
use portal_gcal::{BookingSettings, GcalState};
use portal_posts::PostsState;
use portal_schedule::{ScheduleSettings, ScheduleState};
use std::sync::Arc;
use tracing::warn;

use crate::service_factory::PortalServiceFactory;

/// Application state that is shared across all routes.
///
/// Each feature router gets its own state struct, carved out of this one by
/// the `*_state` methods.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub service_factory: Arc<dyn ServiceFactory>,
    pub repositories: Repositories,
    pub auth: Authenticator,
}

impl AppState {
    /// Build the services and repositories named in `config`.
    pub async fn new(config: Arc<AppConfig>) -> Result<Self, PortalError> {
        let service_factory = Arc::new(PortalServiceFactory::new(&config).await?);
        let repositories = match config.database.as_ref() {
            Some(database) => Repositories::from_config(database).await?,
            None => {
                warn!("No [database] section, records are kept in memory");
                Repositories::in_memory()
            }
        };
        Ok(Self::from_parts(config, service_factory, repositories))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        service_factory: Arc<dyn ServiceFactory>,
        repositories: Repositories,
    ) -> Self {
        let auth = Authenticator::new(service_factory.token_verifier())
            .with_session_cookie(&config.portal.session_cookie);
        Self {
            config,
            service_factory,
            repositories,
            auth,
        }
    }

    pub fn gcal_state(&self) -> Result<GcalState, PortalError> {
        let gcal = self.config.gcal.clone().unwrap_or_default();
        Ok(GcalState::new(
            BookingSettings::from_config(&gcal)?,
            self.service_factory.calendar_service(),
            self.repositories.bookings.clone(),
            self.auth.clone(),
        ))
    }

    pub fn schedule_state(&self) -> Result<ScheduleState, PortalError> {
        let gcal = self.config.gcal.clone().unwrap_or_default();
        Ok(ScheduleState {
            settings: Arc::new(ScheduleSettings::from_config(&gcal)?),
            technicians: self.repositories.technicians.clone(),
            tasks: self.repositories.tasks.clone(),
            calendar: self.service_factory.calendar_service(),
            auth: self.auth.clone(),
        })
    }

    pub fn firebase_state(&self) -> FirebaseState {
        FirebaseState {
            admin: self.service_factory.identity_admin(),
            auth: self.auth.clone(),
        }
    }

    pub fn posts_state(&self) -> PostsState {
        PostsState {
            posts: self.repositories.posts.clone(),
            auth: self.auth.clone(),
        }
    }
}
