// --- File: crates/portal_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8086,
        }
    }
}

// --- Database Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    /// sqlx connection URL, e.g. `sqlite:data/portal.db`. The value `memory`
    /// selects the in-process repositories.
    pub url: String,
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url.trim().eq_ignore_ascii_case("memory")
    }
}

// --- Google Calendar Config ---

/// Calendar used when `calendar_id` is unset or blank.
pub const DEFAULT_CALENDAR_ID: &str = "primary";

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GcalConfig {
    pub key_path: Option<String>,
    pub calendar_id: Option<String>,
    /// IANA zone used for working hours and for the events written to the calendar.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    #[serde(default = "default_work_start_hour")]
    pub work_start_hour: u32,
    #[serde(default = "default_work_end_hour")]
    pub work_end_hour: u32,
    #[serde(default = "default_slot_duration")]
    pub slot_duration_minutes: i64,
}

fn default_time_zone() -> String {
    "Europe/Madrid".to_string()
}

fn default_work_start_hour() -> u32 {
    9
}

fn default_work_end_hour() -> u32 {
    18
}

fn default_slot_duration() -> i64 {
    60
}

impl Default for GcalConfig {
    fn default() -> Self {
        Self {
            key_path: None,
            calendar_id: None,
            time_zone: default_time_zone(),
            work_start_hour: default_work_start_hour(),
            work_end_hour: default_work_end_hour(),
            slot_duration_minutes: default_slot_duration(),
        }
    }
}

impl GcalConfig {
    /// The configured calendar, or [`DEFAULT_CALENDAR_ID`].
    pub fn calendar_id_or_default(&self) -> String {
        self.calendar_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(DEFAULT_CALENDAR_ID)
            .to_string()
    }
}

// --- Firebase (identity platform) Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct FirebaseConfig {
    pub project_id: Option<String>,
    /// Service account key used for the identity admin API.
    pub key_path: Option<String>,
    /// Overrides the public key endpoint used to verify ID tokens.
    pub jwks_url: Option<String>,
    /// Overrides the Identity Toolkit base URL.
    pub identity_base_url: Option<String>,
}

// --- Portal pages / session guard ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PortalConfig {
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_home_path")]
    pub home_path: String,
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    pub static_dir: Option<String>,
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_home_path() -> String {
    "/".to_string()
}

fn default_session_cookie() -> String {
    "__session".to_string()
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            home_path: default_home_path(),
            session_cookie: default_session_cookie(),
            static_dir: None,
        }
    }
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub gcal: Option<GcalConfig>,
    #[serde(default)]
    pub firebase: Option<FirebaseConfig>,
    #[serde(default)]
    pub portal: PortalConfig,
}
