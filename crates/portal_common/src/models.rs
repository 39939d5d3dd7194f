// --- File: crates/portal_common/src/models.rs ---

// Records owned by the portal (bookings, tasks, technicians, posts) and the
// identity-side user view. Field names serialize in camelCase, which is what
// the portal front end reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Authorization attribute carried in the identity token's `role` claim.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    /// Missing or unknown claims fall back to `user`.
    pub fn from_claim(claim: Option<&str>) -> Self {
        claim.and_then(|c| c.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Created,
    #[default]
    Confirmed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Created => "created",
            BookingStatus::Confirmed => "confirmed",
        }
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(BookingStatus::Created),
            "confirmed" => Ok(BookingStatus::Confirmed),
            other => Err(format!("unknown booking status '{}'", other)),
        }
    }
}

/// A customer reservation, mirrored from its calendar event.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub google_event_id: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub description: String,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub technician_id: Option<String>,
    pub technician_name: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when a booking record is written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub google_event_id: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub description: String,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub status: BookingStatus,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Technician {
    pub id: String,
    pub name: String,
    pub city: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTechnician {
    pub name: String,
    pub city: String,
}

/// Internally scheduled, technician-assigned work.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub technician_id: String,
    pub technician_name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub description: String,
    pub address: String,
    pub links: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Validated task fields, used for both creation and replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub technician_id: String,
    pub technician_name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub description: String,
    pub address: String,
    pub links: Vec<String>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PostCategory {
    Urgente,
    NuevaHerramienta,
    Reforma,
    Mantenimiento,
    General,
}

impl PostCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostCategory::Urgente => "urgente",
            PostCategory::NuevaHerramienta => "nueva-herramienta",
            PostCategory::Reforma => "reforma",
            PostCategory::Mantenimiento => "mantenimiento",
            PostCategory::General => "general",
        }
    }
}

impl FromStr for PostCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "urgente" => Ok(PostCategory::Urgente),
            "nueva-herramienta" => Ok(PostCategory::NuevaHerramienta),
            "reforma" => Ok(PostCategory::Reforma),
            "mantenimiento" => Ok(PostCategory::Mantenimiento),
            "general" => Ok(PostCategory::General),
            other => Err(format!("unknown post category '{}'", other)),
        }
    }
}

/// A time-limited announcement.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: PostCategory,
    pub author: String,
    pub author_email: String,
    pub image_url: Option<String>,
    /// Lifetime in days.
    pub duration: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category: PostCategory,
    pub author: String,
    pub author_email: String,
    pub image_url: Option<String>,
    pub duration: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A portal account as shown in the admin panel.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub uid: String,
    pub email: Option<String>,
    pub role: Role,
    pub last_sign_in_time: Option<String>,
    pub creation_time: Option<String>,
}
