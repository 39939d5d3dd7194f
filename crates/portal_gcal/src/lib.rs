// --- File: crates/portal_gcal/src/lib.rs ---
// Declare modules within this crate
pub mod auth;
pub mod booking;
pub mod doc;
pub mod handlers;
pub mod logic;
#[cfg(test)]
mod logic_proptest;
#[cfg(test)]
mod logic_test;
pub mod mock;
pub mod routes;
pub mod service;

pub use handlers::GcalState;
pub use logic::BookingSettings;
pub use mock::InMemoryCalendarService;
pub use routes::routes;
pub use service::{GcalServiceError, GoogleCalendarService};

#[cfg(feature = "openapi")]
pub mod openapi {
    pub use crate::doc::GcalApiDoc;
}
