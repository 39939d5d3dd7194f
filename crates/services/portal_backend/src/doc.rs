// --- File: crates/services/portal_backend/src/doc.rs ---
#![cfg(feature = "openapi")]
use portal_firebase::openapi::FirebaseApiDoc;
use portal_gcal::openapi::GcalApiDoc;
use portal_posts::openapi::PostsApiDoc;
use portal_schedule::openapi::ScheduleApiDoc;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Portal SAT API",
        version = "0.1.0",
        description = "Bookings, technician schedule, announcements and user administration",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    modifiers(&BearerAuth),
    servers((url = "/api", description = "Main API Prefix")),
)]
pub struct PortalApiDoc;

/// The service document with every feature crate merged in.
pub fn api_doc() -> utoipa::openapi::OpenApi {
    let mut doc = PortalApiDoc::openapi();
    doc.merge(GcalApiDoc::openapi());
    doc.merge(ScheduleApiDoc::openapi());
    doc.merge(FirebaseApiDoc::openapi());
    doc.merge(PostsApiDoc::openapi());
    doc
}
