//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, categories, events, health, nextcloud, planning_levels, reporting, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Events Planner API",
        version = "1.0.0",
        description = "Church events planning, visitor reporting and Nextcloud file sharing"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Events
        events::list_events,
        events::list_events_for_welcome,
        events::event_tree,
        events::get_event,
        events::create_event,
        events::update_event,
        events::delete_event,
        events::upload_attachment,
        // Categories
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        // Planning levels
        planning_levels::list_planning_levels,
        planning_levels::get_planning_level,
        planning_levels::create_planning_level,
        planning_levels::update_planning_level,
        planning_levels::delete_planning_level,
        // Reporting
        reporting::submit_reporting,
        reporting::submit_reporting_manual,
        reporting::list_for_event,
        reporting::update_reporting,
        reporting::delete_reporting,
        reporting::visitors_by_title,
        // Users
        users::list_users,
        users::create_user,
        users::update_user,
        // Nextcloud
        nextcloud::upload_sermon_series_attachment,
        nextcloud::copy_and_share,
        nextcloud::service_folder,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::TokenResponse,
            // Events
            crate::models::event::Event,
            crate::models::event::EventNode,
            crate::models::event::CreateEvent,
            crate::models::event::UpdateEvent,
            // Categories & planning levels
            crate::models::category::Category,
            crate::models::category::CategoryShort,
            crate::models::category::CategoryInput,
            crate::models::planning_level::PlanningLevel,
            crate::models::planning_level::PlanningLevelInput,
            // Reporting
            crate::models::reporting::ReportingEntry,
            crate::models::reporting::SubmitReporting,
            crate::models::reporting::ManualReporting,
            crate::models::reporting::UpdateReporting,
            crate::models::reporting::VisitorReportRow,
            // Users
            crate::models::user::User,
            crate::models::user::Role,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            // Nextcloud
            crate::models::nextcloud::ShareUrlResponse,
            crate::models::nextcloud::CopyAndShareRequest,
            crate::models::nextcloud::CopiedFile,
            crate::models::nextcloud::CopyAndShareResponse,
            crate::models::nextcloud::ServiceFolderRequest,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "events", description = "Event planning"),
        (name = "categories", description = "Event categories"),
        (name = "planning-levels", description = "Planning levels"),
        (name = "reporting", description = "Visitor reporting"),
        (name = "users", description = "User management"),
        (name = "nextcloud", description = "Nextcloud file sharing")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_auth_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/auth/login"));
        assert!(doc.paths.paths.contains_key("/auth/me"));
    }

    #[test]
    fn test_document_lists_reporting_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/reporting"));
        assert!(doc.paths.paths.contains_key("/reports/visitors-by-title"));
        assert!(doc
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer_auth")));
    }
}
