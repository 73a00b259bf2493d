//! Reporting API endpoints (visitor counts and reports)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::reporting::{
        ManualReporting, ReportingEntry, SubmitReporting, UpdateReporting, VisitorReportQuery, VisitorReportRow,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Record the visitor count of an event.
///
/// Vacation, holiday and special annotations are detected from the calendar;
/// the submitted values are used where nothing is detected. A second
/// submission for the same event updates the latest entry.
#[utoipa::path(
    post,
    path = "/reporting",
    tag = "reporting",
    security(("bearer_auth" = [])),
    request_body = SubmitReporting,
    responses(
        (status = 200, description = "Stored entry", body = ReportingEntry),
        (status = 403, description = "Welcome or admin role required")
    )
)]
pub async fn submit_reporting(
    State(state): State<AppState>,
    AuthenticatedUser(claims, _): AuthenticatedUser,
    Json(data): Json<SubmitReporting>,
) -> AppResult<Json<ReportingEntry>> {
    claims.require_welcome()?;
    Ok(Json(state.services.reporting.submit_reporting(data).await?))
}

/// Add a free-form reporting row (event id defaults to 99)
#[utoipa::path(
    post,
    path = "/reporting/manual",
    tag = "reporting",
    security(("bearer_auth" = [])),
    request_body = ManualReporting,
    responses(
        (status = 200, description = "Created entry", body = ReportingEntry)
    )
)]
pub async fn submit_reporting_manual(
    State(state): State<AppState>,
    AuthenticatedUser(claims, _): AuthenticatedUser,
    Json(data): Json<ManualReporting>,
) -> AppResult<Json<ReportingEntry>> {
    claims.require_admin()?;
    Ok(Json(state.services.reporting.submit_reporting_manual(data).await?))
}

/// Reporting history of an event, newest first
#[utoipa::path(
    get,
    path = "/reporting/by-event/{event_id}",
    tag = "reporting",
    security(("bearer_auth" = [])),
    params(("event_id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Entries", body = Vec<ReportingEntry>)
    )
)]
pub async fn list_for_event(
    State(state): State<AppState>,
    AuthenticatedUser(_claims, _): AuthenticatedUser,
    Path(event_id): Path<i32>,
) -> AppResult<Json<Vec<ReportingEntry>>> {
    Ok(Json(state.services.reports.list_by_event(event_id).await?))
}

#[utoipa::path(
    put,
    path = "/reporting/{id}",
    tag = "reporting",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Reporting entry ID")),
    request_body = UpdateReporting,
    responses(
        (status = 200, description = "Updated entry", body = ReportingEntry),
        (status = 404, description = "Reporting entry not found")
    )
)]
pub async fn update_reporting(
    State(state): State<AppState>,
    AuthenticatedUser(claims, _): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateReporting>,
) -> AppResult<Json<ReportingEntry>> {
    claims.require_admin()?;
    Ok(Json(state.services.reports.update(id, data).await?))
}

#[utoipa::path(
    delete,
    path = "/reporting/{id}",
    tag = "reporting",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Reporting entry ID")),
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 404, description = "Reporting entry not found")
    )
)]
pub async fn delete_reporting(
    State(state): State<AppState>,
    AuthenticatedUser(claims, _): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;
    state.services.reports.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Visitor numbers per reporting entry
#[utoipa::path(
    get,
    path = "/reports/visitors-by-title",
    tag = "reporting",
    security(("bearer_auth" = [])),
    params(VisitorReportQuery),
    responses(
        (status = 200, description = "Report rows, newest first", body = Vec<VisitorReportRow>)
    )
)]
pub async fn visitors_by_title(
    State(state): State<AppState>,
    AuthenticatedUser(_claims, _): AuthenticatedUser,
    Query(query): Query<VisitorReportQuery>,
) -> AppResult<Json<Vec<VisitorReportRow>>> {
    Ok(Json(state.services.reports.visitors_by_title(&query).await?))
}
