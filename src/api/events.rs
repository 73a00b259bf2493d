//! Events API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Multipart;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::event::{CreateEvent, Event, EventNode, UpdateEvent},
    AppState,
};

use super::AuthenticatedUser;

/// List all events
#[utoipa::path(
    get,
    path = "/events",
    tag = "events",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Events ordered by start date and time", body = Vec<Event>)
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    AuthenticatedUser(_claims, _): AuthenticatedUser,
) -> AppResult<Json<Vec<Event>>> {
    Ok(Json(state.services.events.list().await?))
}

/// List events for the welcome desk
#[utoipa::path(
    get,
    path = "/mobile-visitors/events",
    tag = "events",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Events ordered by start date and time", body = Vec<Event>),
        (status = 403, description = "Welcome or admin role required")
    )
)]
pub async fn list_events_for_welcome(
    State(state): State<AppState>,
    AuthenticatedUser(claims, _): AuthenticatedUser,
) -> AppResult<Json<Vec<Event>>> {
    claims.require_welcome()?;
    Ok(Json(state.services.events.list().await?))
}

/// Top-level events with their sub-events nested
#[utoipa::path(
    get,
    path = "/events/tree",
    tag = "events",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Event tree", body = Vec<EventNode>)
    )
)]
pub async fn event_tree(
    State(state): State<AppState>,
    AuthenticatedUser(_claims, _): AuthenticatedUser,
) -> AppResult<Json<Vec<EventNode>>> {
    Ok(Json(state.services.events.tree().await?))
}

/// Get event by ID
#[utoipa::path(
    get,
    path = "/events/{id}",
    tag = "events",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event details", body = Event),
        (status = 404, description = "Event not found")
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    AuthenticatedUser(_claims, _): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Event>> {
    Ok(Json(state.services.events.get_by_id(id).await?))
}

/// Create an event
#[utoipa::path(
    post,
    path = "/events",
    tag = "events",
    security(("bearer_auth" = [])),
    request_body = CreateEvent,
    responses(
        (status = 201, description = "Event created", body = Event)
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    AuthenticatedUser(claims, _): AuthenticatedUser,
    Json(data): Json<CreateEvent>,
) -> AppResult<(StatusCode, Json<Event>)> {
    claims.require_admin()?;
    data.validate()?;
    let event = state.services.events.create(&data).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Update an event.
///
/// Absent fields are left untouched, `null` clears a field.
#[utoipa::path(
    put,
    path = "/events/{id}",
    tag = "events",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Event ID")),
    request_body = UpdateEvent,
    responses(
        (status = 200, description = "Event updated", body = Event),
        (status = 404, description = "Event not found")
    )
)]
pub async fn update_event(
    State(state): State<AppState>,
    AuthenticatedUser(claims, _): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateEvent>,
) -> AppResult<Json<Event>> {
    claims.require_admin()?;
    if data.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::Validation("Title must not be empty".to_string()));
    }
    Ok(Json(state.services.events.update(id, &data).await?))
}

/// Delete an event
#[utoipa::path(
    delete,
    path = "/events/{id}",
    tag = "events",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "Event not found")
    )
)]
pub async fn delete_event(
    State(state): State<AppState>,
    AuthenticatedUser(claims, _): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;
    state.services.events.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload or replace the attachment of an event (multipart field `file`)
#[utoipa::path(
    post,
    path = "/events/{id}/attachment",
    tag = "events",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Event ID")),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Attachment stored", body = Event),
        (status = 404, description = "Event not found")
    )
)]
pub async fn upload_attachment(
    State(state): State<AppState>,
    AuthenticatedUser(claims, _): AuthenticatedUser,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> AppResult<Json<Event>> {
    claims.require_admin()?;
    let (filename, content) = read_file_field(multipart).await?;
    let event = state
        .services
        .events
        .save_attachment(id, filename.as_deref(), &content)
        .await?;
    Ok(Json(event))
}

/// File name and content of the multipart field named `file`
pub(crate) async fn read_file_field(mut multipart: Multipart) -> AppResult<(Option<String>, Vec<u8>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|_| AppError::BadRequest("Could not read uploaded file".to_string()))?;
        return Ok((filename, bytes.to_vec()));
    }
    Err(AppError::Validation("Missing file field".to_string()))
}
