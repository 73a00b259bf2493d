//! Planning levels API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        category::ListQuery,
        planning_level::{PlanningLevel, PlanningLevelInput},
    },
    AppState,
};

use super::AuthenticatedUser;

#[utoipa::path(
    get,
    path = "/planning-levels",
    tag = "planning-levels",
    security(("bearer_auth" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "Planning levels", body = Vec<PlanningLevel>)
    )
)]
pub async fn list_planning_levels(
    State(state): State<AppState>,
    AuthenticatedUser(_claims, _): AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<PlanningLevel>>> {
    let (skip, limit) = query.bounds();
    Ok(Json(state.services.planning_levels.list(skip, limit).await?))
}

#[utoipa::path(
    get,
    path = "/planning-levels/{id}",
    tag = "planning-levels",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Planning level ID")),
    responses(
        (status = 200, description = "Planning level", body = PlanningLevel),
        (status = 404, description = "Planning level not found")
    )
)]
pub async fn get_planning_level(
    State(state): State<AppState>,
    AuthenticatedUser(_claims, _): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<PlanningLevel>> {
    Ok(Json(state.services.planning_levels.get_by_id(id).await?))
}

#[utoipa::path(
    post,
    path = "/planning-levels",
    tag = "planning-levels",
    security(("bearer_auth" = [])),
    request_body = PlanningLevelInput,
    responses(
        (status = 201, description = "Planning level created", body = PlanningLevel),
        (status = 409, description = "Planning level name already exists")
    )
)]
pub async fn create_planning_level(
    State(state): State<AppState>,
    AuthenticatedUser(claims, _): AuthenticatedUser,
    Json(data): Json<PlanningLevelInput>,
) -> AppResult<(StatusCode, Json<PlanningLevel>)> {
    claims.require_admin()?;
    data.validate()?;
    let level = state.services.planning_levels.create(&data).await?;
    Ok((StatusCode::CREATED, Json(level)))
}

#[utoipa::path(
    put,
    path = "/planning-levels/{id}",
    tag = "planning-levels",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Planning level ID")),
    request_body = PlanningLevelInput,
    responses(
        (status = 200, description = "Planning level updated", body = PlanningLevel),
        (status = 404, description = "Planning level not found")
    )
)]
pub async fn update_planning_level(
    State(state): State<AppState>,
    AuthenticatedUser(claims, _): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<PlanningLevelInput>,
) -> AppResult<Json<PlanningLevel>> {
    claims.require_admin()?;
    data.validate()?;
    Ok(Json(state.services.planning_levels.update(id, &data).await?))
}

#[utoipa::path(
    delete,
    path = "/planning-levels/{id}",
    tag = "planning-levels",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Planning level ID")),
    responses(
        (status = 204, description = "Planning level deleted"),
        (status = 404, description = "Planning level not found")
    )
)]
pub async fn delete_planning_level(
    State(state): State<AppState>,
    AuthenticatedUser(claims, _): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;
    state.services.planning_levels.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
