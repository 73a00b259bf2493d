//! Nextcloud proxy endpoints (admin only)

use axum::{extract::State, Json};
use axum_extra::extract::Multipart;

use crate::{
    error::AppResult,
    models::nextcloud::{CopyAndShareRequest, CopyAndShareResponse, ServiceFolderRequest, ShareUrlResponse},
    AppState,
};

use super::{events::read_file_field, AuthenticatedUser};

/// Upload a sermon series attachment and share it read-only
#[utoipa::path(
    post,
    path = "/nextcloud/predigtreihe-attachment",
    tag = "nextcloud",
    security(("bearer_auth" = [])),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Public link", body = ShareUrlResponse),
        (status = 500, description = "Nextcloud not configured"),
        (status = 502, description = "Nextcloud request failed")
    )
)]
pub async fn upload_sermon_series_attachment(
    State(state): State<AppState>,
    AuthenticatedUser(claims, _): AuthenticatedUser,
    multipart: Multipart,
) -> AppResult<Json<ShareUrlResponse>> {
    claims.require_admin()?;
    let (filename, content) = read_file_field(multipart).await?;
    let url = state
        .services
        .nextcloud
        .upload_sermon_series_attachment(filename.as_deref(), content)
        .await?;
    Ok(Json(ShareUrlResponse { url }))
}

/// Copy the donation image into service folders and share each copy
#[utoipa::path(
    post,
    path = "/nextcloud/bauspende-copy",
    tag = "nextcloud",
    security(("bearer_auth" = [])),
    request_body = CopyAndShareRequest,
    responses(
        (status = 200, description = "Copied files with public links", body = CopyAndShareResponse),
        (status = 400, description = "No target folder given"),
        (status = 502, description = "Nextcloud request failed")
    )
)]
pub async fn copy_and_share(
    State(state): State<AppState>,
    AuthenticatedUser(claims, _): AuthenticatedUser,
    Json(request): Json<CopyAndShareRequest>,
) -> AppResult<Json<CopyAndShareResponse>> {
    claims.require_admin()?;
    let files = state.services.nextcloud.copy_and_share(&request).await?;
    Ok(Json(files.into()))
}

/// Create (or reuse) a service folder with an editable public link
#[utoipa::path(
    post,
    path = "/nextcloud/gottesdienst-folder",
    tag = "nextcloud",
    security(("bearer_auth" = [])),
    request_body = ServiceFolderRequest,
    responses(
        (status = 200, description = "Public link", body = ShareUrlResponse),
        (status = 502, description = "Nextcloud request failed")
    )
)]
pub async fn service_folder(
    State(state): State<AppState>,
    AuthenticatedUser(claims, _): AuthenticatedUser,
    Json(request): Json<ServiceFolderRequest>,
) -> AppResult<Json<ShareUrlResponse>> {
    claims.require_admin()?;
    let url = state.services.nextcloud.service_folder(&request).await?;
    Ok(Json(ShareUrlResponse { url }))
}
