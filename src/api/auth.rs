//! Authentication endpoints

use axum::{
    extract::{FromRequest, Request, State},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::user::User,
    AppState,
};

use super::AuthenticatedUser;

/// Login credentials
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Bearer token issued on login
#[derive(Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    /// Always `bearer`
    pub token_type: String,
}

/// Login with username and password.
///
/// Accepts an url-encoded form (OAuth2 password flow) or a JSON body.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body(
        content = LoginRequest,
        content_type = "application/x-www-form-urlencoded"
    ),
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Incorrect username or password", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(State(state): State<AppState>, request: Request) -> AppResult<Json<TokenResponse>> {
    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    let credentials = if is_json {
        let Json(body) = Json::<LoginRequest>::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        body
    } else {
        let Form(body) = Form::<LoginRequest>::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        body
    };

    let access_token = state
        .services
        .users
        .authenticate(&credentials.username, &credentials.password)
        .await?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// Get the current user
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(AuthenticatedUser(_claims, user): AuthenticatedUser) -> Json<User> {
    Json(user)
}
