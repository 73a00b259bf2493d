//! API handlers for the events planner REST endpoints

pub mod auth;
pub mod categories;
pub mod events;
pub mod health;
pub mod nextcloud;
pub mod openapi;
pub mod planning_levels;
pub mod reporting;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{
    error::AppError,
    models::user::{User, UserClaims},
    AppState,
};

/// Authenticated, active user behind the bearer token.
///
/// The user is reloaded on every request so deactivation and role changes
/// take effect before the token expires.
pub struct AuthenticatedUser(pub UserClaims, pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let invalid = || AppError::Authentication("Could not validate credentials".to_string());

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Authentication("Not authenticated".to_string()))?;

        let mut claims = UserClaims::from_token(token, &state.config.auth.jwt_secret).map_err(|e| {
            tracing::debug!("Rejected token: {}", e);
            invalid()
        })?;

        let user = state
            .services
            .users
            .get_active_by_username(&claims.sub)
            .await
            .map_err(|e| match e {
                AppError::Authentication(_) => invalid(),
                other => other,
            })?;

        claims.user_id = user.id;
        claims.role = user.role;
        Ok(AuthenticatedUser(claims, user))
    }
}
