//! Authentication and user management service

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use rand::rngs::OsRng;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{CreateUser, Role, UpdateUser, User, UserClaims},
    repository::Repository,
};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Check credentials and return a bearer token
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<String> {
        let invalid = || AppError::Authentication("Incorrect username or password".to_string());

        let user = self
            .repository
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&user.password_hash, password)? {
            tracing::warn!(username = %username, "Failed login attempt");
            return Err(invalid());
        }

        tracing::info!(user_id = user.id, "User logged in");
        self.create_token(&user)
    }

    /// Issue a JWT for a user
    pub fn create_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            role: user.role,
            exp: now + (self.config.jwt_expiration_minutes as i64 * 60),
            iat: now,
        };
        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Active user behind a token subject
    pub async fn get_active_by_username(&self, username: &str) -> AppResult<User> {
        self.repository
            .users
            .find_by_username(username)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::Authentication("Could not validate credentials".to_string()))
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.repository.users.list().await
    }

    pub async fn create(&self, data: CreateUser) -> AppResult<User> {
        let username = data.username.trim();
        if username.is_empty() {
            return Err(AppError::Validation("Username is required".to_string()));
        }
        let role: Role = data.role.parse()?;
        check_password(&data.password)?;

        if self.repository.users.find_by_username(username).await?.is_some() {
            return Err(AppError::Validation("Username already exists".to_string()));
        }

        let hash = hash_password(&data.password)?;
        let user = self.repository.users.create(username, &hash, role, data.is_active).await?;
        tracing::info!(user_id = user.id, role = %user.role, "User created");
        Ok(user)
    }

    /// Update a user on behalf of `acting_user_id`
    pub async fn update(&self, id: i32, data: UpdateUser, acting_user_id: i32) -> AppResult<User> {
        let user = self.repository.users.get_by_id(id).await?;

        if user.id == acting_user_id && data.is_active == Some(false) {
            return Err(AppError::Validation("You cannot deactivate your own account".to_string()));
        }

        let role = data.role.as_deref().map(str::parse::<Role>).transpose()?;
        let hash = match data.password.as_deref() {
            Some(password) => {
                check_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        self.repository
            .users
            .update(id, role, data.is_active, hash.as_deref())
            .await
    }

    /// Create an active admin; `None` when the username is taken
    pub async fn create_admin(&self, username: &str, password: &str) -> AppResult<Option<User>> {
        if self.repository.users.find_by_username(username).await?.is_some() {
            return Ok(None);
        }
        let hash = hash_password(password)?;
        let user = self.repository.users.create(username, &hash, Role::Admin, true).await?;
        Ok(Some(user))
    }
}

fn check_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation("Password must be at least 6 characters".to_string()));
    }
    Ok(())
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
