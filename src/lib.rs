//! Events Planner
//!
//! REST backend for planning church services and events: hierarchical events
//! with categories and planning levels, visitor reporting annotated with
//! vacations, holidays and special events, and a Nextcloud file-sharing proxy.

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub pool: Pool<Postgres>,
}
