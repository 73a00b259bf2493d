//! Planning level model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Planning level record (e.g. "Jahresplanung", "Feinplanung")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PlanningLevel {
    pub id: i32,
    pub name: String,
}

/// Create or rename planning level request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PlanningLevelInput {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
}
