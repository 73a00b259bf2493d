//! Category model (named tags attached to events)

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Category names with a meaning for reporting annotations
pub mod names {
    /// School vacation period
    pub const VACATION: &str = "Ferien";
    /// Public holiday
    pub const HOLIDAY: &str = "Feiertag";
    /// Worship evening
    pub const WORSHIP_EVENING: &str = "Lobpreisabend";
    pub const SPECIAL: &str = "Special";
}

/// Category record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i32,
    /// Unique name
    pub name: String,
    /// Short symbol shown in the calendar, e.g. an emoji
    pub symbol: Option<String>,
    /// Display color (`#RRGGBB`)
    pub color_hex: Option<String>,
    pub description: Option<String>,
    /// Whether the category marks an item of the worship service plan
    pub godi_item: bool,
}

/// Id and name only, used in the event tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryShort {
    pub id: i32,
    pub name: String,
}

impl From<&Category> for CategoryShort {
    fn from(c: &Category) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
        }
    }
}

/// Create or replace category request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(max = 8, message = "Symbol must be at most 8 characters"))]
    pub symbol: Option<String>,
    #[validate(length(equal = 7, message = "Color must be formatted as #RRGGBB"))]
    pub color_hex: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub godi_item: bool,
}

/// Offset pagination for category and planning level lists
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListQuery {
    /// Number of rows to skip (default 0)
    pub skip: Option<i64>,
    /// Maximum number of rows (default 100)
    pub limit: Option<i64>,
}

impl ListQuery {
    pub fn bounds(&self) -> (i64, i64) {
        (self.skip.unwrap_or(0).max(0), self.limit.unwrap_or(100).clamp(0, 1000))
    }
}
