//! Data models for the events planner

pub mod category;
pub mod event;
pub mod nextcloud;
pub mod planning_level;
pub mod reporting;
pub mod time_format;
pub mod user;

// Re-export commonly used types
pub use category::{Category, CategoryShort};
pub use event::{Event, EventNode};
pub use planning_level::PlanningLevel;
pub use reporting::{ReportingEntry, MANUAL_EVENT_ID};
pub use user::{Role, User, UserClaims};
