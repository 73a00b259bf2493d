//! Event model (services, series, vacation periods, holidays, ...)

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{
    category::{Category, CategoryShort},
    planning_level::PlanningLevel,
    time_format,
};

/// Events table row, without relations
#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: i32,
    pub parent_id: Option<i32>,
    pub title: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub preacher: Option<String>,
    pub sermon_title: Option<String>,
    pub remarks: Option<String>,
    pub internal_notes: Option<String>,
    pub clarification: Option<String>,
    pub link: Option<String>,
    pub in_clarification: bool,
    pub pco_id: Option<i32>,
    pub visitor_count: Option<i32>,
    pub mail: Option<String>,
    pub attachments: Option<String>,
    pub location: Option<String>,
    pub link_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Event with its categories and planning levels
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Event {
    pub id: i32,
    /// Parent event in the tree (e.g. a series)
    pub parent_id: Option<i32>,
    pub title: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub preacher: Option<String>,
    pub sermon_title: Option<String>,
    pub remarks: Option<String>,
    pub internal_notes: Option<String>,
    pub clarification: Option<String>,
    pub link: Option<String>,
    /// Details still being clarified
    #[serde(rename = "in_klaerung")]
    pub in_clarification: bool,
    /// Planning Center id
    pub pco_id: Option<i32>,
    #[serde(rename = "besucherzahl")]
    pub visitor_count: Option<i32>,
    pub mail: Option<String>,
    /// File name of the stored attachment
    pub attachments: Option<String>,
    #[serde(rename = "ort")]
    pub location: Option<String>,
    /// Non-hierarchical link to another event
    pub link_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub categories: Vec<Category>,
    pub planning_levels: Vec<PlanningLevel>,
}

impl Event {
    pub fn from_row(row: EventRow, categories: Vec<Category>, planning_levels: Vec<PlanningLevel>) -> Self {
        Self {
            id: row.id,
            parent_id: row.parent_id,
            title: row.title,
            start_date: row.start_date,
            end_date: row.end_date,
            start_time: row.start_time,
            end_time: row.end_time,
            preacher: row.preacher,
            sermon_title: row.sermon_title,
            remarks: row.remarks,
            internal_notes: row.internal_notes,
            clarification: row.clarification,
            link: row.link,
            in_clarification: row.in_clarification,
            pco_id: row.pco_id,
            visitor_count: row.visitor_count,
            mail: row.mail,
            attachments: row.attachments,
            location: row.location,
            link_id: row.link_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            categories,
            planning_levels,
        }
    }

    /// Whether a category with this exact name is attached
    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c.name == name)
    }

    /// Whether the event spans `date`. An open end date counts as unbounded;
    /// events without a start date never match.
    pub fn covers(&self, date: NaiveDate) -> bool {
        match self.start_date {
            Some(start) if start <= date => self.end_date.map_or(true, |end| end >= date),
            _ => false,
        }
    }
}

/// Node of the event tree
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventNode {
    pub id: i32,
    pub parent_id: Option<i32>,
    pub title: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub preacher: Option<String>,
    pub sermon_title: Option<String>,
    pub remarks: Option<String>,
    pub internal_notes: Option<String>,
    pub clarification: Option<String>,
    pub link: Option<String>,
    pub categories: Vec<CategoryShort>,
    pub planning_levels: Vec<PlanningLevel>,
    pub children: Vec<EventNode>,
}

impl EventNode {
    pub fn leaf(event: &Event) -> Self {
        Self {
            id: event.id,
            parent_id: event.parent_id,
            title: event.title.clone(),
            start_date: event.start_date,
            end_date: event.end_date,
            start_time: event.start_time,
            end_time: event.end_time,
            preacher: event.preacher.clone(),
            sermon_title: event.sermon_title.clone(),
            remarks: event.remarks.clone(),
            internal_notes: event.internal_notes.clone(),
            clarification: event.clarification.clone(),
            link: event.link.clone(),
            categories: event.categories.iter().map(CategoryShort::from).collect(),
            planning_levels: event.planning_levels.clone(),
            children: Vec::new(),
        }
    }
}

/// Create event request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct CreateEvent {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
    pub parent_id: Option<i32>,
    /// Start date (YYYY-MM-DD)
    pub start_date: Option<NaiveDate>,
    /// End date (YYYY-MM-DD)
    pub end_date: Option<NaiveDate>,
    /// Start time (HH:MM or HH:MM:SS)
    #[serde(default, deserialize_with = "time_format::option::deserialize")]
    #[schema(value_type = Option<String>, example = "10:00")]
    pub start_time: Option<NaiveTime>,
    /// End time (HH:MM or HH:MM:SS)
    #[serde(default, deserialize_with = "time_format::option::deserialize")]
    #[schema(value_type = Option<String>, example = "11:30")]
    pub end_time: Option<NaiveTime>,
    pub preacher: Option<String>,
    pub sermon_title: Option<String>,
    pub remarks: Option<String>,
    pub internal_notes: Option<String>,
    pub clarification: Option<String>,
    pub link: Option<String>,
    #[serde(default, rename = "in_klaerung")]
    pub in_clarification: bool,
    pub pco_id: Option<i32>,
    #[serde(rename = "besucherzahl")]
    pub visitor_count: Option<i32>,
    #[validate(email(message = "Invalid email format"))]
    pub mail: Option<String>,
    pub attachments: Option<String>,
    #[serde(rename = "ort")]
    pub location: Option<String>,
    pub link_id: Option<i32>,
    /// Categories to attach
    #[serde(default)]
    pub category_ids: Vec<i32>,
    /// Planning levels to attach
    #[serde(default)]
    pub planning_level_ids: Vec<i32>,
}

/// Update event request.
///
/// Absent fields are left unchanged; an explicit `null` clears nullable
/// fields. For `category_ids` / `planning_level_ids`, absent keeps the
/// relation, `[]` clears it and a list replaces it.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateEvent {
    pub title: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>)]
    pub parent_id: Option<Option<i32>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "time_format::double_option::deserialize")]
    #[schema(value_type = Option<String>)]
    pub start_time: Option<Option<NaiveTime>>,
    #[serde(default, deserialize_with = "time_format::double_option::deserialize")]
    #[schema(value_type = Option<String>)]
    pub end_time: Option<Option<NaiveTime>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub preacher: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub sermon_title: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub remarks: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub internal_notes: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub clarification: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub link: Option<Option<String>>,
    #[serde(rename = "in_klaerung")]
    pub in_clarification: Option<bool>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>)]
    pub pco_id: Option<Option<i32>>,
    #[serde(default, rename = "besucherzahl", with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>)]
    pub visitor_count: Option<Option<i32>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub mail: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub attachments: Option<Option<String>>,
    #[serde(default, rename = "ort", with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub location: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>)]
    pub link_id: Option<Option<i32>>,
    pub category_ids: Option<Vec<i32>>,
    pub planning_level_ids: Option<Vec<i32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dated(start: Option<(i32, u32, u32)>, end: Option<(i32, u32, u32)>) -> Event {
        let ymd = |(y, m, d): (i32, u32, u32)| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        Event {
            start_date: start.map(ymd),
            end_date: end.map(ymd),
            ..Default::default()
        }
    }

    #[test]
    fn test_covers() {
        let day = NaiveDate::from_ymd_opt(2025, 7, 20).unwrap();
        assert!(dated(Some((2025, 7, 17)), Some((2025, 7, 22))).covers(day));
        assert!(dated(Some((2025, 7, 20)), Some((2025, 7, 20))).covers(day));
        assert!(dated(Some((2025, 7, 1)), None).covers(day));
        assert!(!dated(Some((2025, 7, 1)), Some((2025, 7, 19))).covers(day));
        assert!(!dated(Some((2025, 7, 21)), None).covers(day));
        assert!(!dated(None, None).covers(day));
    }

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let update: UpdateEvent = serde_json::from_str(
            r#"{"preacher": null, "ort": "Saal", "start_time": "10:00", "category_ids": []}"#,
        )
        .unwrap();
        assert_eq!(update.preacher, Some(None));
        assert_eq!(update.location, Some(Some("Saal".to_string())));
        assert_eq!(update.start_time, Some(NaiveTime::from_hms_opt(10, 0, 0)));
        assert_eq!(update.remarks, None);
        assert_eq!(update.category_ids, Some(vec![]));
        assert_eq!(update.planning_level_ids, None);
    }

    #[test]
    fn test_wire_names() {
        let event = Event {
            in_clarification: true,
            visitor_count: Some(120),
            location: Some("Kirche".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["in_klaerung"], true);
        assert_eq!(json["besucherzahl"], 120);
        assert_eq!(json["ort"], "Kirche");
    }
}
