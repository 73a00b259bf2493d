//! Reporting model (per-event visitor statistics)

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::time_format;

/// Event id used for free-form rows that are not backed by an event
pub const MANUAL_EVENT_ID: i32 = 99;

/// Reporting record.
///
/// Title, date and start time are a snapshot of the event at reporting time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ReportingEntry {
    pub id: i32,
    pub event_id: i32,
    pub event_title: String,
    pub event_date: Option<NaiveDate>,
    pub event_start_time: Option<NaiveTime>,
    /// Number of visitors; `None` means not counted (distinct from zero)
    pub visitor: Option<i32>,
    /// Title of the vacation period the event falls into
    pub vacation: Option<String>,
    /// Title of the holiday the event falls on
    pub holiday: Option<String>,
    /// Titles of worship evenings / specials in the same slot, comma separated
    pub special: Option<String>,
}

/// Reporting row before insertion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewReportingEntry {
    pub event_id: i32,
    pub event_title: String,
    pub event_date: Option<NaiveDate>,
    pub event_start_time: Option<NaiveTime>,
    pub visitor: Option<i32>,
    pub vacation: Option<String>,
    pub holiday: Option<String>,
    pub special: Option<String>,
}

impl NewReportingEntry {
    pub fn with_id(self, id: i32) -> ReportingEntry {
        ReportingEntry {
            id,
            event_id: self.event_id,
            event_title: self.event_title,
            event_date: self.event_date,
            event_start_time: self.event_start_time,
            visitor: self.visitor,
            vacation: self.vacation,
            holiday: self.holiday,
            special: self.special,
        }
    }
}

/// Reporting submission for an event.
///
/// When `event_id` does not resolve to an event, the entry is built from the
/// `event_*` fields instead.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SubmitReporting {
    pub event_id: i32,
    pub visitor: Option<i32>,
    pub event_title: Option<String>,
    pub event_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "time_format::option::deserialize")]
    #[schema(value_type = Option<String>, example = "10:00")]
    pub event_start_time: Option<NaiveTime>,
    /// Used when no vacation period is detected
    pub vacation: Option<String>,
    /// Used when no holiday is detected
    pub holiday: Option<String>,
    /// Used when no special is detected
    pub special: Option<String>,
}

/// Free-form reporting row entered in the reporting table
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ManualReporting {
    /// Defaults to 99
    pub event_id: Option<i32>,
    /// Defaults to an empty title
    pub event_title: Option<String>,
    pub event_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "time_format::option::deserialize")]
    #[schema(value_type = Option<String>, example = "10:00")]
    pub event_start_time: Option<NaiveTime>,
    pub visitor: Option<i32>,
    pub vacation: Option<String>,
    pub holiday: Option<String>,
    pub special: Option<String>,
}

impl From<SubmitReporting> for ManualReporting {
    fn from(s: SubmitReporting) -> Self {
        Self {
            event_id: Some(s.event_id),
            event_title: s.event_title,
            event_date: s.event_date,
            event_start_time: s.event_start_time,
            visitor: s.visitor,
            vacation: s.vacation,
            holiday: s.holiday,
            special: s.special,
        }
    }
}

/// Edit of a reporting row; only non-null fields are written
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateReporting {
    pub visitor: Option<i32>,
    pub event_title: Option<String>,
    pub event_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "time_format::option::deserialize")]
    #[schema(value_type = Option<String>)]
    pub event_start_time: Option<NaiveTime>,
    pub vacation: Option<String>,
    pub holiday: Option<String>,
    pub special: Option<String>,
}

impl UpdateReporting {
    pub fn apply(self, entry: &mut ReportingEntry) {
        if let Some(visitor) = self.visitor {
            entry.visitor = Some(visitor);
        }
        if let Some(title) = self.event_title {
            entry.event_title = title;
        }
        if let Some(date) = self.event_date {
            entry.event_date = Some(date);
        }
        if let Some(time) = self.event_start_time {
            entry.event_start_time = Some(time);
        }
        if let Some(vacation) = self.vacation {
            entry.vacation = Some(vacation);
        }
        if let Some(holiday) = self.holiday {
            entry.holiday = Some(holiday);
        }
        if let Some(special) = self.special {
            entry.special = Some(special);
        }
    }
}

/// Query parameters for the visitor report
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct VisitorReportQuery {
    /// Earliest event date (YYYY-MM-DD or ISO datetime)
    pub start_date: Option<String>,
    /// Latest event date (YYYY-MM-DD or ISO datetime)
    pub end_date: Option<String>,
}

/// One row of the visitor report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct VisitorReportRow {
    pub id: i32,
    pub event_id: i32,
    /// ISO date, empty when the entry has no date
    pub date: String,
    pub title: String,
    pub event_start_time: Option<NaiveTime>,
    pub visitors: i32,
    pub vacation: Option<String>,
    pub holiday: Option<String>,
    pub special: Option<String>,
}

impl VisitorReportRow {
    /// Entries without a visitor count are not part of the report
    pub fn from_entry(entry: ReportingEntry) -> Option<Self> {
        let visitors = entry.visitor?;
        Some(Self {
            id: entry.id,
            event_id: entry.event_id,
            date: entry
                .event_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            title: entry.event_title,
            event_start_time: entry.event_start_time,
            visitors,
            vacation: entry.vacation,
            holiday: entry.holiday,
            special: entry.special,
        })
    }
}
