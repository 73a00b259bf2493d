//! Maintenance of stored reporting entries and the visitor report

use chrono::NaiveDate;

use crate::{
    error::{AppError, AppResult},
    models::{
        reporting::{ReportingEntry, UpdateReporting, VisitorReportQuery, VisitorReportRow},
        time_format::parse_date,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ReportsService {
    repository: Repository,
}

impl ReportsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Entries of one event, newest first
    pub async fn list_by_event(&self, event_id: i32) -> AppResult<Vec<ReportingEntry>> {
        self.repository.reporting.list_by_event(event_id).await
    }

    pub async fn update(&self, id: i32, data: UpdateReporting) -> AppResult<ReportingEntry> {
        let mut entry = self.repository.reporting.get(id).await?;
        data.apply(&mut entry);
        self.repository.reporting.save(&entry).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.reporting.delete(id).await?;
        tracing::info!(entry_id = id, "Reporting entry deleted");
        Ok(())
    }

    /// Entries with a visitor count, filtered on the event date (inclusive)
    pub async fn visitors_by_title(&self, query: &VisitorReportQuery) -> AppResult<Vec<VisitorReportRow>> {
        let start = parse_bound(query.start_date.as_deref(), "start_date")?;
        let end = parse_bound(query.end_date.as_deref(), "end_date")?;

        let entries = self.repository.reporting.list_by_date(start, end).await?;
        Ok(entries.into_iter().filter_map(VisitorReportRow::from_entry).collect())
    }
}

fn parse_bound(value: Option<&str>, name: &str) -> AppResult<Option<NaiveDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => parse_date(v)
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("Invalid {}: {}", name, v))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bound() {
        assert_eq!(parse_bound(None, "start_date").unwrap(), None);
        assert_eq!(parse_bound(Some(""), "start_date").unwrap(), None);
        assert_eq!(
            parse_bound(Some("2024-06-01T00:00:00"), "start_date").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
        assert!(matches!(parse_bound(Some("June"), "end_date"), Err(AppError::Validation(_))));
    }
}
