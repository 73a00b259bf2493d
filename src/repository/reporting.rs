//! Reporting repository

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::reporting::{NewReportingEntry, ReportingEntry},
    services::reporting::ReportingStore,
};

#[derive(Clone)]
pub struct ReportingRepository {
    pool: Pool<Postgres>,
}

impl ReportingRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get reporting entry by ID
    pub async fn get(&self, id: i32) -> AppResult<ReportingEntry> {
        sqlx::query_as::<_, ReportingEntry>("SELECT * FROM reporting WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Reporting entry not found".to_string()))
    }

    /// All entries for an event, newest first
    pub async fn list_by_event(&self, event_id: i32) -> AppResult<Vec<ReportingEntry>> {
        let rows = sqlx::query_as::<_, ReportingEntry>(
            "SELECT * FROM reporting WHERE event_id = $1 ORDER BY id DESC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Entries within an optional event date range, newest event first
    pub async fn list_by_date(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> AppResult<Vec<ReportingEntry>> {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if start_date.is_some() {
            conditions.push(format!("event_date >= ${}", idx));
            idx += 1;
        }
        if end_date.is_some() {
            conditions.push(format!("event_date <= ${}", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT * FROM reporting {} ORDER BY event_date DESC, event_start_time DESC, id DESC",
            where_clause
        );

        let mut builder = sqlx::query_as::<_, ReportingEntry>(&query);
        if let Some(sd) = start_date {
            builder = builder.bind(sd);
        }
        if let Some(ed) = end_date {
            builder = builder.bind(ed);
        }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// Insert a new entry
    pub async fn create(&self, data: &NewReportingEntry) -> AppResult<ReportingEntry> {
        let row = sqlx::query_as::<_, ReportingEntry>(
            r#"
            INSERT INTO reporting (
                event_id, event_title, event_date, event_start_time,
                visitor, vacation, holiday, special
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(data.event_id)
        .bind(&data.event_title)
        .bind(data.event_date)
        .bind(data.event_start_time)
        .bind(data.visitor)
        .bind(&data.vacation)
        .bind(&data.holiday)
        .bind(&data.special)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Write back all mutable fields of an entry
    pub async fn save(&self, entry: &ReportingEntry) -> AppResult<ReportingEntry> {
        sqlx::query_as::<_, ReportingEntry>(
            r#"
            UPDATE reporting SET
                event_id = $2, event_title = $3, event_date = $4, event_start_time = $5,
                visitor = $6, vacation = $7, holiday = $8, special = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(entry.id)
        .bind(entry.event_id)
        .bind(&entry.event_title)
        .bind(entry.event_date)
        .bind(entry.event_start_time)
        .bind(entry.visitor)
        .bind(&entry.vacation)
        .bind(&entry.holiday)
        .bind(&entry.special)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Reporting entry not found".to_string()))
    }

    /// Delete an entry
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM reporting WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Reporting entry not found".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReportingStore for ReportingRepository {
    async fn find_latest_by_event_id(&self, event_id: i32) -> AppResult<Option<ReportingEntry>> {
        let row = sqlx::query_as::<_, ReportingEntry>(
            "SELECT * FROM reporting WHERE event_id = $1 ORDER BY id DESC LIMIT 1",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert(&self, entry: &NewReportingEntry) -> AppResult<ReportingEntry> {
        self.create(entry).await
    }

    async fn update(&self, entry: &ReportingEntry) -> AppResult<ReportingEntry> {
        self.save(entry).await
    }
}
