//! Events repository

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::{FromRow, PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        category::Category,
        event::{CreateEvent, Event, EventRow, UpdateEvent},
        planning_level::PlanningLevel,
    },
    services::reporting::EventStore,
};

#[derive(Debug, FromRow)]
struct EventCategoryRow {
    event_id: i32,
    #[sqlx(flatten)]
    category: Category,
}

#[derive(Debug, FromRow)]
struct EventPlanningLevelRow {
    event_id: i32,
    #[sqlx(flatten)]
    level: PlanningLevel,
}

#[derive(Clone)]
pub struct EventsRepository {
    pool: Pool<Postgres>,
}

impl EventsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// All events ordered by start date and time
    pub async fn list(&self) -> AppResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(
            "SELECT * FROM events ORDER BY start_date, start_time, id",
        )
        .fetch_all(&self.pool)
        .await?;
        self.with_relations(rows).await
    }

    /// Get event by ID, `None` when it does not exist
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.with_relations(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Get event by ID
    pub async fn get(&self, id: i32) -> AppResult<Event> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))
    }

    /// Other events starting on or before `date`, ascending by id
    pub async fn starting_on_or_before(&self, exclude_id: i32, date: NaiveDate) -> AppResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(
            "SELECT * FROM events WHERE id <> $1 AND start_date <= $2 ORDER BY id",
        )
        .bind(exclude_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        self.with_relations(rows).await
    }

    /// Other events starting exactly at `date` and `time`, ascending by id
    pub async fn starting_at(&self, exclude_id: i32, date: NaiveDate, time: NaiveTime) -> AppResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(
            "SELECT * FROM events WHERE id <> $1 AND start_date = $2 AND start_time = $3 ORDER BY id",
        )
        .bind(exclude_id)
        .bind(date)
        .bind(time)
        .fetch_all(&self.pool)
        .await?;
        self.with_relations(rows).await
    }

    /// Create an event and attach its categories and planning levels
    pub async fn create(&self, data: &CreateEvent) -> AppResult<Event> {
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO events (
                parent_id, title, start_date, end_date, start_time, end_time,
                preacher, sermon_title, remarks, internal_notes, clarification, link,
                in_clarification, pco_id, visitor_count, mail, attachments, location, link_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING id
            "#,
        )
        .bind(data.parent_id)
        .bind(&data.title)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(&data.preacher)
        .bind(&data.sermon_title)
        .bind(&data.remarks)
        .bind(&data.internal_notes)
        .bind(&data.clarification)
        .bind(&data.link)
        .bind(data.in_clarification)
        .bind(data.pco_id)
        .bind(data.visitor_count)
        .bind(&data.mail)
        .bind(&data.attachments)
        .bind(&data.location)
        .bind(data.link_id)
        .fetch_one(&mut *tx)
        .await?;

        if !data.category_ids.is_empty() {
            replace_categories(&mut tx, id, &data.category_ids).await?;
        }
        if !data.planning_level_ids.is_empty() {
            replace_planning_levels(&mut tx, id, &data.planning_level_ids).await?;
        }

        tx.commit().await?;
        self.get(id).await
    }

    /// Update an event; only provided fields are written
    pub async fn update(&self, id: i32, data: &UpdateEvent) -> AppResult<Event> {
        let mut sets = vec!["updated_at = NOW()".to_string()];
        let mut idx = 1;

        macro_rules! add_f {
            ($field:expr, $name:expr) => {
                if $field.is_some() { sets.push(format!("{} = ${}", $name, idx)); idx += 1; }
            };
        }

        add_f!(data.title, "title");
        add_f!(data.parent_id, "parent_id");
        add_f!(data.start_date, "start_date");
        add_f!(data.end_date, "end_date");
        add_f!(data.start_time, "start_time");
        add_f!(data.end_time, "end_time");
        add_f!(data.preacher, "preacher");
        add_f!(data.sermon_title, "sermon_title");
        add_f!(data.remarks, "remarks");
        add_f!(data.internal_notes, "internal_notes");
        add_f!(data.clarification, "clarification");
        add_f!(data.link, "link");
        add_f!(data.in_clarification, "in_clarification");
        add_f!(data.pco_id, "pco_id");
        add_f!(data.visitor_count, "visitor_count");
        add_f!(data.mail, "mail");
        add_f!(data.attachments, "attachments");
        add_f!(data.location, "location");
        add_f!(data.link_id, "link_id");

        let query = format!("UPDATE events SET {} WHERE id = ${} RETURNING id", sets.join(", "), idx);

        let mut builder = sqlx::query_scalar::<_, i32>(&query);

        macro_rules! bind_f {
            ($field:expr) => {
                if let Some(ref val) = $field { builder = builder.bind(val); }
            };
        }

        bind_f!(data.title);
        bind_f!(data.parent_id);
        bind_f!(data.start_date);
        bind_f!(data.end_date);
        bind_f!(data.start_time);
        bind_f!(data.end_time);
        bind_f!(data.preacher);
        bind_f!(data.sermon_title);
        bind_f!(data.remarks);
        bind_f!(data.internal_notes);
        bind_f!(data.clarification);
        bind_f!(data.link);
        bind_f!(data.in_clarification);
        bind_f!(data.pco_id);
        bind_f!(data.visitor_count);
        bind_f!(data.mail);
        bind_f!(data.attachments);
        bind_f!(data.location);
        bind_f!(data.link_id);
        builder = builder.bind(id);

        let mut tx = self.pool.begin().await?;

        builder
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        if let Some(ref ids) = data.category_ids {
            replace_categories(&mut tx, id, ids).await?;
        }
        if let Some(ref ids) = data.planning_level_ids {
            replace_planning_levels(&mut tx, id, ids).await?;
        }

        tx.commit().await?;
        self.get(id).await
    }

    /// Record the stored attachment file name
    pub async fn set_attachment(&self, id: i32, filename: &str) -> AppResult<Event> {
        let result = sqlx::query("UPDATE events SET attachments = $1, updated_at = NOW() WHERE id = $2")
            .bind(filename)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Event not found".to_string()));
        }
        self.get(id).await
    }

    /// Delete an event; children and links are detached by the schema
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Event not found".to_string()));
        }
        Ok(())
    }

    /// Load categories and planning levels for a batch of rows
    async fn with_relations(&self, rows: Vec<EventRow>) -> AppResult<Vec<Event>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

        let category_rows = sqlx::query_as::<_, EventCategoryRow>(
            r#"
            SELECT ec.event_id, c.id, c.name, c.symbol, c.color_hex, c.description, c.godi_item
            FROM event_categories ec
            JOIN categories c ON c.id = ec.category_id
            WHERE ec.event_id = ANY($1)
            ORDER BY c.id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let level_rows = sqlx::query_as::<_, EventPlanningLevelRow>(
            r#"
            SELECT epl.event_id, pl.id, pl.name
            FROM event_planning_levels epl
            JOIN planning_levels pl ON pl.id = epl.planning_level_id
            WHERE epl.event_id = ANY($1)
            ORDER BY pl.id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut categories: HashMap<i32, Vec<Category>> = HashMap::new();
        for row in category_rows {
            categories.entry(row.event_id).or_default().push(row.category);
        }
        let mut levels: HashMap<i32, Vec<PlanningLevel>> = HashMap::new();
        for row in level_rows {
            levels.entry(row.event_id).or_default().push(row.level);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let id = row.id;
                Event::from_row(
                    row,
                    categories.remove(&id).unwrap_or_default(),
                    levels.remove(&id).unwrap_or_default(),
                )
            })
            .collect())
    }
}

/// Replace the category set of an event; unknown ids are ignored
async fn replace_categories(conn: &mut PgConnection, event_id: i32, category_ids: &[i32]) -> AppResult<()> {
    sqlx::query("DELETE FROM event_categories WHERE event_id = $1")
        .bind(event_id)
        .execute(&mut *conn)
        .await?;
    if !category_ids.is_empty() {
        sqlx::query(
            "INSERT INTO event_categories (event_id, category_id) SELECT $1, id FROM categories WHERE id = ANY($2)",
        )
        .bind(event_id)
        .bind(category_ids)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Replace the planning level set of an event; unknown ids are ignored
async fn replace_planning_levels(conn: &mut PgConnection, event_id: i32, level_ids: &[i32]) -> AppResult<()> {
    sqlx::query("DELETE FROM event_planning_levels WHERE event_id = $1")
        .bind(event_id)
        .execute(&mut *conn)
        .await?;
    if !level_ids.is_empty() {
        sqlx::query(
            "INSERT INTO event_planning_levels (event_id, planning_level_id) SELECT $1, id FROM planning_levels WHERE id = ANY($2)",
        )
        .bind(event_id)
        .bind(level_ids)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl EventStore for EventsRepository {
    async fn get_by_id(&self, id: i32) -> AppResult<Option<Event>> {
        self.find_by_id(id).await
    }

    async fn find_overlapping_by_start_date(&self, exclude_id: i32, on_or_before: NaiveDate) -> AppResult<Vec<Event>> {
        self.starting_on_or_before(exclude_id, on_or_before).await
    }

    async fn find_by_exact_date_time(&self, exclude_id: i32, date: NaiveDate, time: NaiveTime) -> AppResult<Vec<Event>> {
        self.starting_at(exclude_id, date, time).await
    }
}
