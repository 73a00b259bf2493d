//! Planning levels repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{map_unique_violation, AppError, AppResult},
    models::planning_level::{PlanningLevel, PlanningLevelInput},
};

#[derive(Clone)]
pub struct PlanningLevelsRepository {
    pool: Pool<Postgres>,
}

impl PlanningLevelsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn list(&self, skip: i64, limit: i64) -> AppResult<Vec<PlanningLevel>> {
        let rows = sqlx::query_as::<_, PlanningLevel>(
            "SELECT * FROM planning_levels ORDER BY id OFFSET $1 LIMIT $2",
        )
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i32) -> AppResult<PlanningLevel> {
        sqlx::query_as::<_, PlanningLevel>("SELECT * FROM planning_levels WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Planning level not found".to_string()))
    }

    pub async fn create(&self, data: &PlanningLevelInput) -> AppResult<PlanningLevel> {
        sqlx::query_as::<_, PlanningLevel>("INSERT INTO planning_levels (name) VALUES ($1) RETURNING *")
            .bind(&data.name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "Planning level name already exists"))
    }

    pub async fn update(&self, id: i32, data: &PlanningLevelInput) -> AppResult<PlanningLevel> {
        sqlx::query_as::<_, PlanningLevel>("UPDATE planning_levels SET name = $1 WHERE id = $2 RETURNING *")
            .bind(&data.name)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "Planning level name already exists"))?
            .ok_or_else(|| AppError::NotFound("Planning level not found".to_string()))
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM planning_levels WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Planning level not found".to_string()));
        }
        Ok(())
    }
}
