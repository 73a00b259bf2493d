//! Categories and planning levels services

use crate::{
    error::AppResult,
    models::{
        category::{Category, CategoryInput},
        planning_level::{PlanningLevel, PlanningLevelInput},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CategoriesService {
    repository: Repository,
}

impl CategoriesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, skip: i64, limit: i64) -> AppResult<Vec<Category>> {
        self.repository.categories.list(skip, limit).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Category> {
        self.repository.categories.get(id).await
    }

    pub async fn create(&self, data: &CategoryInput) -> AppResult<Category> {
        let category = self.repository.categories.create(data).await?;
        tracing::info!(category_id = category.id, name = %category.name, "Category created");
        Ok(category)
    }

    pub async fn update(&self, id: i32, data: &CategoryInput) -> AppResult<Category> {
        self.repository.categories.update(id, data).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.categories.delete(id).await
    }
}

#[derive(Clone)]
pub struct PlanningLevelsService {
    repository: Repository,
}

impl PlanningLevelsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, skip: i64, limit: i64) -> AppResult<Vec<PlanningLevel>> {
        self.repository.planning_levels.list(skip, limit).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<PlanningLevel> {
        self.repository.planning_levels.get(id).await
    }

    pub async fn create(&self, data: &PlanningLevelInput) -> AppResult<PlanningLevel> {
        self.repository.planning_levels.create(data).await
    }

    pub async fn update(&self, id: i32, data: &PlanningLevelInput) -> AppResult<PlanningLevel> {
        self.repository.planning_levels.update(id, data).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.planning_levels.delete(id).await
    }
}
