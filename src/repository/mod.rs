//! Repository layer for database operations

pub mod categories;
pub mod events;
pub mod planning_levels;
pub mod reporting;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub events: events::EventsRepository,
    pub categories: categories::CategoriesRepository,
    pub planning_levels: planning_levels::PlanningLevelsRepository,
    pub reporting: reporting::ReportingRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            events: events::EventsRepository::new(pool.clone()),
            categories: categories::CategoriesRepository::new(pool.clone()),
            planning_levels: planning_levels::PlanningLevelsRepository::new(pool.clone()),
            reporting: reporting::ReportingRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            pool,
        }
    }
}
