//! Business logic services

pub mod categories;
pub mod events;
pub mod nextcloud;
pub mod reporting;
pub mod reports;
pub mod users;

use std::sync::Arc;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub events: events::EventsService,
    pub categories: categories::CategoriesService,
    pub planning_levels: categories::PlanningLevelsService,
    pub reporting: reporting::ReportingService,
    pub reports: reports::ReportsService,
    pub nextcloud: nextcloud::NextcloudService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        let event_store = Arc::new(repository.events.clone());
        let reporting_store = Arc::new(repository.reporting.clone());

        Self {
            users: users::UsersService::new(repository.clone(), config.auth.clone()),
            events: events::EventsService::new(repository.clone(), &config.attachments.dir),
            categories: categories::CategoriesService::new(repository.clone()),
            planning_levels: categories::PlanningLevelsService::new(repository.clone()),
            reporting: reporting::ReportingService::new(event_store, reporting_store),
            reports: reports::ReportsService::new(repository),
            nextcloud: nextcloud::NextcloudService::new(config.nextcloud.clone()),
        }
    }
}
