//! Business logic services

pub mod auth;
pub mod clock;
pub mod lifecycle;
pub mod stats;
pub mod visitors;

use std::sync::Arc;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub visitors: visitors::VisitorsService,
    pub lifecycle: lifecycle::LifecycleService,
    pub stats: stats::StatsService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository and clock
    pub fn new(repository: Repository, auth_config: AuthConfig, clock: Arc<dyn clock::Clock>) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config),
            visitors: visitors::VisitorsService::new(repository.clone()),
            lifecycle: lifecycle::LifecycleService::new(repository.clone(), clock.clone()),
            stats: stats::StatsService::new(repository.clone(), clock),
            repository,
        }
    }
}
