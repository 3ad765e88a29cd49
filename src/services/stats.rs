//! Front-desk statistics service

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, repository::Repository};

use super::{
    clock::Clock,
    lifecycle::{day_bounds, week_bounds},
};

/// Dashboard counters
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    /// Visits scheduled today
    pub today_visits: i64,
    /// Check-ins that happened today
    pub today_checkins: i64,
    /// Visitors currently on premises
    pub currently_checked_in: i64,
    /// Visits scheduled in the current week (Sunday-started)
    pub weekly_visits: i64,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
    clock: Arc<dyn Clock>,
}

impl StatsService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Counters for the dashboard, optionally scoped to one host
    pub async fn dashboard(&self, host_id: Option<i32>) -> AppResult<DashboardStats> {
        let today = self.clock.now().date_naive();
        let (day_start, day_end) = day_bounds(today);
        let (week_start, week_end) = week_bounds(today);

        let today_visits = self
            .repository
            .visits
            .count_in_range(day_start, day_end, host_id)
            .await?;
        let today_checkins = self
            .repository
            .visits
            .count_checkins_in_range(day_start, day_end, host_id)
            .await?;
        let currently_checked_in = self
            .repository
            .visits
            .count_currently_checked_in(host_id)
            .await?;
        let weekly_visits = self
            .repository
            .visits
            .count_in_range(week_start, week_end, host_id)
            .await?;

        Ok(DashboardStats {
            today_visits,
            today_checkins,
            currently_checked_in,
            weekly_visits,
        })
    }
}
