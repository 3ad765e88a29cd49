//! Repository layer for database operations

pub mod activity;
pub mod users;
pub mod visitors;
pub mod visits;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub visitors: visitors::VisitorsRepository,
    pub visits: visits::VisitsRepository,
    pub users: users::UsersRepository,
    pub activity: activity::ActivityRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            visitors: visitors::VisitorsRepository::new(pool.clone()),
            visits: visits::VisitsRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            activity: activity::ActivityRepository::new(pool.clone()),
            pool,
        }
    }
}
