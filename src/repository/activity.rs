//! Activity log repository

use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::activity::{ActivityAction, ActivityEntry, ActivityQuery},
};

#[derive(Clone)]
pub struct ActivityRepository {
    pool: Pool<Postgres>,
}

impl ActivityRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append an audit entry
    pub async fn record(
        &self,
        action: ActivityAction,
        visitor_id: Option<i32>,
        visit_id: Option<i32>,
        actor_id: Option<i32>,
        details: Option<&str>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (action, visitor_id, visit_id, actor_id, details)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(action)
        .bind(visitor_id)
        .bind(visit_id)
        .bind(actor_id)
        .bind(details)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Most recent entries, newest first
    pub async fn recent(&self, query: &ActivityQuery) -> AppResult<Vec<ActivityEntry>> {
        let limit = query.limit.unwrap_or(50).clamp(1, 500);

        let entries = sqlx::query_as::<_, ActivityEntry>(
            "SELECT * FROM activity_log WHERE ($1::int4 IS NULL OR visitor_id = $1) \
             ORDER BY created_at DESC LIMIT $2",
        )
        .bind(query.visitor_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
