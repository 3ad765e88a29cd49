//! Visits repository: atomic lifecycle writes and classification queries

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        user::HostSummary,
        visit::{CreateVisit, Visit, VisitQuery},
        visitor::{Visitor, VisitorStatus, VisitorSummary},
    },
};

/// Open visit joined with visitor and host, before duration formatting
#[derive(Debug, Clone)]
pub struct CheckedInRow {
    pub visit_id: i32,
    pub checked_in_at: DateTime<Utc>,
    pub badge_number: Option<String>,
    pub visitor: VisitorSummary,
    pub host: Option<HostSummary>,
}

/// Translate storage-level uniqueness violations into caller-visible conflicts
fn map_db_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db) = err {
        match db.constraint() {
            Some("uq_visits_one_open_per_visitor") => {
                return AppError::Conflict("Visitor is already checked in".to_string())
            }
            Some("uq_visits_badge_number") => return AppError::BadgeCollision,
            _ => {}
        }
    }
    AppError::Database(err)
}

#[derive(Clone)]
pub struct VisitsRepository {
    pool: Pool<Postgres>,
}

impl VisitsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get visit by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Visit> {
        sqlx::query_as::<_, Visit>("SELECT * FROM visits WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Visit with id {} not found", id)))
    }

    /// Create a scheduled visit
    pub async fn create(&self, data: &CreateVisit) -> AppResult<Visit> {
        let visit = sqlx::query_as::<_, Visit>(
            r#"
            INSERT INTO visits (visitor_id, host_id, visit_date, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(data.visitor_id)
        .bind(data.host_id)
        .bind(data.visit_date)
        .bind(&data.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(visit)
    }

    /// Check a visitor in as one atomic read-check-write.
    ///
    /// Inside a single transaction: locks the visitor row (serializing
    /// concurrent check-ins for the same visitor), verifies approved status,
    /// rejects when an open visit exists, then finds today's un-checked-in
    /// visit in `[day_start, day_end)` or creates one, and stamps check-in
    /// time and badge. The partial unique index on open visits backstops the
    /// race and surfaces as Conflict.
    pub async fn check_in(
        &self,
        visitor_id: i32,
        visit_id: Option<i32>,
        badge_number: &str,
        now: DateTime<Utc>,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> AppResult<Visit> {
        let mut tx = self.pool.begin().await?;

        let visitor = sqlx::query_as::<_, Visitor>("SELECT * FROM visitors WHERE id = $1 FOR UPDATE")
            .bind(visitor_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Visitor with id {} not found", visitor_id)))?;

        if visitor.status != VisitorStatus::Approved {
            return Err(AppError::PreconditionFailed(format!(
                "Visitor is not approved (status: {})",
                visitor.status
            )));
        }

        let already_checked_in: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM visits WHERE visitor_id = $1 \
             AND check_in_time IS NOT NULL AND check_out_time IS NULL)",
        )
        .bind(visitor_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_checked_in {
            return Err(AppError::Conflict("Visitor is already checked in".to_string()));
        }

        let target_id = if let Some(id) = visit_id {
            let visit = sqlx::query_as::<_, Visit>(
                "SELECT * FROM visits WHERE id = $1 AND visitor_id = $2 FOR UPDATE",
            )
            .bind(id)
            .bind(visitor_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Visit with id {} not found", id)))?;

            if visit.check_in_time.is_some() {
                return Err(AppError::Conflict("Visit is already checked in".to_string()));
            }
            visit.id
        } else {
            let todays: Option<i32> = sqlx::query_scalar(
                "SELECT id FROM visits WHERE visitor_id = $1 \
                 AND visit_date >= $2 AND visit_date < $3 AND check_in_time IS NULL \
                 ORDER BY visit_date LIMIT 1 FOR UPDATE",
            )
            .bind(visitor_id)
            .bind(day_start)
            .bind(day_end)
            .fetch_optional(&mut *tx)
            .await?;

            match todays {
                Some(id) => id,
                None => {
                    // Walk-in: create today's visit on the fly
                    sqlx::query_scalar::<_, i32>(
                        "INSERT INTO visits (visitor_id, host_id, visit_date) \
                         VALUES ($1, $2, $3) RETURNING id",
                    )
                    .bind(visitor_id)
                    .bind(visitor.host_id)
                    .bind(now)
                    .fetch_one(&mut *tx)
                    .await?
                }
            }
        };

        let visit = sqlx::query_as::<_, Visit>(
            r#"
            UPDATE visits SET
                check_in_time = $2,
                badge_number = COALESCE(badge_number, $3),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(target_id)
        .bind(now)
        .bind(badge_number)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        Ok(visit)
    }

    /// Check out a specific visit
    pub async fn check_out_visit(&self, visit_id: i32, now: DateTime<Utc>) -> AppResult<Visit> {
        let visit = sqlx::query_as::<_, Visit>(
            r#"
            UPDATE visits SET check_out_time = $2, updated_at = NOW()
            WHERE id = $1 AND check_in_time IS NOT NULL AND check_out_time IS NULL
            RETURNING *
            "#,
        )
        .bind(visit_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match visit {
            Some(v) => Ok(v),
            // Re-read to distinguish the failure modes
            None => {
                let existing = self.get_by_id(visit_id).await?;
                if existing.check_in_time.is_none() {
                    Err(AppError::PreconditionFailed(
                        "Visit was never checked in".to_string(),
                    ))
                } else {
                    Err(AppError::Conflict("Visit is already checked out".to_string()))
                }
            }
        }
    }

    /// Check out whichever visit the visitor currently has open
    pub async fn check_out_visitor(&self, visitor_id: i32, now: DateTime<Utc>) -> AppResult<Visit> {
        let visit = sqlx::query_as::<_, Visit>(
            r#"
            UPDATE visits SET check_out_time = $2, updated_at = NOW()
            WHERE visitor_id = $1 AND check_in_time IS NOT NULL AND check_out_time IS NULL
            RETURNING *
            "#,
        )
        .bind(visitor_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match visit {
            Some(v) => Ok(v),
            None => {
                let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM visitors WHERE id = $1)")
                    .bind(visitor_id)
                    .fetch_one(&self.pool)
                    .await?;
                if !exists {
                    Err(AppError::NotFound(format!(
                        "Visitor with id {} not found",
                        visitor_id
                    )))
                } else {
                    Err(AppError::PreconditionFailed(
                        "Visitor is not checked in".to_string(),
                    ))
                }
            }
        }
    }

    /// Close every open visit, annotating the notes. Returns the number of
    /// visits closed; a second call finds zero matching rows.
    pub async fn emergency_checkout_all(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE visits SET
                check_out_time = $1,
                notes = CASE
                    WHEN notes IS NULL OR notes = '' THEN '[EMERGENCY CHECKOUT]'
                    ELSE notes || ' [EMERGENCY CHECKOUT]'
                END,
                updated_at = NOW()
            WHERE check_in_time IS NOT NULL AND check_out_time IS NULL
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// All open visits joined with visitor and host summaries
    pub async fn currently_checked_in(&self) -> AppResult<Vec<CheckedInRow>> {
        let rows = sqlx::query(
            r#"
            SELECT vi.id as visit_id, vi.check_in_time, vi.badge_number,
                   v.id as visitor_id, v.first_name, v.last_name, v.phone, v.company, v.status,
                   u.id as host_id, u.first_name as host_first_name,
                   u.last_name as host_last_name, u.email as host_email
            FROM visits vi
            JOIN visitors v ON vi.visitor_id = v.id
            LEFT JOIN users u ON vi.host_id = u.id
            WHERE vi.check_in_time IS NOT NULL AND vi.check_out_time IS NULL
            ORDER BY vi.check_in_time
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::new();
        for row in rows {
            let status: VisitorStatus = row.get("status");
            let host_id: Option<i32> = row.get("host_id");

            result.push(CheckedInRow {
                visit_id: row.get("visit_id"),
                checked_in_at: row.get("check_in_time"),
                badge_number: row.get("badge_number"),
                visitor: VisitorSummary {
                    id: row.get("visitor_id"),
                    first_name: row.get("first_name"),
                    last_name: row.get("last_name"),
                    phone: row.get("phone"),
                    company: row.get("company"),
                    status,
                },
                host: host_id.map(|id| HostSummary {
                    id,
                    first_name: row.get("host_first_name"),
                    last_name: row.get("host_last_name"),
                    email: row.get("host_email"),
                }),
            });
        }

        Ok(result)
    }

    /// List visits with filters and pagination
    pub async fn search(
        &self,
        query: &VisitQuery,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> AppResult<(Vec<Visit>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 200);
        let offset = (page - 1) * per_page;

        let mut conditions = Vec::new();
        let mut idx = 1;

        if start.is_some() {
            conditions.push(format!("visit_date >= ${}", idx));
            idx += 1;
        }
        if end.is_some() {
            conditions.push(format!("visit_date < ${}", idx));
            idx += 1;
        }
        if query.visitor_id.is_some() {
            conditions.push(format!("visitor_id = ${}", idx));
            idx += 1;
        }
        if query.host_id.is_some() {
            conditions.push(format!("host_id = ${}", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let list_sql = format!(
            "SELECT * FROM visits {} ORDER BY visit_date DESC LIMIT {} OFFSET {}",
            where_clause, per_page, offset
        );
        let count_sql = format!("SELECT COUNT(*) FROM visits {}", where_clause);

        let mut list_query = sqlx::query_as::<_, Visit>(&list_sql);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);

        if let Some(s) = start {
            list_query = list_query.bind(s);
            count_query = count_query.bind(s);
        }
        if let Some(e) = end {
            list_query = list_query.bind(e);
            count_query = count_query.bind(e);
        }
        if let Some(visitor_id) = query.visitor_id {
            list_query = list_query.bind(visitor_id);
            count_query = count_query.bind(visitor_id);
        }
        if let Some(host_id) = query.host_id {
            list_query = list_query.bind(host_id);
            count_query = count_query.bind(host_id);
        }

        let visits = list_query.fetch_all(&self.pool).await?;
        let total = count_query.fetch_one(&self.pool).await?;

        Ok((visits, total))
    }

    /// Count visits scheduled within `[start, end)`
    pub async fn count_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        host_id: Option<i32>,
    ) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM visits WHERE visit_date >= $1 AND visit_date < $2 \
             AND ($3::int4 IS NULL OR host_id = $3)",
        )
        .bind(start)
        .bind(end)
        .bind(host_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Count check-ins that happened within `[start, end)`
    pub async fn count_checkins_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        host_id: Option<i32>,
    ) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM visits WHERE check_in_time >= $1 AND check_in_time < $2 \
             AND ($3::int4 IS NULL OR host_id = $3)",
        )
        .bind(start)
        .bind(end)
        .bind(host_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Count visitors currently on premises
    pub async fn count_currently_checked_in(&self, host_id: Option<i32>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM visits WHERE check_in_time IS NOT NULL AND check_out_time IS NULL \
             AND ($1::int4 IS NULL OR host_id = $1)",
        )
        .bind(host_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
