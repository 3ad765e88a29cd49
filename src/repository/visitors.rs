//! Visitors repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        user::HostSummary,
        visitor::{CreateVisitor, UpdateVisitor, Visitor, VisitorQuery, VisitorStatus, VisitorSummary, VisitorWithHost},
    },
};

#[derive(Clone)]
pub struct VisitorsRepository {
    pool: Pool<Postgres>,
}

impl VisitorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get visitor by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Visitor> {
        sqlx::query_as::<_, Visitor>("SELECT * FROM visitors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Visitor with id {} not found", id)))
    }

    /// Get visitor with the host record resolved
    pub async fn get_with_host(&self, id: i32) -> AppResult<VisitorWithHost> {
        let visitor = self.get_by_id(id).await?;

        let host = if let Some(host_id) = visitor.host_id {
            sqlx::query_as::<_, HostSummary>(
                "SELECT id, first_name, last_name, email FROM users WHERE id = $1",
            )
            .bind(host_id)
            .fetch_optional(&self.pool)
            .await?
        } else {
            None
        };

        Ok(VisitorWithHost { visitor, host })
    }

    /// Check if phone already exists
    pub async fn phone_exists(&self, phone: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM visitors WHERE phone = $1 AND id != $2)")
                .bind(phone)
                .bind(id)
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM visitors WHERE phone = $1)")
                .bind(phone)
                .fetch_one(&self.pool)
                .await?
        };
        Ok(exists)
    }

    /// Check if email already exists
    pub async fn email_exists(&self, email: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM visitors WHERE LOWER(email) = LOWER($1) AND id != $2)",
            )
            .bind(email)
            .bind(id)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM visitors WHERE LOWER(email) = LOWER($1))")
                .bind(email)
                .fetch_one(&self.pool)
                .await?
        };
        Ok(exists)
    }

    /// Create a new visitor (status starts at pending)
    pub async fn create(&self, data: &CreateVisitor) -> AppResult<Visitor> {
        let visitor = sqlx::query_as::<_, Visitor>(
            r#"
            INSERT INTO visitors (
                first_name, last_name, phone, email, company, photo_id,
                id_document_type, id_document_number, id_document_photo_id,
                status, notes, host_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending', $10, $11)
            RETURNING *
            "#,
        )
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.phone)
        .bind(&data.email)
        .bind(&data.company)
        .bind(data.photo_id)
        .bind(&data.id_document_type)
        .bind(&data.id_document_number)
        .bind(data.id_document_photo_id)
        .bind(&data.notes)
        .bind(data.host_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(visitor)
    }

    /// Update visitor profile fields
    pub async fn update(&self, id: i32, data: &UpdateVisitor) -> AppResult<Visitor> {
        let visitor = sqlx::query_as::<_, Visitor>(
            r#"
            UPDATE visitors SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone = COALESCE($4, phone),
                email = COALESCE($5, email),
                company = COALESCE($6, company),
                photo_id = COALESCE($7, photo_id),
                id_document_type = COALESCE($8, id_document_type),
                id_document_number = COALESCE($9, id_document_number),
                id_document_photo_id = COALESCE($10, id_document_photo_id),
                notes = COALESCE($11, notes),
                host_id = COALESCE($12, host_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.phone)
        .bind(&data.email)
        .bind(&data.company)
        .bind(data.photo_id)
        .bind(&data.id_document_type)
        .bind(&data.id_document_number)
        .bind(data.id_document_photo_id)
        .bind(&data.notes)
        .bind(data.host_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Visitor with id {} not found", id)))?;

        Ok(visitor)
    }

    /// Atomically move a visitor to a new status, optionally appending to notes.
    ///
    /// The expected source statuses are checked inside the UPDATE so the
    /// transition is a single read-check-write; a row that no longer matches
    /// returns None and the caller decides between NotFound and a lifecycle
    /// error.
    pub async fn set_status(
        &self,
        id: i32,
        from: &[VisitorStatus],
        to: VisitorStatus,
        note: Option<&str>,
    ) -> AppResult<Option<Visitor>> {
        let from_codes: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();

        let visitor = sqlx::query_as::<_, Visitor>(
            r#"
            UPDATE visitors SET
                status = $2,
                notes = CASE
                    WHEN $3::text IS NULL THEN notes
                    WHEN notes IS NULL OR notes = '' THEN $3
                    ELSE notes || E'\n' || $3
                END,
                updated_at = NOW()
            WHERE id = $1 AND status = ANY($4)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(to)
        .bind(note)
        .bind(&from_codes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(visitor)
    }

    /// List visitors with status pending, oldest first
    pub async fn pending_approvals(&self) -> AppResult<Vec<Visitor>> {
        let visitors = sqlx::query_as::<_, Visitor>(
            "SELECT * FROM visitors WHERE status = 'pending' ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(visitors)
    }

    /// Search visitors with filters and pagination
    pub async fn search(&self, query: &VisitorQuery) -> AppResult<(Vec<VisitorSummary>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 200);
        let offset = (page - 1) * per_page;

        let mut conditions = Vec::new();
        let mut idx = 1;

        if query.status.is_some() {
            conditions.push(format!("status = ${}", idx));
            idx += 1;
        }
        if query.name.is_some() {
            conditions.push(format!(
                "(LOWER(first_name) LIKE ${} OR LOWER(last_name) LIKE ${})",
                idx, idx
            ));
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
            "SELECT id, first_name, last_name, phone, company, status FROM visitors {} \
             ORDER BY created_at DESC LIMIT {} OFFSET {}",
            where_clause, per_page, offset
        );
        let count_sql = format!("SELECT COUNT(*) FROM visitors {}", where_clause);

        let mut list_query = sqlx::query_as::<_, VisitorSummary>(&list_sql);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);

        if let Some(status) = query.status {
            list_query = list_query.bind(status);
            count_query = count_query.bind(status);
        }
        if let Some(ref name) = query.name {
            let pattern = format!("%{}%", name.to_lowercase());
            list_query = list_query.bind(pattern.clone());
            count_query = count_query.bind(pattern);
        }
        if let Some(host_id) = query.host_id {
            list_query = list_query.bind(host_id);
            count_query = count_query.bind(host_id);
        }

        let visitors = list_query.fetch_all(&self.pool).await?;
        let total = count_query.fetch_one(&self.pool).await?;

        Ok((visitors, total))
    }

    /// Hard delete a visitor and their visits (admin removal)
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM activity_log WHERE visitor_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM visits WHERE visitor_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM visitors WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Visitor with id {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }
}
