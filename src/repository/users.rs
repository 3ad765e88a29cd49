//! Staff users repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::{HostSummary, Role, User, UserQuery},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get active user by login
    pub async fn get_by_login(&self, login: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(login) = LOWER($1) AND active",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Check if login already exists
    pub async fn login_exists(&self, login: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(login) = LOWER($1))")
                .bind(login)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Create a staff user with an already-hashed password
    pub async fn create(
        &self,
        login: &str,
        password_hash: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
        role: Role,
    ) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (login, password, first_name, last_name, email, phone, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(login)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(phone)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// List users, optionally filtered by role
    pub async fn list(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 200);
        let offset = (page - 1) * per_page;

        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE ($1::text IS NULL OR role = $1) \
             ORDER BY login LIMIT $2 OFFSET $3",
        )
        .bind(query.role.map(|r| r.as_str()))
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE ($1::text IS NULL OR role = $1)")
                .bind(query.role.map(|r| r.as_str()))
                .fetch_one(&self.pool)
                .await?;

        Ok((users, total))
    }

    /// Pick-list of active staff who can host visitors
    pub async fn hosts(&self) -> AppResult<Vec<HostSummary>> {
        let hosts = sqlx::query_as::<_, HostSummary>(
            "SELECT id, first_name, last_name, email FROM users \
             WHERE active ORDER BY last_name, first_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(hosts)
    }
}
