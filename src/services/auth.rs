//! Staff authentication and account management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{CreateUser, HostSummary, User, UserClaims, UserQuery},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate by login and password, returning a JWT token and the user
    pub async fn authenticate(&self, login: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_login(login)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid login or password".to_string()))?;

        if !self.verify_password(&user.password, password)? {
            return Err(AppError::Authentication("Invalid login or password".to_string()));
        }

        let token = self.create_token_for_user(&user)?;
        Ok((token, user))
    }

    /// Create a JWT token for a user
    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.login.clone(),
            user_id: user.id,
            role: user.role,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    fn verify_password(&self, hash: &str, password: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// Get a user's profile
    pub async fn get_user(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Create a staff account (admin only)
    pub async fn create_user(&self, data: CreateUser) -> AppResult<User> {
        if self.repository.users.login_exists(&data.login).await? {
            return Err(AppError::Conflict(format!(
                "Login {} already exists",
                data.login
            )));
        }

        let hash = self.hash_password(&data.password)?;
        self.repository
            .users
            .create(
                &data.login,
                &hash,
                data.first_name.as_deref(),
                data.last_name.as_deref(),
                data.email.as_deref(),
                data.phone.as_deref(),
                data.role,
            )
            .await
    }

    /// List staff accounts
    pub async fn list_users(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        self.repository.users.list(query).await
    }

    /// Host pick-list for registration forms
    pub async fn hosts(&self) -> AppResult<Vec<HostSummary>> {
        self.repository.users.hosts().await
    }
}
