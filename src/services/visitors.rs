//! Visitor registration and profile management service

use crate::{
    error::{AppError, AppResult},
    models::{
        activity::ActivityAction,
        visitor::{CreateVisitor, UpdateVisitor, Visitor, VisitorQuery, VisitorSummary, VisitorWithHost},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct VisitorsService {
    repository: Repository,
}

impl VisitorsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Register a visitor (self-registration kiosk or reception desk).
    /// The new record starts pending.
    pub async fn register(&self, data: CreateVisitor, actor_id: Option<i32>) -> AppResult<Visitor> {
        if self.repository.visitors.phone_exists(&data.phone, None).await? {
            return Err(AppError::Conflict(format!(
                "A visitor with phone {} is already registered",
                data.phone
            )));
        }
        if let Some(ref email) = data.email {
            if self.repository.visitors.email_exists(email, None).await? {
                return Err(AppError::Conflict(format!(
                    "A visitor with email {} is already registered",
                    email
                )));
            }
        }

        if let Some(host_id) = data.host_id {
            // Surface a clear error instead of a foreign key violation
            self.repository.users.get_by_id(host_id).await.map_err(|_| {
                AppError::Validation(format!("Host with id {} does not exist", host_id))
            })?;
        }

        let visitor = self.repository.visitors.create(&data).await?;

        self.repository
            .activity
            .record(
                ActivityAction::Register,
                Some(visitor.id),
                None,
                actor_id,
                None,
            )
            .await?;

        tracing::info!(visitor_id = visitor.id, "visitor registered");
        Ok(visitor)
    }

    /// Get visitor with the host record resolved for display
    pub async fn get_with_host(&self, id: i32) -> AppResult<VisitorWithHost> {
        self.repository.visitors.get_with_host(id).await
    }

    /// Search visitors
    pub async fn search(&self, query: &VisitorQuery) -> AppResult<(Vec<VisitorSummary>, i64)> {
        self.repository.visitors.search(query).await
    }

    /// Update visitor profile
    pub async fn update(&self, id: i32, data: UpdateVisitor) -> AppResult<Visitor> {
        if let Some(ref phone) = data.phone {
            if self.repository.visitors.phone_exists(phone, Some(id)).await? {
                return Err(AppError::Conflict(format!(
                    "A visitor with phone {} is already registered",
                    phone
                )));
            }
        }
        if let Some(ref email) = data.email {
            if self.repository.visitors.email_exists(email, Some(id)).await? {
                return Err(AppError::Conflict(format!(
                    "A visitor with email {} is already registered",
                    email
                )));
            }
        }

        self.repository.visitors.update(id, &data).await
    }

    /// Remove a visitor and their visit history (admin only). Removal of the
    /// associated photo blobs is the storage backend's concern.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.visitors.delete(id).await
    }
}
