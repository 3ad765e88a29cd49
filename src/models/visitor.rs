//! Visitor model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::user::HostSummary;

/// Visitor approval status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VisitorStatus {
    Pending,
    Approved,
    Rejected,
}

impl VisitorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitorStatus::Pending => "pending",
            VisitorStatus::Approved => "approved",
            VisitorStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for VisitorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for VisitorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(VisitorStatus::Pending),
            "approved" => Ok(VisitorStatus::Approved),
            "rejected" => Ok(VisitorStatus::Rejected),
            _ => Err(format!("Invalid visitor status: {}", s)),
        }
    }
}

// SQLx conversion for VisitorStatus (stored as text)
impl sqlx::Type<Postgres> for VisitorStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for VisitorStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for VisitorStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Full visitor model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Visitor {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    /// Phone number, unique across visitors
    pub phone: String,
    pub email: Option<String>,
    pub company: Option<String>,
    /// Reference to the stored portrait photo blob
    pub photo_id: Option<Uuid>,
    pub id_document_type: Option<String>,
    pub id_document_number: Option<String>,
    /// Reference to the stored ID document photo blob
    pub id_document_photo_id: Option<Uuid>,
    pub status: VisitorStatus,
    pub notes: Option<String>,
    pub host_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Visitor with the host resolved for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VisitorWithHost {
    #[serde(flatten)]
    pub visitor: Visitor,
    pub host: Option<HostSummary>,
}

/// Short visitor representation for lists and dashboards
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct VisitorSummary {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub company: Option<String>,
    pub status: VisitorStatus,
}

/// Create visitor request (self-registration and reception desk)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVisitor {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(length(min = 6, message = "Phone must be at least 6 characters"))]
    pub phone: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub company: Option<String>,
    pub photo_id: Option<Uuid>,
    pub id_document_type: Option<String>,
    pub id_document_number: Option<String>,
    pub id_document_photo_id: Option<Uuid>,
    pub notes: Option<String>,
    pub host_id: Option<i32>,
}

/// Update visitor request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateVisitor {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub company: Option<String>,
    pub photo_id: Option<Uuid>,
    pub id_document_type: Option<String>,
    pub id_document_number: Option<String>,
    pub id_document_photo_id: Option<Uuid>,
    pub notes: Option<String>,
    pub host_id: Option<i32>,
}

/// Visitor query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct VisitorQuery {
    /// Filter by status (pending, approved, rejected)
    pub status: Option<VisitorStatus>,
    /// Search by first or last name
    pub name: Option<String>,
    /// Filter by host
    pub host_id: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
