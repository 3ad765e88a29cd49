//! Activity log model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};

/// Audited lifecycle actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Register,
    Approve,
    Reject,
    CheckIn,
    CheckOut,
    EmergencyCheckout,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Register => "register",
            ActivityAction::Approve => "approve",
            ActivityAction::Reject => "reject",
            ActivityAction::CheckIn => "check_in",
            ActivityAction::CheckOut => "check_out",
            ActivityAction::EmergencyCheckout => "emergency_checkout",
        }
    }
}

impl std::str::FromStr for ActivityAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "register" => Ok(ActivityAction::Register),
            "approve" => Ok(ActivityAction::Approve),
            "reject" => Ok(ActivityAction::Reject),
            "check_in" => Ok(ActivityAction::CheckIn),
            "check_out" => Ok(ActivityAction::CheckOut),
            "emergency_checkout" => Ok(ActivityAction::EmergencyCheckout),
            _ => Err(format!("Invalid activity action: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for ActivityAction {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for ActivityAction {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for ActivityAction {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// One audit log entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ActivityEntry {
    pub id: i64,
    pub action: ActivityAction,
    pub visitor_id: Option<i32>,
    pub visit_id: Option<i32>,
    /// Staff member who performed the action; absent for self-registration
    pub actor_id: Option<i32>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Activity feed query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ActivityQuery {
    /// Maximum entries to return (default 50, max 500)
    pub limit: Option<i64>,
    pub visitor_id: Option<i32>,
}
