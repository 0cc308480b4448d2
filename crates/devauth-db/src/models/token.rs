//! Token database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A tokens row joined with its device's identifier
#[derive(Debug, Clone, FromRow)]
pub struct TokenModel {
    pub token_key: String,
    pub user_id: i64,
    pub device_id: i64,
    pub device_identifier: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub epoch: i64,
}
