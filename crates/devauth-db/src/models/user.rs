//! User database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for users table
#[derive(Debug, Clone, FromRow)]
pub struct UserModel {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub time_zone: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    /// UTC offset, in seconds, of the zone `last_login` was recorded in
    pub last_login_offset: Option<i32>,
    pub active_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl UserModel {
    /// Check if user is soft deleted
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
