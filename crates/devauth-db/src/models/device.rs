//! Device database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for devices table
#[derive(Debug, Clone, FromRow)]
pub struct DeviceModel {
    pub id: i64,
    pub user_id: i64,
    pub identifier: String,
    pub os: Option<String>,
    pub os_version: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A device_bindings row, reduced to what the domain reads
#[derive(Debug, Clone, Copy, FromRow)]
pub struct BindingModel {
    pub device_id: i64,
    pub epoch: i64,
}
