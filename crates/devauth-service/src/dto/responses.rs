//! Response DTOs
//!
//! All response DTOs implement `Serialize`. IDs are serialized as strings.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

/// Result of a successful login
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// `true` when this login inserted a new token row
    pub created: bool,
    pub user: UserResponse,
}

/// Authenticated user
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<FixedOffset>>,
}

/// A retained device row
#[derive(Debug, Clone, Serialize)]
pub struct DeviceResponse {
    pub id: String,
    pub device_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    /// Whether this is the device of the user's most recent login
    pub current: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
