//! Entity to DTO mappers

use devauth_core::{Device, IssueOutcome, User};

use super::responses::{DeviceResponse, LoginResponse, UserResponse};

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            time_zone: user.time_zone.clone(),
            last_login: user.last_login,
        }
    }
}

impl LoginResponse {
    pub fn new(outcome: &IssueOutcome, user: &User) -> Self {
        Self {
            token: outcome.token.key.to_string(),
            expires_at: outcome.token.expires_at,
            created: outcome.was_created,
            user: UserResponse::from(user),
        }
    }
}

impl DeviceResponse {
    pub fn new(device: &Device, current: Option<&str>) -> Self {
        Self {
            id: device.id.to_string(),
            device_id: device.identifier.clone(),
            os: device.os.clone(),
            os_version: device.os_version.clone(),
            current: current == Some(device.identifier.as_str()),
            created_at: device.created_at,
            updated_at: device.updated_at,
        }
    }
}
