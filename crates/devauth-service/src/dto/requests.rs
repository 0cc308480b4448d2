//! Request DTOs
//!
//! All request DTOs implement `Deserialize` and `Validate`. Only presence is
//! checked here; format rules (email syntax, password strength) belong to
//! whoever owns account creation.

use std::borrow::Cow;

use serde::Deserialize;
use validator::{Validate, ValidationError};

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required")
            .with_message(Cow::Borrowed("email and password are required")));
    }
    Ok(())
}

/// Login request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = "not_blank"))]
    pub email: String,

    #[validate(custom(function = "not_blank"))]
    pub password: String,

    #[validate(nested)]
    pub device: DeviceRequest,
}

/// Device details sent with a login
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DeviceRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "device_id must be 1-255 characters"
    ))]
    pub device_id: String,

    #[serde(default)]
    pub os: Option<String>,

    #[serde(default)]
    pub os_version: Option<String>,
}

impl LoginRequest {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            device: DeviceRequest {
                device_id: device_id.into(),
                os: None,
                os_version: None,
            },
        }
    }

    /// Attach OS metadata
    #[must_use]
    pub fn with_os(mut self, os: impl Into<String>, os_version: impl Into<String>) -> Self {
        self.device.os = Some(os.into());
        self.device.os_version = Some(os_version.into());
        self
    }
}
