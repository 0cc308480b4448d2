//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::{DeviceId, TokenKeyError, UserId};

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Device not found: {0}")]
    DeviceNotFound(DeviceId),

    // =========================================================================
    // Binding Errors
    // =========================================================================
    #[error("Device {0} is not the user's current device")]
    DeviceNotCurrent(DeviceId),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid device identifier")]
    InvalidDeviceIdentifier,

    #[error("Invalid token key: {0}")]
    InvalidTokenKey(#[from] TokenKeyError),

    // =========================================================================
    // Storage Errors (transient)
    // =========================================================================
    #[error("Storage conflict: {0}")]
    StorageConflict(String),

    #[error("Storage timed out after {millis} ms")]
    StorageTimeout { millis: u64 },

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::UserNotFound(_) => "UNKNOWN_USER",
            Self::DeviceNotFound(_) => "UNKNOWN_DEVICE",

            // Binding
            Self::DeviceNotCurrent(_) => "DEVICE_NOT_CURRENT",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidDeviceIdentifier => "INVALID_DEVICE_IDENTIFIER",
            Self::InvalidTokenKey(_) => "INVALID_TOKEN_KEY",

            // Storage
            Self::StorageConflict(_) => "STORAGE_CONFLICT",
            Self::StorageTimeout { .. } => "STORAGE_TIMEOUT",

            // Infrastructure
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UserNotFound(_) | Self::DeviceNotFound(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_) | Self::InvalidDeviceIdentifier | Self::InvalidTokenKey(_)
        )
    }

    /// Check if the caller may retry the same operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageConflict(_) | Self::StorageTimeout { .. })
    }
}
