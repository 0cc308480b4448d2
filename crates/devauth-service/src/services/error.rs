//! Service layer error types
//!
//! Provides a unified error type for all service operations.

use devauth_common::AppError;
use devauth_core::DomainError;
use std::fmt;
use std::time::Duration;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Service layer error type
#[derive(Debug)]
pub enum ServiceError {
    /// Domain rule violation or storage failure
    Domain(DomainError),

    /// Application error passed through unchanged
    App(AppError),

    /// Unknown email or wrong secret; deliberately indistinguishable
    InvalidCredentials,

    /// No usable `Authorization` header
    Unauthenticated,

    /// Presented key is unknown
    InvalidToken,

    /// Presented key was past its window
    TokenExpired,

    /// Presented key was issued for a device the user has since left
    DeviceChanged,

    /// A storage call did not finish within the configured deadline
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Validation error
    Validation(String),

    /// Internal error
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(e) => write!(f, "{e}"),
            Self::App(e) => write!(f, "{e}"),
            Self::InvalidCredentials => write!(f, "Unable to log in with provided credentials"),
            Self::Unauthenticated => write!(f, "Authentication credentials were not provided"),
            Self::InvalidToken => write!(f, "Invalid token"),
            Self::TokenExpired => write!(f, "Token expired"),
            Self::DeviceChanged => {
                write!(f, "Signed in on another device; log in again on this device")
            }
            Self::Timeout { operation, after } => {
                write!(f, "Storage call {operation} timed out after {} ms", after.as_millis())
            }
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Domain(e) => Some(e),
            Self::App(e) => Some(e),
            _ => None,
        }
    }
}

impl ServiceError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if repeating the same call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Domain(e) => e.is_retryable(),
            Self::App(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Domain(e) => {
                if e.is_not_found() {
                    404
                } else if e.is_validation() {
                    400
                } else if e.is_retryable() {
                    503
                } else {
                    500
                }
            }
            Self::App(e) => e.status_code(),
            Self::InvalidCredentials
            | Self::Unauthenticated
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::DeviceChanged => 401,
            Self::Timeout { .. } => 503,
            Self::Validation(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Get the error code for API responses
    pub fn error_code(&self) -> &str {
        match self {
            Self::Domain(e) => e.code(),
            Self::App(e) => e.error_code(),
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::DeviceChanged => "DEVICE_CHANGED",
            Self::Timeout { .. } => "STORAGE_TIMEOUT",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<AppError> for ServiceError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::InvalidCredentials => Self::InvalidCredentials,
            AppError::Unauthenticated => Self::Unauthenticated,
            AppError::InvalidToken => Self::InvalidToken,
            AppError::TokenExpired => Self::TokenExpired,
            AppError::DeviceChanged => Self::DeviceChanged,
            other => Self::App(other),
        }
    }
}

/// Flatten field messages, descending into nested structs
fn collect_messages(errors: &ValidationErrors, out: &mut Vec<String>) {
    for kind in errors.errors().values() {
        match kind {
            ValidationErrorsKind::Field(fields) => out.extend(fields.iter().map(|e| {
                e.message
                    .as_ref()
                    .map_or_else(|| e.code.to_string(), ToString::to_string)
            })),
            ValidationErrorsKind::Struct(nested) => collect_messages(nested, out),
            ValidationErrorsKind::List(items) => {
                for nested in items.values() {
                    collect_messages(nested, out);
                }
            }
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages = Vec::new();
        collect_messages(&errors, &mut messages);
        messages.sort();
        messages.dedup();
        Self::Validation(messages.join("; "))
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => AppError::Domain(e),
            ServiceError::App(e) => e,
            ServiceError::InvalidCredentials => AppError::InvalidCredentials,
            ServiceError::Unauthenticated => AppError::Unauthenticated,
            ServiceError::InvalidToken => AppError::InvalidToken,
            ServiceError::TokenExpired => AppError::TokenExpired,
            ServiceError::DeviceChanged => AppError::DeviceChanged,
            ServiceError::Timeout { after, .. } => AppError::Domain(DomainError::StorageTimeout {
                millis: u64::try_from(after.as_millis()).unwrap_or(u64::MAX),
            }),
            ServiceError::Validation(msg) => AppError::Validation(msg),
            ServiceError::Internal(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use devauth_core::UserId;

    #[test]
    fn test_auth_errors_are_unauthorized() {
        for err in [
            ServiceError::InvalidCredentials,
            ServiceError::Unauthenticated,
            ServiceError::InvalidToken,
            ServiceError::TokenExpired,
            ServiceError::DeviceChanged,
        ] {
            assert_eq!(err.status_code(), 401);
            assert!(!err.is_retryable());
        }
        assert_eq!(ServiceError::DeviceChanged.error_code(), "DEVICE_CHANGED");
        assert_eq!(ServiceError::Unauthenticated.error_code(), "UNAUTHENTICATED");
    }

    #[test]
    fn test_timeout_is_retryable() {
        let err = ServiceError::Timeout {
            operation: "issue_or_rotate",
            after: Duration::from_millis(250),
        };
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), 503);
        assert_eq!(err.to_string(), "Storage call issue_or_rotate timed out after 250 ms");

        let app: AppError = err.into();
        assert_eq!(app.status_code(), 503);
        assert_eq!(app.error_code(), "STORAGE_TIMEOUT");
    }

    #[test]
    fn test_storage_conflict_is_retryable() {
        let err = ServiceError::from(DomainError::StorageConflict("pair".to_string()));
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), 503);
    }

    #[test]
    fn test_validation_error() {
        let err = ServiceError::validation("device identifier is required");
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_app_error_round_trip_keeps_variant() {
        let err = ServiceError::from(AppError::DeviceChanged);
        assert!(matches!(err, ServiceError::DeviceChanged));
        assert!(matches!(AppError::from(err), AppError::DeviceChanged));
    }

    #[test]
    fn test_convert_domain_to_app_error() {
        let service_err = ServiceError::from(DomainError::UserNotFound(UserId::new(4)));
        let app_err: AppError = service_err.into();
        assert_eq!(app_err.status_code(), 404);
    }
}
