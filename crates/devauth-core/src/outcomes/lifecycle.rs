//! Validation and logout outcomes
//!
//! These are values, not errors: an expired or device-changed token is an
//! expected state of the lifecycle and every caller has to handle it.

use crate::entities::{Token, User};

/// Result of validating a presented token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Token is live and was issued for the user's current device
    Valid { user: User, token: Token },
    /// Token was past its window; the row has been deleted
    Expired,
    /// The user has since signed in on another device; the row has been deleted
    DeviceChanged,
    /// No such token
    NotFound,
}

impl Validation {
    /// Check if the token was accepted
    #[inline]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Stable code for logs and API payloads
    pub fn code(&self) -> &'static str {
        match self {
            Self::Valid { .. } => "VALID",
            Self::Expired => "TOKEN_EXPIRED",
            Self::DeviceChanged => "DEVICE_CHANGED",
            Self::NotFound => "TOKEN_NOT_FOUND",
        }
    }

    /// Take the authenticated user, if any
    pub fn into_user(self) -> Option<User> {
        match self {
            Self::Valid { user, .. } => Some(user),
            Self::Expired | Self::DeviceChanged | Self::NotFound => None,
        }
    }
}

/// Result of a logout
///
/// `NotFound` is the normal answer to a repeated logout and is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    Revoked,
    NotFound,
}

impl LogoutOutcome {
    /// Check if this call removed the token
    #[inline]
    pub fn is_revoked(self) -> bool {
        matches!(self, Self::Revoked)
    }
}
