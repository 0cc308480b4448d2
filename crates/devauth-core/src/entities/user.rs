//! User entity - an account that can sign in on one or more devices

use chrono::{DateTime, FixedOffset, Utc};

use crate::value_objects::{TokenKey, UserId};

/// User account as seen by the authentication core
///
/// The password hash is deliberately not part of the entity; it is only read
/// by the credential verifier through the user repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Always stored normalized (see [`User::normalize_email`])
    pub email: String,
    /// IANA time zone name, e.g. `Asia/Seoul`
    pub time_zone: Option<String>,
    /// Wall-clock time of the last successful login, in the user's zone
    pub last_login: Option<DateTime<FixedOffset>>,
    /// Key of the token issued by the most recent login
    pub active_token: Option<TokenKey>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with required fields
    pub fn new(id: UserId, name: String, email: &str) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            email: Self::normalize_email(email),
            time_zone: None,
            last_login: None,
            active_token: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the user's time zone
    #[must_use]
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = Some(time_zone.into());
        self
    }

    /// Canonical form of an email address used for storage, lookup and fingerprints
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Check whether the account can still sign in
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }

    /// Check whether `key` is the token recorded by the latest login
    pub fn holds_token(&self, key: &TokenKey) -> bool {
        self.active_token.as_ref() == Some(key)
    }
}
