//! Token entity - the server-held credential for one (user, device) pair

use chrono::{DateTime, Duration, Utc};

use crate::value_objects::{DeviceId, TokenKey, UserId};

/// A stored token
///
/// `device_id` is fixed at creation. A token is never repointed to another
/// device; a device change invalidates it instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub key: TokenKey,
    pub user_id: UserId,
    pub device_id: DeviceId,
    /// Client identifier of the owning device, used for the device-match check
    pub device_identifier: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Binding epoch the token was issued under
    pub epoch: i64,
}

impl Token {
    /// Check expiry against an injected instant
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Time left before expiry, zero once expired
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }
}

/// Everything a token repository needs to issue or rotate atomically
///
/// Both candidate keys are minted up front so the repository's critical
/// section never has to call back into key generation.
#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub user_id: UserId,
    pub device_id: DeviceId,
    pub device_identifier: String,
    /// Used when no row exists for the pair
    pub fresh_key: TokenKey,
    /// Used when the existing row has expired
    pub rotated_key: TokenKey,
    pub now: DateTime<Utc>,
    pub validity: Duration,
}

impl IssueRequest {
    /// Expiry given to a newly created or rotated row
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.now + self.validity
    }

    /// Row to insert when the pair has no usable token
    pub fn new_token(&self, epoch: i64) -> Token {
        Token {
            key: self.fresh_key.clone(),
            user_id: self.user_id,
            device_id: self.device_id,
            device_identifier: self.device_identifier.clone(),
            issued_at: self.now,
            expires_at: self.expires_at(),
            epoch,
        }
    }

    /// Replace an expired row's key and window, keeping the pair
    pub fn rotate(&self, existing: &Token, epoch: i64) -> Token {
        Token {
            key: self.rotated_key.clone(),
            user_id: existing.user_id,
            device_id: existing.device_id,
            device_identifier: existing.device_identifier.clone(),
            issued_at: self.now,
            expires_at: self.expires_at(),
            epoch: epoch.max(existing.epoch),
        }
    }

    /// Decide what the pair's row becomes, given the current binding epoch
    ///
    /// A row issued under an earlier epoch belongs to a device session the
    /// user has since left, so it is replaced by a new key rather than reused.
    pub fn resolve(&self, existing: Option<&Token>, epoch: i64) -> IssueOutcome {
        match existing {
            None => IssueOutcome::created(self.new_token(epoch)),
            Some(token) if token.epoch < epoch => IssueOutcome::created(self.new_token(epoch)),
            Some(token) if token.is_expired(self.now) => {
                IssueOutcome::rotated(self.rotate(token, epoch))
            }
            Some(token) => IssueOutcome::reused(token.clone()),
        }
    }
}

/// Result of an issue-or-rotate call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueOutcome {
    pub token: Token,
    /// A new row was inserted for the pair
    pub was_created: bool,
    /// An expired row received a new key and expiry
    pub was_rotated: bool,
}

impl IssueOutcome {
    pub fn created(token: Token) -> Self {
        Self {
            token,
            was_created: true,
            was_rotated: false,
        }
    }

    pub fn reused(token: Token) -> Self {
        Self {
            token,
            was_created: false,
            was_rotated: false,
        }
    }

    pub fn rotated(token: Token) -> Self {
        Self {
            token,
            was_created: false,
            was_rotated: true,
        }
    }
}
