//! Capabilities consumed from outside the authentication core

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::value_objects::UserId;

use super::repositories::RepoResult;

/// Checks a submitted secret against whatever the user store holds
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// `Ok(false)` for a mismatch; `Err` only for infrastructure failures
    async fn verify(&self, user_id: UserId, secret: &str) -> RepoResult<bool>;
}

/// Source of the current time, injected so expiry is testable
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// One-way, deterministic digest used to mint token keys
pub trait FingerprintHasher: Send + Sync {
    /// Lowercase hex digest of `input`
    fn digest(&self, input: &[u8]) -> String;
}
