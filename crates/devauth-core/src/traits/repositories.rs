//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! (PostgreSQL in `devauth-db`, in-process maps in `devauth-memory`)
//! provides the implementation.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};

use crate::entities::{Binding, Device, DeviceRegistration, IssueOutcome, IssueRequest, Token, User};
use crate::error::DomainError;
use crate::value_objects::{DeviceId, TokenKey, UserId};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// User Repository
// ============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find an active user by ID
    async fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>>;

    /// Find an active user by normalized email
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    /// Create a new user
    async fn create(&self, user: &User, password_hash: &str) -> RepoResult<()>;

    /// Get password hash for credential verification
    async fn get_password_hash(&self, id: UserId) -> RepoResult<Option<String>>;

    /// Store the last-login time and the key issued by that login
    async fn record_login(
        &self,
        id: UserId,
        at: DateTime<FixedOffset>,
        active_token: &TokenKey,
    ) -> RepoResult<()>;

    /// Clear the active-token reference only if it still equals `key`
    ///
    /// Returns whether a reference was cleared.
    async fn clear_active_token_if(&self, id: UserId, key: &TokenKey) -> RepoResult<bool>;
}

// ============================================================================
// Device Repository
// ============================================================================

#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// Upsert the (user, identifier) row and make it the user's current device
    ///
    /// Both writes happen as one atomic unit per user.
    async fn bind(
        &self,
        user_id: UserId,
        registration: &DeviceRegistration,
        now: DateTime<Utc>,
    ) -> RepoResult<Device>;

    /// Identifier of the device the user most recently bound
    async fn current_device_of(&self, user_id: UserId) -> RepoResult<Option<String>>;

    /// The user's current-device pointer with its epoch
    async fn current_binding(&self, user_id: UserId) -> RepoResult<Option<Binding>>;

    /// All device rows retained for a user, newest first
    async fn find_by_user(&self, user_id: UserId) -> RepoResult<Vec<Device>>;

    /// Find a device row by ID
    async fn find_by_id(&self, id: DeviceId) -> RepoResult<Option<Device>>;
}

// ============================================================================
// Token Repository
// ============================================================================

#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Insert, reuse or rotate the token for `request`'s (user, device) pair
    ///
    /// Implementations read the user's binding, refuse with
    /// `DomainError::DeviceNotCurrent` when it points elsewhere, and then run
    /// `IssueRequest::resolve` against the pair's row as one atomic unit per
    /// pair. A lost insert race is resolved internally by treating the
    /// winner's row as the existing one; callers never see a conflict.
    async fn issue_or_rotate(&self, request: &IssueRequest) -> RepoResult<IssueOutcome>;

    /// Exact-match lookup by key
    async fn find_by_key(&self, key: &TokenKey) -> RepoResult<Option<Token>>;

    /// Token currently stored for a (user, device) pair
    async fn find_by_pair(&self, user_id: UserId, device_id: DeviceId) -> RepoResult<Option<Token>>;

    /// Delete by key, returning the removed row
    async fn delete_by_key(&self, key: &TokenKey) -> RepoResult<Option<Token>>;
}
