//! Token store
//!
//! Mints keys and drives the per-(user, device) issue, lookup and revoke
//! operations against the token repository.

use chrono::{DateTime, Utc};
use devauth_core::{
    Device, DomainError, IssueOutcome, IssueRequest, LogoutOutcome, Token, TokenKey, User,
};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Token lifecycle operations
pub struct TokenStore<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> TokenStore<'a> {
    /// Create a new TokenStore
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Issue a token for the pair, reuse a live one, or rotate an expired one
    #[instrument(skip(self, user, device), fields(user_id = %user.id, device_id = %device.id))]
    pub async fn issue_or_rotate(&self, user: &User, device: &Device) -> ServiceResult<IssueOutcome> {
        let now = self.ctx.clock().now();
        let fingerprint = Self::fingerprint(user, device);

        let request = IssueRequest {
            user_id: user.id,
            device_id: device.id,
            device_identifier: device.identifier.clone(),
            fresh_key: self.mint(&format!("{fingerprint}|{}", Uuid::new_v4()))?,
            rotated_key: self.mint(&format!(
                "{fingerprint}|{}|{}",
                now.timestamp_nanos_opt().unwrap_or_default(),
                Uuid::new_v4()
            ))?,
            now,
            validity: self.ctx.auth().validity(),
        };

        let outcome = self
            .ctx
            .storage("issue_or_rotate", self.ctx.token_repo().issue_or_rotate(&request))
            .await
            .map_err(|e| match e {
                // Another login moved the binding between our bind and this issue
                ServiceError::Domain(DomainError::DeviceNotCurrent(_)) => ServiceError::DeviceChanged,
                other => other,
            })?;

        debug!(
            key = outcome.token.key.fingerprint(),
            created = outcome.was_created,
            rotated = outcome.was_rotated,
            remaining_secs = outcome.token.remaining(now).num_seconds(),
            "Token issued"
        );
        Ok(outcome)
    }

    /// Exact-match lookup
    pub async fn lookup(&self, key: &TokenKey) -> ServiceResult<Option<Token>> {
        self.ctx
            .storage("find_by_key", self.ctx.token_repo().find_by_key(key))
            .await
    }

    /// Delete the row for `key`, returning it if this call removed it
    pub async fn remove(&self, key: &TokenKey) -> ServiceResult<Option<Token>> {
        self.ctx
            .storage("delete_by_key", self.ctx.token_repo().delete_by_key(key))
            .await
    }

    /// Delete the row for `key`; repeating the call reports `NotFound`
    pub async fn revoke(&self, key: &TokenKey) -> ServiceResult<LogoutOutcome> {
        Ok(match self.remove(key).await? {
            Some(_) => LogoutOutcome::Revoked,
            None => LogoutOutcome::NotFound,
        })
    }

    /// Whether `token` is past its window at `now`
    #[inline]
    pub fn is_expired(token: &Token, now: DateTime<Utc>) -> bool {
        token.is_expired(now)
    }

    /// Stable identity of the (user, device) pair that keys are derived from
    fn fingerprint(user: &User, device: &Device) -> String {
        format!(
            "{}|{}|{}",
            User::normalize_email(&user.email),
            user.id,
            device.identifier
        )
    }

    fn mint(&self, material: &str) -> ServiceResult<TokenKey> {
        let digest = self.ctx.hasher().digest(material.as_bytes());
        TokenKey::from_digest(&digest).map_err(|e| ServiceError::from(DomainError::from(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Duration;
    use devauth_core::{Clock, UserId};
    use devauth_memory::ManualClock;

    use crate::services::context::ServiceContextBuilder;
    use crate::services::device::DeviceRegistry;

    fn setup() -> (ServiceContext, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let ctx = ServiceContextBuilder::in_memory()
            .clock(clock.clone())
            .build()
            .unwrap();
        (ctx, clock)
    }

    fn user() -> User {
        User::new(UserId::new(1), "kim".to_string(), "Kim@Example.com")
    }

    /// Bind `identifier` as the user's current device
    async fn device(ctx: &ServiceContext, identifier: &str) -> Device {
        DeviceRegistry::new(ctx)
            .bind(UserId::new(1), identifier, None, None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_issue_then_reuse() {
        let (ctx, _) = setup();
        let store = TokenStore::new(&ctx);
        let phone = device(&ctx, "phoneA").await;

        let first = store.issue_or_rotate(&user(), &phone).await.unwrap();
        let second = store.issue_or_rotate(&user(), &phone).await.unwrap();

        assert!(first.was_created);
        assert!(!second.was_created);
        assert_eq!(first.token.key, second.token.key);
        assert_eq!(first.token.key.as_str().len(), TokenKey::LENGTH);
    }

    #[tokio::test]
    async fn test_expired_token_rotates_to_new_key() {
        let (ctx, clock) = setup();
        let store = TokenStore::new(&ctx);
        let phone = device(&ctx, "phoneA").await;

        let first = store.issue_or_rotate(&user(), &phone).await.unwrap();
        clock.advance(Duration::days(7));
        let rotated = store.issue_or_rotate(&user(), &phone).await.unwrap();

        assert!(rotated.was_rotated);
        assert_ne!(rotated.token.key, first.token.key);
        assert_eq!(rotated.token.expires_at, clock.now() + Duration::days(7));
        assert!(store.lookup(&first.token.key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_separate_devices_get_separate_keys() {
        let (ctx, _) = setup();
        let store = TokenStore::new(&ctx);

        let a = store.issue_or_rotate(&user(), &device(&ctx, "phoneA").await).await.unwrap();
        let b = store.issue_or_rotate(&user(), &device(&ctx, "phoneB").await).await.unwrap();
        assert!(a.was_created && b.was_created);
        assert_ne!(a.token.key, b.token.key);
    }

    #[tokio::test]
    async fn test_return_visit_gets_a_new_key() {
        let (ctx, _) = setup();
        let store = TokenStore::new(&ctx);

        let phone_a = device(&ctx, "phoneA").await;
        let first = store.issue_or_rotate(&user(), &phone_a).await.unwrap();
        device(&ctx, "phoneB").await;
        let phone_a = device(&ctx, "phoneA").await;
        let second = store.issue_or_rotate(&user(), &phone_a).await.unwrap();

        assert!(second.was_created);
        assert_ne!(second.token.key, first.token.key);
        assert!(store.lookup(&first.token.key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_issue_after_binding_moved_is_device_changed() {
        let (ctx, _) = setup();
        let store = TokenStore::new(&ctx);

        let phone_a = device(&ctx, "phoneA").await;
        device(&ctx, "phoneB").await;

        let err = store.issue_or_rotate(&user(), &phone_a).await.unwrap_err();
        assert!(matches!(err, ServiceError::DeviceChanged));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_revoke_twice() {
        let (ctx, _) = setup();
        let store = TokenStore::new(&ctx);
        let issued = store.issue_or_rotate(&user(), &device(&ctx, "phoneA").await).await.unwrap();

        assert_eq!(store.revoke(&issued.token.key).await.unwrap(), LogoutOutcome::Revoked);
        assert_eq!(store.revoke(&issued.token.key).await.unwrap(), LogoutOutcome::NotFound);
        assert!(store.lookup(&issued.token.key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_is_expired_uses_injected_time() {
        let (ctx, clock) = setup();
        let store = TokenStore::new(&ctx);
        let token = store
            .issue_or_rotate(&user(), &device(&ctx, "phoneA").await)
            .await
            .unwrap()
            .token;

        assert!(!TokenStore::is_expired(&token, clock.now()));
        assert!(TokenStore::is_expired(&token, token.expires_at));
    }
}
