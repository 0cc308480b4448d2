//! In-process user store

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use devauth_core::{DomainError, RepoResult, TokenKey, User, UserId, UserRepository};

#[derive(Debug, Clone)]
struct UserRecord {
    user: User,
    password_hash: String,
}

/// `UserRepository` over two `DashMap`s: rows by id, ids by normalized email
#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: DashMap<UserId, UserRecord>,
    emails: DashMap<String, UserId>,
}

impl MemoryUserRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Soft-delete a user. Returns `false` if no active user had that id.
    pub fn soft_delete(&self, id: UserId) -> bool {
        match self.users.get_mut(&id) {
            Some(mut record) if record.user.is_active() => {
                record.user.is_deleted = true;
                record.user.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }

    fn active(&self, id: UserId) -> Option<User> {
        self.users
            .get(&id)
            .map(|record| record.user.clone())
            .filter(User::is_active)
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        Ok(self.active(id))
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let email = User::normalize_email(email);
        let Some(id) = self.emails.get(&email).map(|entry| *entry) else {
            return Ok(None);
        };
        Ok(self.active(id))
    }

    async fn create(&self, user: &User, password_hash: &str) -> RepoResult<()> {
        if self.users.contains_key(&user.id) {
            return Err(DomainError::ValidationError(format!(
                "User id already exists: {}",
                user.id
            )));
        }

        match self.emails.entry(User::normalize_email(&user.email)) {
            Entry::Occupied(_) => Err(DomainError::ValidationError(format!(
                "Email already registered: {}",
                user.email
            ))),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(
                    user.id,
                    UserRecord {
                        user: user.clone(),
                        password_hash: password_hash.to_string(),
                    },
                );
                Ok(())
            }
        }
    }

    async fn get_password_hash(&self, id: UserId) -> RepoResult<Option<String>> {
        Ok(self
            .users
            .get(&id)
            .filter(|record| record.user.is_active())
            .map(|record| record.password_hash.clone()))
    }

    async fn record_login(
        &self,
        id: UserId,
        at: DateTime<FixedOffset>,
        active_token: &TokenKey,
    ) -> RepoResult<()> {
        let mut record = self
            .users
            .get_mut(&id)
            .filter(|record| record.user.is_active())
            .ok_or(DomainError::UserNotFound(id))?;

        record.user.last_login = Some(at);
        record.user.active_token = Some(active_token.clone());
        record.user.updated_at = at.with_timezone(&Utc);
        Ok(())
    }

    async fn clear_active_token_if(&self, id: UserId, key: &TokenKey) -> RepoResult<bool> {
        let Some(mut record) = self.users.get_mut(&id) else {
            return Ok(false);
        };

        if record.user.holds_token(key) {
            record.user.active_token = None;
            record.user.updated_at = Utc::now();
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
