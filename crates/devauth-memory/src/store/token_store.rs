//! In-process token storage
//!
//! Each (user, device) pair holding a token owns a slot guarded by its own
//! async mutex. The key index is only written while the owning slot is held,
//! so a slot and the index never disagree about which key a pair holds. A
//! slot is dropped from the map once it is emptied, under its own guard.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use devauth_core::{
    DeviceId, DomainError, IssueOutcome, IssueRequest, RepoResult, Token, TokenKey,
    TokenRepository, UserId,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use super::device_store::MemoryDeviceRepository;

type Pair = (UserId, DeviceId);
type Slot = Arc<Mutex<Option<Token>>>;
type SlotGuard = OwnedMutexGuard<Option<Token>>;

/// `TokenRepository` with per-pair mutual exclusion
#[derive(Debug)]
pub struct MemoryTokenRepository {
    devices: Arc<MemoryDeviceRepository>,
    slots: DashMap<Pair, Slot>,
    keys: DashMap<TokenKey, Token>,
}

impl MemoryTokenRepository {
    /// Token storage that checks bindings held by `devices`
    #[must_use]
    pub fn new(devices: Arc<MemoryDeviceRepository>) -> Self {
        Self {
            devices,
            slots: DashMap::new(),
            keys: DashMap::new(),
        }
    }

    /// Number of stored tokens across all pairs
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Lock the live slot for `pair`, creating it if needed
    async fn lock(&self, pair: Pair) -> (Slot, SlotGuard) {
        loop {
            // Clone the Arc out so the shard lock is released before awaiting
            let slot = self.slots.entry(pair).or_default().clone();
            let guard = Arc::clone(&slot).lock_owned().await;

            // The slot may have been emptied and dropped while we waited
            if self
                .slots
                .get(&pair)
                .is_some_and(|live| Arc::ptr_eq(live.value(), &slot))
            {
                return (slot, guard);
            }
        }
    }

    /// Drop `slot` from the map if it is empty; the caller holds its guard
    fn vacate_if_empty(&self, pair: Pair, slot: &Slot, current: &SlotGuard) {
        if current.is_none() {
            self.slots.remove_if(&pair, |_, live| Arc::ptr_eq(live, slot));
        }
    }

    /// Claim `token.key` in the global index
    fn index(&self, token: &Token) -> RepoResult<()> {
        match self.keys.entry(token.key.clone()) {
            Entry::Occupied(_) => Err(DomainError::StorageConflict(format!(
                "token key {} already in use",
                token.key.fingerprint()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(token.clone());
                Ok(())
            }
        }
    }
}

#[async_trait]
impl TokenRepository for MemoryTokenRepository {
    async fn issue_or_rotate(&self, request: &IssueRequest) -> RepoResult<IssueOutcome> {
        let pair = (request.user_id, request.device_id);
        let (slot, mut current) = self.lock(pair).await;

        // No awaits from here on: every write happens under the pair's guard
        let binding = self
            .devices
            .binding(request.user_id)
            .filter(|b| b.device_id == request.device_id);
        let Some(binding) = binding else {
            self.vacate_if_empty(pair, &slot, &current);
            return Err(DomainError::DeviceNotCurrent(request.device_id));
        };

        let outcome = request.resolve(current.as_ref(), binding.epoch);
        if current.as_ref() == Some(&outcome.token) {
            return Ok(outcome);
        }

        if let Err(e) = self.index(&outcome.token) {
            self.vacate_if_empty(pair, &slot, &current);
            return Err(e);
        }
        if let Some(previous) = current.as_ref() {
            self.keys.remove(&previous.key);
        }
        *current = Some(outcome.token.clone());
        debug!(
            user_id = %request.user_id,
            device_id = %request.device_id,
            epoch = binding.epoch,
            created = outcome.was_created,
            rotated = outcome.was_rotated,
            "Stored token"
        );
        Ok(outcome)
    }

    async fn find_by_key(&self, key: &TokenKey) -> RepoResult<Option<Token>> {
        Ok(self.keys.get(key).map(|entry| entry.value().clone()))
    }

    async fn find_by_pair(&self, user_id: UserId, device_id: DeviceId) -> RepoResult<Option<Token>> {
        let Some(slot) = self.slots.get(&(user_id, device_id)).map(|s| Arc::clone(s.value())) else {
            return Ok(None);
        };
        let current = slot.lock().await;
        Ok(current.clone())
    }

    async fn delete_by_key(&self, key: &TokenKey) -> RepoResult<Option<Token>> {
        let Some(pair) = self.keys.get(key).map(|t| (t.user_id, t.device_id)) else {
            return Ok(None);
        };

        let (slot, mut current) = self.lock(pair).await;

        // The pair may have moved on from `key` while we waited
        let removed = if current.as_ref().is_some_and(|t| &t.key == key) {
            self.keys.remove(key);
            current.take()
        } else {
            None
        };
        self.vacate_if_empty(pair, &slot, &current);
        Ok(removed)
    }
}
