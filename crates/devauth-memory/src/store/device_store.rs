//! In-process device registry storage
//!
//! All rows of one user live under a single map entry, so holding that
//! entry makes `bind` atomic per user. The binding is also readable
//! synchronously, which lets the token store check it under its own locks.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use devauth_core::{
    Binding, Device, DeviceId, DeviceRegistration, DeviceRepository, DomainError, RepoResult,
    UserId,
};
use tracing::debug;

#[derive(Debug, Default)]
struct UserDevices {
    rows: Vec<Device>,
    current: Option<Binding>,
}

impl UserDevices {
    fn current_identifier(&self) -> Option<String> {
        let binding = self.current?;
        self.rows
            .iter()
            .find(|d| d.id == binding.device_id)
            .map(|d| d.identifier.clone())
    }
}

/// `DeviceRepository` keyed by owning user
#[derive(Debug)]
pub struct MemoryDeviceRepository {
    users: DashMap<UserId, UserDevices>,
    next_id: AtomicI64,
}

impl Default for MemoryDeviceRepository {
    fn default() -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl MemoryDeviceRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current binding without going through the async trait
    pub fn binding(&self, user_id: UserId) -> Option<Binding> {
        self.users.get(&user_id).and_then(|devices| devices.current)
    }
}

#[async_trait]
impl DeviceRepository for MemoryDeviceRepository {
    async fn bind(
        &self,
        user_id: UserId,
        registration: &DeviceRegistration,
        now: DateTime<Utc>,
    ) -> RepoResult<Device> {
        if registration.identifier.trim().is_empty() {
            return Err(DomainError::InvalidDeviceIdentifier);
        }

        // The entry guard is held until the end of this scope
        let mut devices = self.users.entry(user_id).or_default();

        let device = match devices
            .rows
            .iter_mut()
            .find(|d| d.identifier == registration.identifier)
        {
            Some(existing) => {
                existing.refresh(registration, now);
                existing.clone()
            }
            None => {
                let id = DeviceId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
                let device = Device::register(id, user_id, registration, now);
                devices.rows.push(device.clone());
                device
            }
        };

        let binding = match devices.current {
            Some(current) => current.rebind(device.id),
            None => Binding::first(device.id),
        };
        devices.current = Some(binding);
        debug!(user_id = %user_id, device_id = %device.id, epoch = binding.epoch, "Bound current device");

        Ok(device)
    }

    async fn current_device_of(&self, user_id: UserId) -> RepoResult<Option<String>> {
        Ok(self
            .users
            .get(&user_id)
            .and_then(|devices| devices.current_identifier()))
    }

    async fn current_binding(&self, user_id: UserId) -> RepoResult<Option<Binding>> {
        Ok(self.binding(user_id))
    }

    async fn find_by_user(&self, user_id: UserId) -> RepoResult<Vec<Device>> {
        let mut rows = self
            .users
            .get(&user_id)
            .map(|devices| devices.rows.clone())
            .unwrap_or_default();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn find_by_id(&self, id: DeviceId) -> RepoResult<Option<Device>> {
        Ok(self
            .users
            .iter()
            .find_map(|devices| devices.rows.iter().find(|d| d.id == id).cloned()))
    }
}
