//! Device registry
//!
//! Tracks which device identifiers belong to a user and which one is current.

use devauth_core::{Binding, Device, DeviceRegistration, Token, UserId};
use tracing::{info, instrument};

use crate::dto::DeviceResponse;

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Device registry
pub struct DeviceRegistry<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> DeviceRegistry<'a> {
    /// Create a new DeviceRegistry
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Upsert the device row and make it the user's current device
    #[instrument(skip(self, os, os_version), fields(user_id = %user_id))]
    pub async fn bind(
        &self,
        user_id: UserId,
        identifier: &str,
        os: Option<String>,
        os_version: Option<String>,
    ) -> ServiceResult<Device> {
        let registration = DeviceRegistration::new(identifier, os, os_version).ok_or_else(|| {
            ServiceError::validation("device identifier must be 1-255 characters")
        })?;

        let previous = self.current_device_of(user_id).await?;
        let now = self.ctx.clock().now();
        let device = self
            .ctx
            .storage("bind", self.ctx.device_repo().bind(user_id, &registration, now))
            .await?;

        if let Some(previous) = previous.filter(|p| *p != device.identifier) {
            info!(from = %previous, to = %device.identifier, "Current device changed");
        }
        Ok(device)
    }

    /// Identifier of the user's current device
    pub async fn current_device_of(&self, user_id: UserId) -> ServiceResult<Option<String>> {
        self.ctx
            .storage("current_device_of", self.ctx.device_repo().current_device_of(user_id))
            .await
    }

    /// The user's current-device pointer with its epoch
    pub async fn current_binding(&self, user_id: UserId) -> ServiceResult<Option<Binding>> {
        self.ctx
            .storage("current_binding", self.ctx.device_repo().current_binding(user_id))
            .await
    }

    /// Whether `identifier` is the user's current device
    pub async fn matches(&self, user_id: UserId, identifier: &str) -> ServiceResult<bool> {
        Ok(self.current_device_of(user_id).await?.as_deref() == Some(identifier))
    }

    /// Whether `token` was issued under the user's current binding
    ///
    /// Stricter than [`matches`](Self::matches): a token from an earlier
    /// visit to the same device fails, because the epoch has moved on.
    pub async fn still_bound(&self, token: &Token) -> ServiceResult<bool> {
        Ok(self
            .current_binding(token.user_id)
            .await?
            .is_some_and(|binding| binding.covers(token)))
    }

    /// Retained device rows, newest first
    pub async fn devices_of(&self, user_id: UserId) -> ServiceResult<Vec<Device>> {
        self.ctx
            .storage("find_by_user", self.ctx.device_repo().find_by_user(user_id))
            .await
    }

    /// Device history with the current device flagged
    pub async fn list(&self, user_id: UserId) -> ServiceResult<Vec<DeviceResponse>> {
        let current = self.current_device_of(user_id).await?;
        let devices = self.devices_of(user_id).await?;
        Ok(devices
            .iter()
            .map(|d| DeviceResponse::new(d, current.as_deref()))
            .collect())
    }
}
