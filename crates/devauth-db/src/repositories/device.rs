//! PostgreSQL implementation of DeviceRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use devauth_core::{
    Binding, Device, DeviceId, DeviceRegistration, DeviceRepository, DomainError, RepoResult,
    UserId,
};

use crate::models::{BindingModel, DeviceModel};

use super::error::map_db_error;

/// PostgreSQL implementation of DeviceRepository
#[derive(Clone)]
pub struct PgDeviceRepository {
    pool: PgPool,
}

impl PgDeviceRepository {
    /// Create a new PgDeviceRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceRepository for PgDeviceRepository {
    #[instrument(skip(self, registration), fields(identifier = %registration.identifier))]
    async fn bind(
        &self,
        user_id: UserId,
        registration: &DeviceRegistration,
        now: DateTime<Utc>,
    ) -> RepoResult<Device> {
        if registration.identifier.trim().is_empty() {
            return Err(DomainError::InvalidDeviceIdentifier);
        }

        // Upsert and re-point in one transaction so readers never see one without the other
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let model = sqlx::query_as::<_, DeviceModel>(
            r"
            INSERT INTO devices (user_id, identifier, os, os_version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (user_id, identifier) DO UPDATE
            SET os = EXCLUDED.os, os_version = EXCLUDED.os_version, updated_at = EXCLUDED.updated_at
            RETURNING id, user_id, identifier, os, os_version, created_at, updated_at
            ",
        )
        .bind(user_id.into_inner())
        .bind(&registration.identifier)
        .bind(&registration.os)
        .bind(&registration.os_version)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        // SET expressions read the pre-update row, so the epoch compares the old device
        let epoch = sqlx::query_scalar::<_, i64>(
            r"
            INSERT INTO device_bindings (user_id, device_id, epoch, bound_at)
            VALUES ($1, $2, 1, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET device_id = EXCLUDED.device_id,
                epoch = CASE
                    WHEN device_bindings.device_id = EXCLUDED.device_id THEN device_bindings.epoch
                    ELSE device_bindings.epoch + 1
                END,
                bound_at = EXCLUDED.bound_at
            RETURNING epoch
            ",
        )
        .bind(user_id.into_inner())
        .bind(model.id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        debug!(device_id = model.id, epoch, "Bound current device");
        Ok(Device::from(model))
    }

    #[instrument(skip(self))]
    async fn current_device_of(&self, user_id: UserId) -> RepoResult<Option<String>> {
        let result = sqlx::query_scalar::<_, String>(
            r"
            SELECT d.identifier
            FROM device_bindings b
            JOIN devices d ON d.id = b.device_id
            WHERE b.user_id = $1
            ",
        )
        .bind(user_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result)
    }

    #[instrument(skip(self))]
    async fn current_binding(&self, user_id: UserId) -> RepoResult<Option<Binding>> {
        let result = sqlx::query_as::<_, BindingModel>(
            "SELECT device_id, epoch FROM device_bindings WHERE user_id = $1",
        )
        .bind(user_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Binding::from))
    }

    #[instrument(skip(self))]
    async fn find_by_user(&self, user_id: UserId) -> RepoResult<Vec<Device>> {
        let rows = sqlx::query_as::<_, DeviceModel>(
            r"
            SELECT id, user_id, identifier, os, os_version, created_at, updated_at
            FROM devices
            WHERE user_id = $1
            ORDER BY updated_at DESC, id DESC
            ",
        )
        .bind(user_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(Device::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: DeviceId) -> RepoResult<Option<Device>> {
        let result = sqlx::query_as::<_, DeviceModel>(
            r"
            SELECT id, user_id, identifier, os, os_version, created_at, updated_at
            FROM devices
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Device::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgDeviceRepository>();
    }
}
