//! Device entity <-> model mapper

use devauth_core::{Binding, Device, DeviceId, UserId};

use crate::models::{BindingModel, DeviceModel};

/// Convert DeviceModel to Device entity
impl From<DeviceModel> for Device {
    fn from(model: DeviceModel) -> Self {
        Device {
            id: DeviceId::new(model.id),
            user_id: UserId::new(model.user_id),
            identifier: model.identifier,
            os: model.os,
            os_version: model.os_version,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<BindingModel> for Binding {
    fn from(model: BindingModel) -> Self {
        Binding {
            device_id: DeviceId::new(model.device_id),
            epoch: model.epoch,
        }
    }
}
