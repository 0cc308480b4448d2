//! Device entity - one physical client a user has signed in from

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::Token;
use crate::value_objects::{DeviceId, UserId};

/// Longest client-supplied device identifier accepted
pub const MAX_DEVICE_IDENTIFIER_LEN: usize = 255;

/// A device row. Rows are never deleted when the user moves to another device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: DeviceId,
    /// Owner; fixed at creation
    pub user_id: UserId,
    /// Client-supplied identifier, unique per user only
    pub identifier: String,
    pub os: Option<String>,
    pub os_version: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user's current-device pointer
///
/// `epoch` starts at 1 and grows by one each time the pointer moves to a
/// different device. Re-binding the current device leaves it unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub device_id: DeviceId,
    pub epoch: i64,
}

impl Binding {
    /// First binding for a user
    pub fn first(device_id: DeviceId) -> Self {
        Self { device_id, epoch: 1 }
    }

    /// Point at `device_id`, starting a new epoch only when the device differs
    #[must_use]
    pub fn rebind(self, device_id: DeviceId) -> Self {
        if self.device_id == device_id {
            self
        } else {
            Self {
                device_id,
                epoch: self.epoch + 1,
            }
        }
    }

    /// Whether `token` was issued under this exact binding
    pub fn covers(&self, token: &Token) -> bool {
        self.device_id == token.device_id && self.epoch == token.epoch
    }
}

/// What a client reports about itself when signing in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRegistration {
    pub identifier: String,
    pub os: Option<String>,
    pub os_version: Option<String>,
}

impl DeviceRegistration {
    /// Build a registration, trimming the identifier
    ///
    /// Returns `None` when the identifier is blank or longer than
    /// [`MAX_DEVICE_IDENTIFIER_LEN`].
    pub fn new(
        identifier: &str,
        os: Option<String>,
        os_version: Option<String>,
    ) -> Option<Self> {
        let identifier = identifier.trim();
        if identifier.is_empty() || identifier.len() > MAX_DEVICE_IDENTIFIER_LEN {
            return None;
        }

        Some(Self {
            identifier: identifier.to_string(),
            os: os.filter(|s| !s.trim().is_empty()),
            os_version: os_version.filter(|s| !s.trim().is_empty()),
        })
    }
}

impl Device {
    /// Create the first row for a (user, identifier) pair
    pub fn register(
        id: DeviceId,
        user_id: UserId,
        registration: &DeviceRegistration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            identifier: registration.identifier.clone(),
            os: registration.os.clone(),
            os_version: registration.os_version.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh OS metadata from a repeat login. Ownership and identifier never change.
    pub fn refresh(&mut self, registration: &DeviceRegistration, now: DateTime<Utc>) {
        self.os.clone_from(&registration.os);
        self.os_version.clone_from(&registration.os_version);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_trims_identifier() {
        let reg = DeviceRegistration::new("  phoneA ", Some("iOS".into()), None).unwrap();
        assert_eq!(reg.identifier, "phoneA");
        assert_eq!(reg.os.as_deref(), Some("iOS"));
    }

    #[test]
    fn test_registration_rejects_blank_identifier() {
        assert!(DeviceRegistration::new("   ", None, None).is_none());
        assert!(DeviceRegistration::new("", None, None).is_none());
    }

    #[test]
    fn test_registration_rejects_oversized_identifier() {
        let long = "x".repeat(MAX_DEVICE_IDENTIFIER_LEN + 1);
        assert!(DeviceRegistration::new(&long, None, None).is_none());
    }

    #[test]
    fn test_registration_drops_blank_metadata() {
        let reg = DeviceRegistration::new("phoneA", Some(" ".into()), Some(String::new())).unwrap();
        assert!(reg.os.is_none());
        assert!(reg.os_version.is_none());
    }

    #[test]
    fn test_rebind_bumps_epoch_only_on_move() {
        let a = Binding::first(DeviceId::new(1));
        assert_eq!(a.rebind(DeviceId::new(1)), a);

        let b = a.rebind(DeviceId::new(2));
        assert_eq!(b.epoch, 2);

        let a_again = b.rebind(DeviceId::new(1));
        assert_eq!(a_again.device_id, a.device_id);
        assert_eq!(a_again.epoch, 3);
    }

    #[test]
    fn test_refresh_keeps_owner_and_identifier() {
        let now = Utc::now();
        let first = DeviceRegistration::new("phoneA", Some("Android".into()), Some("13".into())).unwrap();
        let mut device = Device::register(DeviceId::new(7), UserId::new(1), &first, now);

        let later = now + chrono::Duration::minutes(5);
        let second = DeviceRegistration::new("phoneA", Some("Android".into()), Some("14".into())).unwrap();
        device.refresh(&second, later);

        assert_eq!(device.user_id, UserId::new(1));
        assert_eq!(device.identifier, "phoneA");
        assert_eq!(device.os_version.as_deref(), Some("14"));
        assert_eq!(device.created_at, now);
        assert_eq!(device.updated_at, later);
    }
}
