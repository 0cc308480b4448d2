//! Domain entities - core business objects

mod device;
mod token;
mod user;

pub use device::{Binding, Device, DeviceRegistration, MAX_DEVICE_IDENTIFIER_LEN};
pub use token::{IssueOutcome, IssueRequest, Token};
pub use user::User;
