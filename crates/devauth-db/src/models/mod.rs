//! Database models - SQLx-compatible structs for PostgreSQL tables

mod device;
mod token;
mod user;

pub use device::{BindingModel, DeviceModel};
pub use token::TokenModel;
pub use user::UserModel;
