//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in devauth-core.
//! Each repository handles database operations for a specific domain entity.

mod device;
mod error;
mod token;
mod user;

pub use device::PgDeviceRepository;
pub use token::PgTokenRepository;
pub use user::PgUserRepository;
