//! Repository implementations backed by concurrent maps

mod device_store;
mod token_store;
mod user_store;

pub use device_store::MemoryDeviceRepository;
pub use token_store::MemoryTokenRepository;
pub use user_store::MemoryUserRepository;
