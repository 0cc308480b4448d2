//! # devauth-memory
//!
//! In-process storage backend for embedding and tests.
//!
//! ## Features
//!
//! - **Users**: accounts indexed by id and normalized email, with soft delete
//! - **Devices**: per-user device rows and the current-device pointer with its epoch
//! - **Tokens**: one token per (user, device), guarded by a per-pair async mutex
//! - **Clock**: [`ManualClock`] for deterministic expiry
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use devauth_memory::{MemoryDeviceRepository, MemoryTokenRepository, MemoryUserRepository};
//!
//! let users = Arc::new(MemoryUserRepository::new());
//! let devices = Arc::new(MemoryDeviceRepository::new());
//! let tokens = Arc::new(MemoryTokenRepository::new(Arc::clone(&devices)));
//! ```

pub mod clock;
pub mod store;

pub use clock::ManualClock;
pub use store::{MemoryDeviceRepository, MemoryTokenRepository, MemoryUserRepository};
