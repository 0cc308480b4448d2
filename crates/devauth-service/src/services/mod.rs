//! Business logic services
//!
//! `AuthService` is the entry point surrounding code calls. `TokenStore` and
//! `DeviceRegistry` are the components it orchestrates; both are public so
//! embedders can inspect tokens and device history directly.

pub mod auth;
pub mod context;
pub mod device;
pub mod error;
pub mod token;

// Re-export all services for convenience
pub use auth::AuthService;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use device::DeviceRegistry;
pub use error::{ServiceError, ServiceResult};
pub use token::TokenStore;
