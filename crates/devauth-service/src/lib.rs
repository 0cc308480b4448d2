//! # devauth-service
//!
//! Application layer: login, token validation and logout over pluggable
//! storage, plus the request and response DTOs an HTTP layer would expose.
//!
//! ## Example
//!
//! ```rust,ignore
//! use devauth_service::{AuthService, LoginRequest, ServiceContextBuilder};
//!
//! let ctx = ServiceContextBuilder::in_memory().build()?;
//! let response = AuthService::new(&ctx)
//!     .login(LoginRequest::new("kim@example.com", "secret", "phoneA"))
//!     .await?;
//! ```

pub mod dto;
pub mod services;

pub use dto::{DeviceRequest, DeviceResponse, LoginRequest, LoginResponse, UserResponse};
pub use services::{
    AuthService, DeviceRegistry, ServiceContext, ServiceContextBuilder, ServiceError,
    ServiceResult, TokenStore,
};
