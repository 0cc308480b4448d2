//! Data transfer objects for requests and responses
//!
//! This module provides:
//! - Request DTOs with presence validation
//! - Response DTOs for serializing outputs
//! - Mappers for converting domain entities to DTOs

pub mod mappers;
pub mod requests;
pub mod responses;

pub use requests::{DeviceRequest, LoginRequest};
pub use responses::{DeviceResponse, LoginResponse, UserResponse};
