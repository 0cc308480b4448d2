//! # devauth-core
//!
//! Domain layer for device-bound authentication: users, devices, tokens,
//! lifecycle outcomes and the repository traits storage backends implement.
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod entities;
pub mod error;
pub mod outcomes;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{Binding, Device, DeviceRegistration, IssueOutcome, IssueRequest, Token, User};
pub use error::DomainError;
pub use outcomes::{LogoutOutcome, Validation};
pub use traits::{
    Clock, CredentialVerifier, DeviceRepository, FingerprintHasher, RepoResult, TokenRepository,
    UserRepository,
};
pub use value_objects::{DeviceId, IdParseError, TokenKey, TokenKeyError, UserId};
