//! Ports implemented by the storage crates and external collaborators

mod collaborators;
mod repositories;

pub use collaborators::{Clock, CredentialVerifier, FingerprintHasher};
pub use repositories::{DeviceRepository, RepoResult, TokenRepository, UserRepository};
