//! Password hashing and verification utilities
//!
//! Uses Argon2id for secure password hashing (OWASP recommended).

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use devauth_core::{CredentialVerifier, RepoResult, UserId, UserRepository};
use tracing::warn;

use crate::error::AppError;

/// Hash a password using Argon2id
///
/// # Errors
/// Returns an error if hashing fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {e}")))
}

/// Verify a password against a hash
///
/// # Errors
/// Returns an error if the hash is not a valid PHC string
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Credential verifier backed by Argon2 hashes held in the user store
#[derive(Clone)]
pub struct Argon2CredentialVerifier {
    users: Arc<dyn UserRepository>,
}

impl Argon2CredentialVerifier {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

impl std::fmt::Debug for Argon2CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2CredentialVerifier").finish_non_exhaustive()
    }
}

#[async_trait]
impl CredentialVerifier for Argon2CredentialVerifier {
    async fn verify(&self, user_id: UserId, secret: &str) -> RepoResult<bool> {
        let Some(hash) = self.users.get_password_hash(user_id).await? else {
            return Ok(false);
        };

        // A corrupt stored hash must not look different from a wrong password
        match verify_password(secret, &hash) {
            Ok(matched) => Ok(matched),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Stored password hash is malformed");
                Ok(false)
            }
        }
    }
}
