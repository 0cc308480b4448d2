//! Authentication utilities

mod clock;
mod fingerprint;
mod header;
mod password;

pub use clock::SystemClock;
pub use fingerprint::Sha256Hasher;
pub use header::{parse_authorization_header, AuthHeaderError, TOKEN_SCHEME};
pub use password::{hash_password, verify_password, Argon2CredentialVerifier};
