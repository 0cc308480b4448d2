//! Token key - the opaque credential handed to a client
//!
//! A key is exactly [`TokenKey::LENGTH`] lowercase hex characters. Keys are
//! minted by truncating a fingerprint digest; they are never trusted as
//! self-certifying and are always checked against server-side storage.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Error when a string cannot be used as a token key
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenKeyError {
    #[error("token key must be {expected} characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("token key must contain only lowercase hex characters")]
    InvalidCharacter,
}

/// Fixed-length opaque token key
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TokenKey(String);

impl TokenKey {
    /// Number of characters in every key
    pub const LENGTH: usize = 40;

    /// Parse a key presented by a client
    pub fn parse(s: &str) -> Result<Self, TokenKeyError> {
        if s.len() != Self::LENGTH {
            return Err(TokenKeyError::InvalidLength {
                expected: Self::LENGTH,
                actual: s.len(),
            });
        }
        if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(TokenKeyError::InvalidCharacter);
        }
        Ok(Self(s.to_string()))
    }

    /// Build a key from a hex digest, keeping the first [`TokenKey::LENGTH`] characters
    pub fn from_digest(hex_digest: &str) -> Result<Self, TokenKeyError> {
        let digest = hex_digest.to_ascii_lowercase();
        match digest.get(..Self::LENGTH) {
            Some(prefix) => Self::parse(prefix),
            None => Err(TokenKeyError::InvalidLength {
                expected: Self::LENGTH,
                actual: digest.len(),
            }),
        }
    }

    /// Borrow the key as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key into its string form
    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Short prefix that is safe to put in logs
    pub fn fingerprint(&self) -> &str {
        &self.0[..8]
    }
}

// Keys are bearer secrets; keep them out of Debug output.
impl fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenKey({}…)", self.fingerprint())
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for TokenKey {
    type Err = TokenKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for TokenKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for TokenKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TokenKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
