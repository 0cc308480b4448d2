//! SHA-256 fingerprint hasher used to mint token keys

use devauth_core::FingerprintHasher;
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl FingerprintHasher for Sha256Hasher {
    fn digest(&self, input: &[u8]) -> String {
        hex::encode(Sha256::digest(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            Sha256Hasher.digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_digest_is_deterministic() {
        let a = Sha256Hasher.digest(b"kim@example.com|1|phone-a");
        let b = Sha256Hasher.digest(b"kim@example.com|1|phone-a");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, Sha256Hasher.digest(b"kim@example.com|1|phone-b"));
    }
}
