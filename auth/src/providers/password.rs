//! Password hashing.

use crate::error::{AuthError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use constant_time_eq::constant_time_eq;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Hashes passwords for storage and checks candidates against them.
pub trait PasswordHasher: Send + Sync {
    /// Hash `password` for storage.
    fn hash(&self, password: &str) -> String;

    /// Check `password` against a stored hash.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedHash`] if `stored` was not produced by
    /// this hasher.
    fn verify(&self, password: &str, stored: &str) -> Result<bool>;
}

const SCHEME: &str = "sha256";
const SALT_LEN: usize = 16;

/// Salted, iterated SHA-256.
///
/// Hashes are stored as `sha256$<rounds>$<salt>$<digest>` with base64
/// salt and digest.
#[derive(Debug, Clone, Copy)]
pub struct Sha256PasswordHasher {
    rounds: u32,
}

impl Sha256PasswordHasher {
    /// Default number of rounds.
    pub const DEFAULT_ROUNDS: u32 = 10_000;

    /// Hasher with [`DEFAULT_ROUNDS`](Self::DEFAULT_ROUNDS).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rounds: Self::DEFAULT_ROUNDS,
        }
    }

    /// Override the number of rounds (at least one).
    #[must_use]
    pub const fn with_rounds(rounds: u32) -> Self {
        Self {
            rounds: if rounds == 0 { 1 } else { rounds },
        }
    }

    fn digest(rounds: u32, salt: &[u8], password: &str) -> Vec<u8> {
        let mut digest = Sha256::new()
            .chain_update(salt)
            .chain_update(password.as_bytes())
            .finalize();
        for _ in 1..rounds {
            digest = Sha256::new().chain_update(salt).chain_update(digest).finalize();
        }
        digest.to_vec()
    }
}

impl Default for Sha256PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for Sha256PasswordHasher {
    fn hash(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let digest = Self::digest(self.rounds, &salt, password);
        format!(
            "{SCHEME}${}${}${}",
            self.rounds,
            STANDARD_NO_PAD.encode(salt),
            STANDARD_NO_PAD.encode(digest)
        )
    }

    fn verify(&self, password: &str, stored: &str) -> Result<bool> {
        let mut parts = stored.split('$');
        let (Some(SCHEME), Some(rounds), Some(salt), Some(expected), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(AuthError::MalformedHash);
        };

        let rounds: u32 = rounds.parse().map_err(|_| AuthError::MalformedHash)?;
        let salt = STANDARD_NO_PAD
            .decode(salt)
            .map_err(|_| AuthError::MalformedHash)?;
        let expected = STANDARD_NO_PAD
            .decode(expected)
            .map_err(|_| AuthError::MalformedHash)?;
        if rounds == 0 {
            return Err(AuthError::MalformedHash);
        }

        let actual = Self::digest(rounds, &salt, password);
        Ok(constant_time_eq(&actual, &expected))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    #[test]
    fn verifies_the_hashed_password() {
        let hasher = Sha256PasswordHasher::with_rounds(3);
        let stored = hasher.hash("correct horse");
        assert!(stored.starts_with("sha256$3$"));
        assert!(hasher.verify("correct horse", &stored).unwrap());
        assert!(!hasher.verify("battery staple", &stored).unwrap());
    }

    #[test]
    fn salts_differ_between_hashes() {
        let hasher = Sha256PasswordHasher::with_rounds(1);
        assert_ne!(hasher.hash("same"), hasher.hash("same"));
    }

    #[test]
    fn rounds_are_read_from_the_stored_hash() {
        let stored = Sha256PasswordHasher::with_rounds(2).hash("pw");
        assert!(Sha256PasswordHasher::new().verify("pw", &stored).unwrap());
    }

    #[test]
    fn foreign_hashes_are_malformed() {
        let hasher = Sha256PasswordHasher::new();
        assert_eq!(hasher.verify("pw", "$2b$12$abc"), Err(AuthError::MalformedHash));
        assert_eq!(hasher.verify("pw", "sha256$x$AA$AA"), Err(AuthError::MalformedHash));
    }
}
