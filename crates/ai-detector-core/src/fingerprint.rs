//! Deterministic sentence identifiers.
//!
//! A [`Fingerprint`] is the first [`FINGERPRINT_LEN`] lowercase hex
//! characters of the SHA-256 digest of a sentence's trimmed UTF-8 bytes.
//! It depends on nothing but the text, so the same sentence maps to the
//! same identifier in every request and every process. Clients use it as
//! the key of their score cache.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Number of hex characters kept from the digest (64 bits).
pub const FINGERPRINT_LEN: usize = 16;

/// Short hex identifier of a trimmed sentence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

/// Rejection reason for a string that is not a well-formed fingerprint.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FingerprintError {
    #[error("fingerprint must be {FINGERPRINT_LEN} characters, got {0}")]
    Length(usize),
    #[error("fingerprint must be lowercase hex")]
    NotHex,
}

impl Fingerprint {
    /// Compute the fingerprint of `text` after whitespace trimming.
    pub fn of(text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.trim().as_bytes());
        let digest = hex::encode(hasher.finalize());
        Fingerprint(digest[..FINGERPRINT_LEN].to_string())
    }

    /// Validate a fingerprint received from outside the process.
    pub fn parse(raw: &str) -> Result<Self, FingerprintError> {
        if raw.len() != FINGERPRINT_LEN {
            return Err(FingerprintError::Length(raw.len()));
        }
        if !raw
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(FingerprintError::NotHex);
        }
        Ok(Fingerprint(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
