//! Single-use action tokens for the emailed approve/reject links.
//!
//! The plaintext token travels only inside the email; the store keeps a
//! SHA-256 digest, so a database leak never yields a usable link.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const TOKEN_BYTES: usize = 32;

/// Plaintext capability token, held only long enough to build the email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionToken(String);

impl ActionToken {
    /// Draws 32 bytes from the OS RNG and encodes them URL-safe without
    /// padding, so the token can sit in a query string untouched.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn digest(&self) -> TokenDigest {
        TokenDigest::of(&self.0)
    }
}

/// SHA-256 digest of an action token; the only form that is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDigest(#[serde(with = "hex::serde")] [u8; 32]);

impl TokenDigest {
    pub fn of(token: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        Self(hasher.finalize().into())
    }

    /// Constant-time comparison against a presented plaintext token.
    pub fn verify(&self, presented: &str) -> bool {
        let candidate = Self::of(presented);
        bool::from(self.0.ct_eq(&candidate.0))
    }
}
