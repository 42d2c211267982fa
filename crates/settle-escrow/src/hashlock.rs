//! Secrets and hashlocks.

use std::fmt;

use alloy::primitives::{keccak256, B256};
use serde::{Deserialize, Serialize};
use settle_core::{CoreError, EntropySource, Result};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Hash function binding a secret to its hashlock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// Bitcoin-style and most non-EVM chains.
    #[default]
    Sha256,
    /// EVM chains.
    Keccak256,
}

impl HashAlgorithm {
    pub fn digest(self, data: &[u8]) -> B256 {
        match self {
            Self::Sha256 => B256::from_slice(&Sha256::digest(data)),
            Self::Keccak256 => keccak256(data),
        }
    }

    /// Stable one-byte code used in escrow ids.
    pub fn code(self) -> u8 {
        match self {
            Self::Sha256 => 0,
            Self::Keccak256 => 1,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Keccak256 => write!(f, "keccak256"),
        }
    }
}

/// 32-byte HTLC preimage. Wiped from memory on drop and never printed.
#[derive(Clone)]
pub struct Secret(Zeroizing<[u8; 32]>);

impl Secret {
    pub const LEN: usize = 32;

    /// Draw a fresh secret.
    pub fn generate(entropy: &impl EntropySource) -> Self {
        let mut bytes = Zeroizing::new([0u8; 32]);
        entropy.fill_bytes(&mut bytes[..]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Parse a hex secret (with or without `0x`).
    ///
    /// # Errors
    /// `InvalidArgument` unless the input is exactly 32 hex-encoded bytes.
    pub fn from_hex(input: &str) -> Result<Self> {
        let trimmed = input.trim().trim_start_matches("0x");
        let decoded = Zeroizing::new(
            hex::decode(trimmed)
                .map_err(|e| CoreError::invalid_argument(format!("secret is not hex: {e}")))?,
        );
        if decoded.len() != Self::LEN {
            return Err(CoreError::invalid_argument(format!(
                "secret must be {} bytes, got {}",
                Self::LEN,
                decoded.len()
            )));
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        Ok(Self::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Reveal as a word, e.g. to record a claimed secret.
    pub fn reveal(&self) -> B256 {
        B256::from(*self.0)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0[..]))
    }

    pub fn hashlock(&self, algorithm: HashAlgorithm) -> B256 {
        algorithm.digest(&self.0[..])
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Check `candidate` against `hashlock` without touching any escrow.
pub fn verify_secret(candidate: &Secret, hashlock: &B256, algorithm: HashAlgorithm) -> bool {
    candidate.hashlock(algorithm) == *hashlock
}
