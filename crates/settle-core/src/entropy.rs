//! Injected randomness for salts and secrets.
//!
//! Builders never reach for a global generator. Production code passes
//! [`OsEntropy`]; tests pass [`SequenceEntropy`] for reproducible draws.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use alloy::primitives::{keccak256, B256, U256};
use rand::rngs::OsRng;
use rand::RngCore;

/// Source of cryptographically strong random bytes.
pub trait EntropySource: Send + Sync {
    /// Fill `dest` with random bytes.
    fn fill_bytes(&self, dest: &mut [u8]);

    /// Draw a fresh 32-byte value.
    fn random_b256(&self) -> B256 {
        let mut bytes = [0u8; 32];
        self.fill_bytes(&mut bytes);
        B256::from(bytes)
    }

    /// Draw a fresh 256-bit integer.
    fn random_u256(&self) -> U256 {
        U256::from_be_slice(self.random_b256().as_slice())
    }
}

impl<E: EntropySource + ?Sized> EntropySource for &E {
    fn fill_bytes(&self, dest: &mut [u8]) {
        (**self).fill_bytes(dest)
    }
}

impl<E: EntropySource + ?Sized> EntropySource for Arc<E> {
    fn fill_bytes(&self, dest: &mut [u8]) {
        (**self).fill_bytes(dest)
    }
}

/// Operating-system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill_bytes(&self, dest: &mut [u8]) {
        OsRng.fill_bytes(dest);
    }
}

/// Deterministic entropy for tests.
///
/// Each 32-byte block is `keccak256(seed || counter)`, so consecutive draws
/// differ and two sources with the same seed replay the same stream.
/// NOT suitable for production secrets.
#[derive(Debug)]
pub struct SequenceEntropy {
    seed: u64,
    counter: AtomicU64,
}

impl SequenceEntropy {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            counter: AtomicU64::new(0),
        }
    }

    /// Number of 32-byte blocks drawn so far.
    pub fn draws(&self) -> u64 {
        self.counter.load(Ordering::Acquire)
    }
}

impl EntropySource for SequenceEntropy {
    fn fill_bytes(&self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(32) {
            let n = self.counter.fetch_add(1, Ordering::AcqRel);
            let mut input = [0u8; 16];
            input[..8].copy_from_slice(&self.seed.to_be_bytes());
            input[8..].copy_from_slice(&n.to_be_bytes());
            let block = keccak256(input);
            chunk.copy_from_slice(&block[..chunk.len()]);
        }
    }
}
