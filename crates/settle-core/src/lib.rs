//! Core primitives shared by the settlement crates.
//!
//! This crate provides the building blocks every other crate leans on:
//! - `CoreError`: the error taxonomy (invalid argument, invariant violation,
//!   invalid state, expired)
//! - `Clock`, `EntropySource`: injected time and randomness
//! - `split_amount`: residue-free amount splitting
//! - `verify_signer`: recovery checks for externally produced signatures
//! - `Price`, `Size`: precision-safe decimal types for quotes

pub mod clock;
pub mod decimal;
pub mod entropy;
pub mod error;
pub mod signature;
pub mod split;

pub use clock::{Clock, ManualClock, SystemClock};
pub use decimal::{Price, Size};
pub use entropy::{EntropySource, OsEntropy, SequenceEntropy};
pub use error::{CoreError, Result};
pub use signature::{parse_signature, verify_signer};
pub use split::split_amount;

pub use alloy::primitives::{Address, Bytes, PrimitiveSignature, B256, I256, U256};
