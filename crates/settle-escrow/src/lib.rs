//! Hash time-locked escrows.
//!
//! - `EscrowBuilder`: creates escrows and cross-chain escrow pairs
//! - `HtlcEscrow`: claim/refund state machine
//! - `Secret`, `HashAlgorithm`: preimages and hashlocks (SHA-256 or Keccak-256)

pub mod builder;
pub mod config;
pub mod hashlock;
pub mod htlc;

pub use builder::{BridgeLeg, BridgePlan, CreatedEscrow, EscrowBuilder};
pub use config::EscrowConfig;
pub use hashlock::{verify_secret, HashAlgorithm, Secret};
pub use htlc::{EscrowStatus, HtlcEscrow};
