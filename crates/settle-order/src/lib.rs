//! Off-chain limit order construction.
//!
//! Builds canonical orders for a limit order protocol:
//! - `MakerTraits`: bit-packed flags, strategy tag, expiration and nonce
//! - `Predicate`: fixed-width TWAP / options / range payloads
//! - `OrderBuilder`: composes orders, splits TWAP schedules, computes EIP-712 hashes
//! - `SignedOrder`: attaches and verifies an external maker signature
//!
//! Signing happens outside this crate; the builder only emits the digest and
//! an `eth_signTypedData_v4` document.

pub mod builder;
pub mod config;
pub mod order;
pub mod predicate;
pub mod signed;
pub mod strategy;
pub mod traits;

pub use builder::{Amounts, Assets, BuiltOrder, OrderBuilder, OrderRequest, Parties, SignablePayload};
pub use config::OrderConfig;
pub use order::{Order, ORDER_TYPE};
pub use predicate::Predicate;
pub use signed::SignedOrder;
pub use strategy::{OptionKind, Strategy, StrategyTag};
pub use traits::{MakerTraits, TraitsConfig};
