//! Two-party state channels.
//!
//! `ChannelLifecycleManager` owns one channel and drives it through
//! `Pending → Open → {Closed | Challenged}`. Counterparties exchange
//! `SignedChannelState`s whose EIP-712 hash both participants sign; a higher
//! nonce always supersedes a lower one.

pub mod config;
pub mod manager;
pub mod state;

pub use config::ChannelConfig;
pub use manager::{ChannelLifecycleManager, PendingChallenge};
pub use state::{ChannelState, ChannelStateUpdate, ChannelStatus, SignedChannelState};
