//! Escrow configuration.

use serde::{Deserialize, Serialize};
use settle_core::{CoreError, Result};

use crate::hashlock::HashAlgorithm;

/// HTLC builder configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowConfig {
    /// Hash used for new hashlocks (SHA-256 unless the target chain is EVM).
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,
    /// Minimum gap between the destination and source timelocks of a bridge.
    ///
    /// The claimer needs this long to reuse a secret revealed on the
    /// destination chain before the source leg becomes refundable.
    #[serde(default = "default_safety_margin_secs")]
    pub safety_margin_secs: u64,
}

fn default_safety_margin_secs() -> u64 {
    3600
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: HashAlgorithm::default(),
            safety_margin_secs: default_safety_margin_secs(),
        }
    }
}

impl EscrowConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.safety_margin_secs == 0 {
            return Err(CoreError::invalid_argument(
                "safety_margin_secs must be positive",
            ));
        }
        Ok(())
    }
}
