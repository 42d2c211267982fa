//! Channel configuration.

use std::borrow::Cow;

use alloy::primitives::{Address, U256};
use alloy::sol_types::Eip712Domain;
use serde::{Deserialize, Serialize};
use settle_core::{CoreError, Result};

/// Configuration for channel lifecycle managers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Seconds a challenged state stays open to rebuttal.
    #[serde(default = "default_challenge_period_secs")]
    pub challenge_period_secs: u64,
    /// EIP-712 domain name for signed channel states.
    #[serde(default = "default_domain_name")]
    pub domain_name: String,
    #[serde(default = "default_domain_version")]
    pub domain_version: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Adjudicator contract.
    #[serde(default)]
    pub verifying_contract: Address,
}

fn default_challenge_period_secs() -> u64 {
    86_400
}

fn default_domain_name() -> String {
    "Settle State Channel".to_string()
}

fn default_domain_version() -> String {
    "1".to_string()
}

fn default_chain_id() -> u64 {
    1
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            challenge_period_secs: default_challenge_period_secs(),
            domain_name: default_domain_name(),
            domain_version: default_domain_version(),
            chain_id: default_chain_id(),
            verifying_contract: Address::ZERO,
        }
    }
}

impl ChannelConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.challenge_period_secs == 0 {
            return Err(CoreError::invalid_argument(
                "challenge_period_secs must be positive",
            ));
        }
        if self.domain_name.trim().is_empty() {
            return Err(CoreError::invalid_argument("domain_name must not be empty"));
        }
        if self.chain_id == 0 {
            return Err(CoreError::invalid_argument("chain_id must be non-zero"));
        }
        Ok(())
    }

    pub fn domain(&self) -> Eip712Domain {
        Eip712Domain::new(
            Some(Cow::Owned(self.domain_name.clone())),
            Some(Cow::Owned(self.domain_version.clone())),
            Some(U256::from(self.chain_id)),
            Some(self.verifying_contract),
            None,
        )
    }
}
