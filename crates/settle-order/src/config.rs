//! Order builder configuration.

use std::borrow::Cow;

use alloy::primitives::{Address, U256};
use alloy::sol_types::Eip712Domain;
use serde::{Deserialize, Serialize};
use settle_core::{CoreError, Result};

/// Configuration for order construction.
///
/// The EIP-712 domain fields bind every order hash to one chain and one
/// protocol deployment, so an order signed for one cannot be replayed on
/// another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfig {
    /// EIP-712 domain name.
    #[serde(default = "default_domain_name")]
    pub domain_name: String,
    /// EIP-712 domain version (protocol version).
    #[serde(default = "default_domain_version")]
    pub domain_version: String,
    /// Chain id the orders are valid on.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Verifier contract address.
    #[serde(default)]
    pub verifying_contract: Address,
    /// Minimum distance between now and an order expiration (seconds).
    #[serde(default = "default_min_expiration_secs")]
    pub min_expiration_secs: u64,
}

fn default_domain_name() -> String {
    "Settle Limit Order Protocol".to_string()
}

fn default_domain_version() -> String {
    "1".to_string()
}

fn default_chain_id() -> u64 {
    1
}

fn default_min_expiration_secs() -> u64 {
    60
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            domain_name: default_domain_name(),
            domain_version: default_domain_version(),
            chain_id: default_chain_id(),
            verifying_contract: Address::ZERO,
            min_expiration_secs: default_min_expiration_secs(),
        }
    }
}

impl OrderConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.domain_name.trim().is_empty() {
            return Err(CoreError::invalid_argument("domain_name must not be empty"));
        }
        if self.domain_version.trim().is_empty() {
            return Err(CoreError::invalid_argument(
                "domain_version must not be empty",
            ));
        }
        if self.chain_id == 0 {
            return Err(CoreError::invalid_argument("chain_id must be non-zero"));
        }
        Ok(())
    }

    /// Build the EIP-712 domain described by this configuration.
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
