//! HTLC escrow builder.
//!
//! Generates the secret, derives the hashlock and timelock, and pairs the two
//! legs of a cross-chain swap so that the destination leg always expires
//! first.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use settle_core::{Clock, CoreError, EntropySource, Result};
use tracing::debug;

use crate::config::EscrowConfig;
use crate::hashlock::{HashAlgorithm, Secret};
use crate::htlc::HtlcEscrow;

/// A fresh escrow and the secret that unlocks it.
///
/// The secret stays with the creator until they choose to reveal it.
#[derive(Debug)]
pub struct CreatedEscrow {
    pub escrow: HtlcEscrow,
    pub secret: Secret,
}

/// One side of a cross-chain swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeLeg {
    pub sender: Address,
    pub recipient: Address,
    pub amount: U256,
    /// Overrides the configured algorithm, e.g. Keccak-256 on the EVM side.
    #[serde(default)]
    pub hash_algorithm: Option<HashAlgorithm>,
}

/// Both escrows of a cross-chain swap, locked by one secret.
#[derive(Debug)]
pub struct BridgePlan {
    /// Escrow on the chain the initiator pays from. Longer timelock.
    pub source: HtlcEscrow,
    /// Escrow on the chain the initiator receives on. Shorter timelock.
    pub destination: HtlcEscrow,
    pub secret: Secret,
}

/// Escrow builder with injected clock and entropy.
pub struct EscrowBuilder<C: Clock, E: EntropySource> {
    config: EscrowConfig,
    clock: C,
    entropy: E,
}

impl<C: Clock, E: EntropySource> EscrowBuilder<C, E> {
    /// Create a builder.
    ///
    /// # Errors
    /// `InvalidArgument` if the configuration is invalid.
    pub fn new(config: EscrowConfig, clock: C, entropy: E) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            entropy,
        })
    }

    pub fn config(&self) -> &EscrowConfig {
        &self.config
    }

    /// Create an escrow with a fresh secret.
    ///
    /// `timelock = now + timelock_duration_secs`.
    ///
    /// # Errors
    /// `InvalidArgument` if `amount` or the duration is zero, or if sender and
    /// recipient are the same address.
    pub fn create(
        &self,
        amount: U256,
        recipient: Address,
        sender: Address,
        timelock_duration_secs: u64,
    ) -> Result<CreatedEscrow> {
        let leg = BridgeLeg {
            sender,
            recipient,
            amount,
            hash_algorithm: None,
        };
        validate_leg(&leg, timelock_duration_secs)?;
        let timelock = timelock_after(self.clock.now_secs(), timelock_duration_secs)?;

        let secret = Secret::generate(&self.entropy);
        let escrow = self.lock(&leg, &secret, timelock);
        debug!(
            escrow_id = %escrow.id(),
            timelock,
            algorithm = %escrow.hash_algorithm(),
            "Escrow created"
        );

        Ok(CreatedEscrow { escrow, secret })
    }

    /// Create both legs of a cross-chain swap from one secret.
    ///
    /// # Errors
    /// - `InvalidArgument` for an invalid leg (see [`Self::create`])
    /// - `InvariantViolation` unless
    ///   `destination_duration + safety_margin <= source_duration`
    pub fn create_bridge(
        &self,
        source: &BridgeLeg,
        destination: &BridgeLeg,
        source_duration_secs: u64,
        destination_duration_secs: u64,
    ) -> Result<BridgePlan> {
        validate_leg(source, source_duration_secs)?;
        validate_leg(destination, destination_duration_secs)?;

        let margin = self.config.safety_margin_secs;
        let required = destination_duration_secs.checked_add(margin).ok_or_else(|| {
            CoreError::invalid_argument("destination duration plus margin overflows u64")
        })?;
        if required > source_duration_secs {
            return Err(CoreError::invariant(format!(
                "destination timelock {destination_duration_secs}s + margin {margin}s exceeds source timelock {source_duration_secs}s"
            )));
        }

        // One clock read so both timelocks share the same base.
        let now = self.clock.now_secs();
        let source_timelock = timelock_after(now, source_duration_secs)?;
        let destination_timelock = timelock_after(now, destination_duration_secs)?;
        if source_timelock.saturating_sub(destination_timelock) < margin {
            return Err(CoreError::invariant(format!(
                "source timelock {source_timelock} is less than {margin}s after destination timelock {destination_timelock}"
            )));
        }

        let secret = Secret::generate(&self.entropy);
        let source_escrow = self.lock(source, &secret, source_timelock);
        let destination_escrow = self.lock(destination, &secret, destination_timelock);
        debug!(
            source_id = %source_escrow.id(),
            destination_id = %destination_escrow.id(),
            source_timelock,
            destination_timelock,
            "Bridge escrows created"
        );

        Ok(BridgePlan {
            source: source_escrow,
            destination: destination_escrow,
            secret,
        })
    }

    fn lock(&self, leg: &BridgeLeg, secret: &Secret, timelock: u64) -> HtlcEscrow {
        let algorithm = leg.hash_algorithm.unwrap_or(self.config.hash_algorithm);
        HtlcEscrow::new(
            leg.sender,
            leg.recipient,
            leg.amount,
            secret.hashlock(algorithm),
            timelock,
            algorithm,
        )
    }
}

fn timelock_after(now: u64, duration_secs: u64) -> Result<u64> {
    now.checked_add(duration_secs)
        .ok_or_else(|| CoreError::invalid_argument("timelock overflows u64"))
}

fn validate_leg(leg: &BridgeLeg, duration_secs: u64) -> Result<()> {
    if leg.amount.is_zero() {
        return Err(CoreError::invalid_argument("escrow amount must be positive"));
    }
    if duration_secs == 0 {
        return Err(CoreError::invalid_argument(
            "timelock duration must be positive",
        ));
    }
    if leg.sender == leg.recipient {
        return Err(CoreError::invalid_argument(format!(
            "sender and recipient are both {}",
            leg.sender
        )));
    }
    Ok(())
}
