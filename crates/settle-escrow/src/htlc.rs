//! HTLC escrow record and its claim/refund state machine.
//!
//! Status only moves forward: `Created → Funded → {Claimed | Refunded}`.
//! Claim is possible strictly before the timelock, refund at or after it, so
//! the two outcomes can never both succeed. Every check runs before any field
//! is written; a failed call leaves the escrow untouched.

use std::fmt;

use alloy::primitives::{keccak256, Address, B256, U256};
use serde::{Deserialize, Serialize};
use settle_core::{Clock, CoreError, Result};
use tracing::{debug, warn};

use crate::hashlock::{verify_secret, HashAlgorithm, Secret};

/// Escrow lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscrowStatus {
    /// Built off-chain, not yet locked on-chain.
    Created,
    /// Funds locked on-chain.
    Funded,
    /// Recipient revealed the secret. Terminal.
    Claimed,
    /// Sender recovered the funds after the timelock. Terminal.
    Refunded,
}

impl EscrowStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Claimed | Self::Refunded)
    }
}

impl fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Funded => write!(f, "funded"),
            Self::Claimed => write!(f, "claimed"),
            Self::Refunded => write!(f, "refunded"),
        }
    }
}

/// Hash time-locked escrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtlcEscrow {
    id: B256,
    sender: Address,
    recipient: Address,
    amount: U256,
    hashlock: B256,
    /// Known only after a successful claim.
    secret: Option<B256>,
    /// Unix seconds.
    timelock: u64,
    hash_algorithm: HashAlgorithm,
    status: EscrowStatus,
}

impl HtlcEscrow {
    pub(crate) fn new(
        sender: Address,
        recipient: Address,
        amount: U256,
        hashlock: B256,
        timelock: u64,
        hash_algorithm: HashAlgorithm,
    ) -> Self {
        let id = escrow_id(&sender, &recipient, &amount, &hashlock, timelock, hash_algorithm);
        Self {
            id,
            sender,
            recipient,
            amount,
            hashlock,
            secret: None,
            timelock,
            hash_algorithm,
            status: EscrowStatus::Created,
        }
    }

    pub fn id(&self) -> B256 {
        self.id
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn recipient(&self) -> Address {
        self.recipient
    }

    pub fn amount(&self) -> U256 {
        self.amount
    }

    pub fn hashlock(&self) -> B256 {
        self.hashlock
    }

    pub fn secret(&self) -> Option<B256> {
        self.secret
    }

    pub fn timelock(&self) -> u64 {
        self.timelock
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    pub fn status(&self) -> EscrowStatus {
        self.status
    }

    /// Whether the timelock has passed at `now`.
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.timelock
    }

    /// Pure check of a candidate secret against this escrow's hashlock.
    pub fn verify_secret(&self, candidate: &Secret) -> bool {
        verify_secret(candidate, &self.hashlock, self.hash_algorithm)
    }

    /// Check a record loaded from outside against its own fields.
    ///
    /// The id must match the one derived from the terms, and a secret is
    /// present exactly when the escrow is claimed and opens the hashlock.
    ///
    /// # Errors
    /// `InvalidArgument` naming the first inconsistency found.
    pub fn check_integrity(&self) -> Result<()> {
        let expected = escrow_id(
            &self.sender,
            &self.recipient,
            &self.amount,
            &self.hashlock,
            self.timelock,
            self.hash_algorithm,
        );
        if expected != self.id {
            warn!(escrow_id = %self.id, %expected, "Escrow id does not match its terms");
            return Err(CoreError::invalid_argument(format!(
                "escrow id {} does not match its terms (expected {expected})",
                self.id
            )));
        }

        match (self.status, self.secret) {
            (EscrowStatus::Claimed, Some(secret)) => {
                if !verify_secret(&Secret::from_bytes(secret.0), &self.hashlock, self.hash_algorithm) {
                    return Err(CoreError::invalid_argument(
                        "recorded secret does not open the hashlock",
                    ));
                }
            }
            (EscrowStatus::Claimed, None) => {
                return Err(CoreError::invalid_argument(
                    "claimed escrow carries no secret",
                ));
            }
            (status, Some(_)) => {
                return Err(CoreError::invalid_argument(format!(
                    "{status} escrow carries a secret"
                )));
            }
            (_, None) => {}
        }
        Ok(())
    }

    /// Record the on-chain lock reported by the submitter.
    ///
    /// # Errors
    /// - `InvalidState` unless `Created`
    /// - `Expired` if the timelock has already passed
    pub fn fund(&mut self, clock: &impl Clock) -> Result<()> {
        self.require(EscrowStatus::Created, "fund")?;
        let now = clock.now_secs();
        if self.is_expired(now) {
            return Err(CoreError::expired(format!(
                "escrow {} timelock {} passed before funding (now {now})",
                self.id, self.timelock
            )));
        }
        self.transition(EscrowStatus::Funded);
        Ok(())
    }

    /// Claim with the preimage.
    ///
    /// # Errors
    /// - `InvalidState` unless `Funded`
    /// - `Expired` at or after the timelock
    /// - `InvalidArgument` if the candidate does not hash to the hashlock
    pub fn claim(&mut self, candidate: &Secret, clock: &impl Clock) -> Result<()> {
        self.require(EscrowStatus::Funded, "claim")?;
        let now = clock.now_secs();
        if self.is_expired(now) {
            return Err(CoreError::expired(format!(
                "escrow {} timelock {} reached, claim window closed (now {now})",
                self.id, self.timelock
            )));
        }
        if !self.verify_secret(candidate) {
            warn!(escrow_id = %self.id, "Claim rejected: secret does not match hashlock");
            return Err(CoreError::invalid_argument(format!(
                "secret does not match hashlock of escrow {}",
                self.id
            )));
        }
        self.secret = Some(candidate.reveal());
        self.transition(EscrowStatus::Claimed);
        Ok(())
    }

    /// Return the funds to the sender after the timelock.
    ///
    /// # Errors
    /// - `InvalidState` unless `Funded`
    /// - `Expired` ("too early") before the timelock
    pub fn refund(&mut self, clock: &impl Clock) -> Result<()> {
        self.require(EscrowStatus::Funded, "refund")?;
        let now = clock.now_secs();
        if !self.is_expired(now) {
            return Err(CoreError::expired(format!(
                "too early: escrow {} refundable at {}, now {now}",
                self.id, self.timelock
            )));
        }
        self.transition(EscrowStatus::Refunded);
        Ok(())
    }

    fn require(&self, expected: EscrowStatus, op: &str) -> Result<()> {
        if self.status != expected {
            return Err(CoreError::invalid_state(format!(
                "cannot {op} escrow {} in status {}",
                self.id, self.status
            )));
        }
        Ok(())
    }

    fn transition(&mut self, to: EscrowStatus) {
        debug!(escrow_id = %self.id, from = %self.status, to = %to, "Escrow transition");
        self.status = to;
    }
}

/// `keccak256(sender ‖ recipient ‖ amount ‖ hashlock ‖ timelock ‖ algorithm)`.
fn escrow_id(
    sender: &Address,
    recipient: &Address,
    amount: &U256,
    hashlock: &B256,
    timelock: u64,
    algorithm: HashAlgorithm,
) -> B256 {
    let mut data = Vec::with_capacity(20 + 20 + 32 + 32 + 8 + 1);
    data.extend_from_slice(sender.as_slice());
    data.extend_from_slice(recipient.as_slice());
    data.extend_from_slice(&amount.to_be_bytes::<32>());
    data.extend_from_slice(hashlock.as_slice());
    data.extend_from_slice(&timelock.to_be_bytes());
    data.push(algorithm.code());
    keccak256(&data)
}
