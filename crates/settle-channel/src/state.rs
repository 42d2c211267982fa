//! Channel state records and their signed form.

use std::fmt;

use alloy::primitives::{Address, Bytes, PrimitiveSignature, B256, U256};
use alloy::sol;
use alloy::sol_types::{Eip712Domain, SolStruct};
use serde::{Deserialize, Serialize};
use settle_core::{parse_signature, verify_signer, CoreError, Result};

sol! {
    /// EIP-712 view of a channel state, signed by both participants.
    #[derive(Debug, PartialEq, Eq)]
    struct ChannelStateUpdate {
        bytes32 channelId;
        address participantA;
        address participantB;
        uint256 allocationA;
        uint256 allocationB;
        uint64 nonce;
    }
}

/// Channel lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    /// Funding submitted, waiting for on-chain confirmation.
    Pending,
    Open,
    /// A signed state is waiting out its challenge window.
    Challenged,
    Closed,
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Open => write!(f, "open"),
            Self::Challenged => write!(f, "challenged"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Snapshot of a two-party channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelState {
    pub channel_id: B256,
    pub participants: [Address; 2],
    pub allocations: [U256; 2],
    pub nonce: u64,
    pub status: ChannelStatus,
}

impl ChannelState {
    /// Sum of both allocations, `None` on overflow.
    pub fn total(&self) -> Option<U256> {
        self.allocations[0].checked_add(self.allocations[1])
    }

    /// Whether `self` replaces `other`. Only the nonce decides.
    pub fn supersedes(&self, other: &ChannelState) -> bool {
        self.nonce > other.nonce
    }

    /// Whether both states describe the same channel and parties.
    pub fn same_channel(&self, other: &ChannelState) -> bool {
        self.channel_id == other.channel_id && self.participants == other.participants
    }

    pub fn to_typed(&self) -> ChannelStateUpdate {
        ChannelStateUpdate {
            channelId: self.channel_id,
            participantA: self.participants[0],
            participantB: self.participants[1],
            allocationA: self.allocations[0],
            allocationB: self.allocations[1],
            nonce: self.nonce,
        }
    }

    /// Digest both participants sign. Status is not part of it.
    pub fn state_hash(&self, domain: &Eip712Domain) -> B256 {
        self.to_typed().eip712_signing_hash(domain)
    }
}

/// A channel state with one signature per participant, in participant order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedChannelState {
    pub state: ChannelState,
    pub signatures: [Bytes; 2],
}

impl SignedChannelState {
    pub fn new(state: ChannelState, signatures: [PrimitiveSignature; 2]) -> Self {
        let [a, b] = signatures;
        Self {
            state,
            signatures: [
                Bytes::copy_from_slice(&a.as_bytes()),
                Bytes::copy_from_slice(&b.as_bytes()),
            ],
        }
    }

    /// Check that participant `i` signed `state_hash` with `signatures[i]`.
    ///
    /// # Errors
    /// `InvalidArgument` for a malformed or foreign signature.
    pub fn verify(&self, domain: &Eip712Domain) -> Result<()> {
        let digest = self.state.state_hash(domain);
        for (i, (raw, participant)) in self
            .signatures
            .iter()
            .zip(self.state.participants)
            .enumerate()
        {
            let signature = parse_signature(raw)?;
            verify_signer(&digest, &signature, participant).map_err(|e| {
                CoreError::invalid_argument(format!("participant {i} signature: {e}"))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelConfig;
    use alloy::signers::local::PrivateKeySigner;
    use alloy::signers::SignerSync;

    fn state(a: &PrivateKeySigner, b: &PrivateKeySigner, nonce: u64) -> ChannelState {
        ChannelState {
            channel_id: B256::repeat_byte(0x42),
            participants: [a.address(), b.address()],
            allocations: [U256::from(40), U256::from(60)],
            nonce,
            status: ChannelStatus::Open,
        }
    }

    #[test]
    fn test_supersedes_by_nonce_only() {
        let a = PrivateKeySigner::random();
        let b = PrivateKeySigner::random();
        let newer = state(&a, &b, 5);
        let mut older = state(&a, &b, 4);
        older.allocations = [U256::from(100), U256::ZERO];

        assert!(newer.supersedes(&older));
        assert!(!older.supersedes(&newer));
        assert!(!newer.supersedes(&newer.clone()));
    }

    #[test]
    fn test_state_hash_ignores_status() {
        let a = PrivateKeySigner::random();
        let b = PrivateKeySigner::random();
        let domain = ChannelConfig::default().domain();
        let open = state(&a, &b, 1);
        let mut closed = open.clone();
        closed.status = ChannelStatus::Closed;
        assert_eq!(open.state_hash(&domain), closed.state_hash(&domain));

        let mut bumped = open.clone();
        bumped.nonce = 2;
        assert_ne!(open.state_hash(&domain), bumped.state_hash(&domain));
    }

    #[test]
    fn test_verify_requires_both_participants() {
        let a = PrivateKeySigner::random();
        let b = PrivateKeySigner::random();
        let mallory = PrivateKeySigner::random();
        let domain = ChannelConfig::default().domain();
        let s = state(&a, &b, 3);
        let digest = s.state_hash(&domain);

        let good = SignedChannelState::new(
            s.clone(),
            [
                a.sign_hash_sync(&digest).unwrap(),
                b.sign_hash_sync(&digest).unwrap(),
            ],
        );
        assert!(good.verify(&domain).is_ok());

        let forged = SignedChannelState::new(
            s.clone(),
            [
                a.sign_hash_sync(&digest).unwrap(),
                mallory.sign_hash_sync(&digest).unwrap(),
            ],
        );
        assert!(matches!(
            forged.verify(&domain),
            Err(CoreError::InvalidArgument(_))
        ));

        let swapped = SignedChannelState::new(
            s,
            [
                b.sign_hash_sync(&digest).unwrap(),
                a.sign_hash_sync(&digest).unwrap(),
            ],
        );
        assert!(swapped.verify(&domain).is_err());
    }

    #[test]
    fn test_malformed_signature_rejected() {
        let a = PrivateKeySigner::random();
        let b = PrivateKeySigner::random();
        let domain = ChannelConfig::default().domain();
        let signed = SignedChannelState {
            state: state(&a, &b, 1),
            signatures: [Bytes::from(vec![0u8; 3]), Bytes::from(vec![0u8; 65])],
        };
        assert!(signed.verify(&domain).is_err());
    }
}
