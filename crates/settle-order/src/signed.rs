//! Orders paired with an externally produced maker signature.

use alloy::primitives::{Bytes, PrimitiveSignature, B256};
use alloy::sol_types::Eip712Domain;
use serde::{Deserialize, Serialize};
use settle_core::{parse_signature, verify_signer, Clock, CoreError, Result};
use tracing::{debug, warn};

use crate::builder::BuiltOrder;
use crate::order::Order;

/// A built order carrying the maker's signature over its hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedOrder {
    #[serde(flatten)]
    built: BuiltOrder,
    /// 65-byte `r || s || v`.
    signature: Bytes,
}

impl SignedOrder {
    /// Attach a signature after checking it recovers to the maker.
    ///
    /// # Errors
    /// `InvalidArgument` if `order_hash` is not the hash of the order body
    /// under `domain`, or if the signature does not recover to `order.maker`.
    pub fn new(
        built: BuiltOrder,
        signature: &PrimitiveSignature,
        domain: &Eip712Domain,
    ) -> Result<Self> {
        authenticate(&built, signature, domain)?;
        debug!(order_hash = %built.order_hash, maker = %built.order.maker, "Order signature verified");
        Ok(Self {
            built,
            signature: Bytes::copy_from_slice(&signature.as_bytes()),
        })
    }

    /// Re-verify a signed order received from elsewhere.
    ///
    /// The hash is recomputed from the order body, so an edited body fails
    /// even when the stored hash and signature are intact.
    pub fn verify(&self, domain: &Eip712Domain) -> Result<()> {
        let signature = parse_signature(&self.signature)?;
        authenticate(&self.built, &signature, domain)
    }

    /// Fail with `Expired` once the maker traits expiration has passed.
    pub fn ensure_live(&self, clock: &impl Clock) -> Result<()> {
        let now = clock.now_secs();
        if self.built.order.maker_traits.is_expired(now) {
            return Err(CoreError::expired(format!(
                "order {} expired at {:?}, now {now}",
                self.built.order_hash,
                self.built.order.maker_traits.expiration()
            )));
        }
        Ok(())
    }

    pub fn order(&self) -> &Order {
        &self.built.order
    }

    pub fn order_hash(&self) -> B256 {
        self.built.order_hash
    }

    pub fn built(&self) -> &BuiltOrder {
        &self.built
    }

    pub fn signature(&self) -> &Bytes {
        &self.signature
    }
}

fn authenticate(
    built: &BuiltOrder,
    signature: &PrimitiveSignature,
    domain: &Eip712Domain,
) -> Result<()> {
    let recomputed = built.order.hash(domain);
    if recomputed != built.order_hash {
        warn!(
            stored = %built.order_hash,
            recomputed = %recomputed,
            "Order body does not match its hash"
        );
        return Err(CoreError::invalid_argument(format!(
            "order hash {} does not match order body (hashes to {recomputed})",
            built.order_hash
        )));
    }
    verify_signer(&recomputed, signature, built.order.maker)?;
    Ok(())
}
