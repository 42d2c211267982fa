//! Maker traits bit packing.
//!
//! Layout of the 256-bit word (bit 0 = least significant):
//!
//! | bits    | field                                   |
//! |---------|-----------------------------------------|
//! | 0       | allow partial fill                      |
//! | 1       | allow multiple fills                    |
//! | 2..=4   | strategy tag                            |
//! | 5..=44  | expiration, Unix seconds (0 = none)     |
//! | 45..=84 | nonce                                   |
//! | 85..    | reserved, always zero                   |
//!
//! Every field has its own bit range and values are range-checked before they
//! are shifted in, so one field can never spill into another.

use alloy::primitives::{B256, U256};
use serde::{Deserialize, Serialize};
use settle_core::{CoreError, Result};

use crate::strategy::StrategyTag;

const ALLOW_PARTIAL_FILL_BIT: usize = 0;
const ALLOW_MULTIPLE_FILLS_BIT: usize = 1;
const TAG_OFFSET: usize = 2;
const TAG_BITS: usize = 3;
const EXPIRATION_OFFSET: usize = 5;
const EXPIRATION_BITS: usize = 40;
const NONCE_OFFSET: usize = 45;
const NONCE_BITS: usize = 40;
const RESERVED_OFFSET: usize = 85;

/// Largest value a 40-bit field can hold.
pub const MAX_FIELD_VALUE: u64 = (1u64 << 40) - 1;

/// Caller-facing traits configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitsConfig {
    #[serde(default)]
    pub allow_partial_fill: bool,
    #[serde(default)]
    pub allow_multiple_fills: bool,
    #[serde(default)]
    pub nonce: u64,
    /// Seconds from now until the order expires. `None` = no expiration.
    #[serde(default)]
    pub expiration_offset_secs: Option<u64>,
}

/// Packed maker traits word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MakerTraits(B256);

impl MakerTraits {
    /// Pack explicit field values.
    ///
    /// # Errors
    /// `InvalidArgument` if `expiration` or `nonce` exceeds 40 bits.
    pub fn pack(
        allow_partial_fill: bool,
        allow_multiple_fills: bool,
        tag: StrategyTag,
        expiration: u64,
        nonce: u64,
    ) -> Result<Self> {
        if expiration > MAX_FIELD_VALUE {
            return Err(CoreError::invalid_argument(format!(
                "expiration {expiration} does not fit {EXPIRATION_BITS} bits"
            )));
        }
        if nonce > MAX_FIELD_VALUE {
            return Err(CoreError::invalid_argument(format!(
                "nonce {nonce} does not fit {NONCE_BITS} bits"
            )));
        }

        let mut word = U256::ZERO;
        if allow_partial_fill {
            word |= U256::from(1) << ALLOW_PARTIAL_FILL_BIT;
        }
        if allow_multiple_fills {
            word |= U256::from(1) << ALLOW_MULTIPLE_FILLS_BIT;
        }
        word |= U256::from(tag.bits()) << TAG_OFFSET;
        word |= U256::from(expiration) << EXPIRATION_OFFSET;
        word |= U256::from(nonce) << NONCE_OFFSET;

        Ok(Self(B256::from(word)))
    }

    /// Build traits for an order created at `now`.
    ///
    /// `expiration = now + expiration_offset_secs`.
    ///
    /// # Errors
    /// `InvalidArgument` if the offset is below `min_expiration_secs` or a
    /// field does not fit.
    pub fn build(
        config: &TraitsConfig,
        tag: StrategyTag,
        now: u64,
        min_expiration_secs: u64,
    ) -> Result<Self> {
        let expiration = match config.expiration_offset_secs {
            None => 0,
            Some(offset) => {
                if offset < min_expiration_secs {
                    return Err(CoreError::invalid_argument(format!(
                        "expiration offset {offset}s is below the {min_expiration_secs}s minimum"
                    )));
                }
                now.checked_add(offset)
                    .ok_or_else(|| CoreError::invalid_argument("expiration overflows u64"))?
            }
        };

        Self::pack(
            config.allow_partial_fill,
            config.allow_multiple_fills,
            tag,
            expiration,
            config.nonce,
        )
    }

    /// Parse a word received from elsewhere.
    ///
    /// # Errors
    /// `InvalidArgument` for non-zero reserved bits or an unknown tag.
    pub fn from_word(word: B256) -> Result<Self> {
        let value = U256::from_be_slice(word.as_slice());
        if !(value >> RESERVED_OFFSET).is_zero() {
            return Err(CoreError::invalid_argument("maker traits reserved bits are set"));
        }
        let traits = Self(word);
        traits.strategy_tag()?;
        Ok(traits)
    }

    #[inline]
    pub fn word(&self) -> B256 {
        self.0
    }

    pub fn allow_partial_fill(&self) -> bool {
        self.field(ALLOW_PARTIAL_FILL_BIT, 1) == 1
    }

    pub fn allow_multiple_fills(&self) -> bool {
        self.field(ALLOW_MULTIPLE_FILLS_BIT, 1) == 1
    }

    pub fn strategy_tag(&self) -> Result<StrategyTag> {
        // A 3-bit field always fits u8.
        StrategyTag::from_bits(self.field(TAG_OFFSET, TAG_BITS) as u8)
    }

    /// Expiration in Unix seconds, `None` when unset.
    pub fn expiration(&self) -> Option<u64> {
        match self.field(EXPIRATION_OFFSET, EXPIRATION_BITS) {
            0 => None,
            ts => Some(ts),
        }
    }

    pub fn nonce(&self) -> u64 {
        self.field(NONCE_OFFSET, NONCE_BITS)
    }

    /// Whether the order is past its expiration at `now`.
    pub fn is_expired(&self, now: u64) -> bool {
        self.expiration().is_some_and(|exp| now >= exp)
    }

    fn field(&self, offset: usize, bits: usize) -> u64 {
        let value = U256::from_be_slice(self.0.as_slice());
        let mask = (U256::from(1) << bits) - U256::from(1);
        // Masked to at most 40 bits, so the low limb holds everything.
        ((value >> offset) & mask).as_limbs()[0]
    }
}

impl From<MakerTraits> for B256 {
    fn from(traits: MakerTraits) -> Self {
        traits.0
    }
}
