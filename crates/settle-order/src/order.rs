//! Canonical order record and its EIP-712 hashing.

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol;
use alloy::sol_types::{Eip712Domain, SolStruct};
use serde::{Deserialize, Serialize};
use settle_core::{CoreError, Result};

use crate::predicate::Predicate;
use crate::traits::MakerTraits;

/// EIP-712 type definitions.
pub mod typed {
    use super::sol;

    sol! {
        #[derive(Debug, PartialEq, Eq)]
        struct Order {
            uint256 salt;
            address maker;
            address receiver;
            address makerAsset;
            address takerAsset;
            uint256 makingAmount;
            uint256 takingAmount;
            bytes32 makerTraits;
            bytes predicate;
        }
    }
}

/// EIP-712 type string of [`typed::Order`].
pub const ORDER_TYPE: &str = "Order(uint256 salt,address maker,address receiver,address makerAsset,address takerAsset,uint256 makingAmount,uint256 takingAmount,bytes32 makerTraits,bytes predicate)";

/// Limit order. Immutable once hashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub salt: U256,
    pub maker: Address,
    pub receiver: Address,
    pub maker_asset: Address,
    pub taker_asset: Address,
    pub making_amount: U256,
    pub taking_amount: U256,
    pub maker_traits: MakerTraits,
    pub predicate: Bytes,
}

impl Order {
    /// Check record-level invariants.
    ///
    /// # Errors
    /// `InvalidArgument` if an amount is zero, the assets are equal, the
    /// maker is the zero address, or the predicate does not decode under the
    /// traits' strategy tag.
    pub fn validate(&self) -> Result<()> {
        if self.making_amount.is_zero() {
            return Err(CoreError::invalid_argument("making amount must be positive"));
        }
        if self.taking_amount.is_zero() {
            return Err(CoreError::invalid_argument("taking amount must be positive"));
        }
        if self.maker_asset == self.taker_asset {
            return Err(CoreError::invalid_argument(format!(
                "maker and taker asset are both {}",
                self.maker_asset
            )));
        }
        if self.maker == Address::ZERO {
            return Err(CoreError::invalid_argument("maker must not be the zero address"));
        }
        self.decoded_predicate()?;
        Ok(())
    }

    /// Decode the predicate using the tag packed into the traits.
    pub fn decoded_predicate(&self) -> Result<Predicate> {
        Predicate::decode(self.maker_traits.strategy_tag()?, &self.predicate)
    }

    /// EIP-712 struct representation.
    pub fn to_typed(&self) -> typed::Order {
        typed::Order {
            salt: self.salt,
            maker: self.maker,
            receiver: self.receiver,
            makerAsset: self.maker_asset,
            takerAsset: self.taker_asset,
            makingAmount: self.making_amount,
            takingAmount: self.taking_amount,
            makerTraits: self.maker_traits.word(),
            predicate: self.predicate.clone(),
        }
    }

    /// `hashStruct(order)`.
    pub fn struct_hash(&self) -> B256 {
        self.to_typed().eip712_hash_struct()
    }

    /// Order hash: `keccak256(0x1901 || domain_separator || struct_hash)`.
    pub fn hash(&self, domain: &Eip712Domain) -> B256 {
        self.to_typed().eip712_signing_hash(domain)
    }
}
