//! Order builder.
//!
//! Composes parties, assets and amounts with the encoded traits and predicate
//! into canonical [`Order`] records and returns each with its hash and a
//! payload for an external signer. The builder never signs.

use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::Eip712Domain;
use serde::{Deserialize, Serialize};
use serde_json::json;
use settle_core::{split_amount, Clock, CoreError, EntropySource, Result};
use tracing::debug;

use crate::config::OrderConfig;
use crate::order::Order;
use crate::strategy::Strategy;
use crate::traits::{MakerTraits, TraitsConfig};

/// Maker and receiver of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parties {
    pub maker: Address,
    /// Receiver of the taker asset; defaults to the maker.
    #[serde(default)]
    pub receiver: Option<Address>,
}

impl Parties {
    pub fn new(maker: Address) -> Self {
        Self {
            maker,
            receiver: None,
        }
    }
}

/// Asset pair of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assets {
    pub maker_asset: Address,
    pub taker_asset: Address,
}

/// Total amounts of an order (or of all TWAP siblings together).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amounts {
    pub making: U256,
    pub taking: U256,
}

/// Everything needed to build one order (or one TWAP schedule).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub strategy: Strategy,
    pub parties: Parties,
    pub assets: Assets,
    pub amounts: Amounts,
    #[serde(default)]
    pub traits: TraitsConfig,
    /// Fixed salt. Fresh entropy is drawn when absent.
    #[serde(default)]
    pub salt: Option<U256>,
}

/// Payload handed to an external signer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignablePayload {
    pub domain_separator: B256,
    pub struct_hash: B256,
    /// Digest to sign (equals the order hash).
    pub signing_hash: B256,
    /// `eth_signTypedData_v4` document.
    pub typed_data: serde_json::Value,
}

/// Builder output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltOrder {
    pub order: Order,
    pub order_hash: B256,
    pub signable_payload: SignablePayload,
}

/// Order builder with injected clock and entropy.
pub struct OrderBuilder<C: Clock, E: EntropySource> {
    config: OrderConfig,
    domain: Eip712Domain,
    clock: C,
    entropy: E,
}

impl<C: Clock, E: EntropySource> OrderBuilder<C, E> {
    /// Create a builder.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the configuration is invalid.
    pub fn new(config: OrderConfig, clock: C, entropy: E) -> Result<Self> {
        config.validate()?;
        let domain = config.domain();
        Ok(Self {
            config,
            domain,
            clock,
            entropy,
        })
    }

    pub fn config(&self) -> &OrderConfig {
        &self.config
    }

    pub fn domain(&self) -> &Eip712Domain {
        &self.domain
    }

    /// Hash an order under this builder's domain.
    pub fn hash_order(&self, order: &Order) -> B256 {
        order.hash(&self.domain)
    }

    /// Build all orders for a request.
    ///
    /// Plain, options and range strategies yield one order. TWAP yields
    /// `number_of_trades` siblings whose making/taking amounts are the
    /// splitter's chunks of the totals and whose predicates carry
    /// consecutive time windows. Siblings never share a salt: each draws
    /// fresh entropy, or with a fixed salt sibling `i` uses `salt + i`.
    ///
    /// Nothing is returned unless every sibling is valid.
    pub fn build(&self, request: &OrderRequest) -> Result<Vec<BuiltOrder>> {
        let now = self.clock.now_secs();
        let strategy = &request.strategy;
        strategy.validate(now)?;

        let traits = MakerTraits::build(
            &request.traits,
            strategy.tag(),
            now,
            self.config.min_expiration_secs,
        )?;

        let (making, taking) = match strategy {
            Strategy::Twap {
                total_amount,
                number_of_trades,
                ..
            } => {
                if *total_amount != request.amounts.making {
                    return Err(CoreError::invalid_argument(format!(
                        "TWAP total {total_amount} differs from making amount {}",
                        request.amounts.making
                    )));
                }
                (
                    split_amount(request.amounts.making, *number_of_trades)?,
                    split_amount(request.amounts.taking, *number_of_trades)?,
                )
            }
            _ => (vec![request.amounts.making], vec![request.amounts.taking]),
        };

        let receiver = request.parties.receiver.unwrap_or(request.parties.maker);
        let mut built = Vec::with_capacity(making.len());

        for (index, (making_amount, taking_amount)) in making.into_iter().zip(taking).enumerate() {
            // index < number_of_trades, which is a u32.
            let predicate = strategy.predicate_for(index as u32)?;
            let salt = match request.salt {
                Some(salt) => salt.wrapping_add(U256::from(index)),
                None => self.entropy.random_u256(),
            };

            let order = Order {
                salt,
                maker: request.parties.maker,
                receiver,
                maker_asset: request.assets.maker_asset,
                taker_asset: request.assets.taker_asset,
                making_amount,
                taking_amount,
                maker_traits: traits,
                predicate: predicate.encode(),
            };
            order.validate()?;

            built.push(self.finish(order));
        }

        debug!(
            strategy = %strategy.tag(),
            count = built.len(),
            maker = %request.parties.maker,
            "Orders built"
        );

        Ok(built)
    }

    /// Build a request that must produce exactly one order.
    ///
    /// # Errors
    /// `InvalidArgument` if the request expands to several TWAP siblings.
    pub fn build_single(&self, request: &OrderRequest) -> Result<BuiltOrder> {
        let mut built = self.build(request)?;
        if built.len() != 1 {
            return Err(CoreError::invalid_argument(format!(
                "request expands to {} orders, use build()",
                built.len()
            )));
        }
        built
            .pop()
            .ok_or_else(|| CoreError::invalid_argument("request produced no order"))
    }

    fn finish(&self, order: Order) -> BuiltOrder {
        let domain_separator = self.domain.hash_struct();
        let struct_hash = order.struct_hash();
        let order_hash = order.hash(&self.domain);
        let typed_data = self.typed_data(&order);

        BuiltOrder {
            order,
            order_hash,
            signable_payload: SignablePayload {
                domain_separator,
                struct_hash,
                signing_hash: order_hash,
                typed_data,
            },
        }
    }

    fn typed_data(&self, order: &Order) -> serde_json::Value {
        json!({
            "types": {
                "EIP712Domain": [
                    { "name": "name", "type": "string" },
                    { "name": "version", "type": "string" },
                    { "name": "chainId", "type": "uint256" },
                    { "name": "verifyingContract", "type": "address" },
                ],
                "Order": [
                    { "name": "salt", "type": "uint256" },
                    { "name": "maker", "type": "address" },
                    { "name": "receiver", "type": "address" },
                    { "name": "makerAsset", "type": "address" },
                    { "name": "takerAsset", "type": "address" },
                    { "name": "makingAmount", "type": "uint256" },
                    { "name": "takingAmount", "type": "uint256" },
                    { "name": "makerTraits", "type": "bytes32" },
                    { "name": "predicate", "type": "bytes" },
                ],
            },
            "primaryType": "Order",
            "domain": {
                "name": self.config.domain_name,
                "version": self.config.domain_version,
                "chainId": self.config.chain_id,
                "verifyingContract": self.config.verifying_contract.to_string(),
            },
            "message": {
                "salt": order.salt.to_string(),
                "maker": order.maker.to_string(),
                "receiver": order.receiver.to_string(),
                "makerAsset": order.maker_asset.to_string(),
                "takerAsset": order.taker_asset.to_string(),
                "makingAmount": order.making_amount.to_string(),
                "takingAmount": order.taking_amount.to_string(),
                "makerTraits": order.maker_traits.word().to_string(),
                "predicate": order.predicate.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::Predicate;
    use crate::strategy::{OptionKind, StrategyTag};
    use mockall::mock;
    use settle_core::{ManualClock, SequenceEntropy};

    const NOW: u64 = 1_700_000_000;

    mock! {
        pub TestClock {}
        impl Clock for TestClock {
            fn now_secs(&self) -> u64;
        }
    }

    fn builder() -> OrderBuilder<ManualClock, SequenceEntropy> {
        OrderBuilder::new(
            OrderConfig::default(),
            ManualClock::new(NOW),
            SequenceEntropy::new(1),
        )
        .unwrap()
    }

    fn request(strategy: Strategy) -> OrderRequest {
        OrderRequest {
            strategy,
            parties: Parties::new(Address::repeat_byte(0x11)),
            assets: Assets {
                maker_asset: Address::repeat_byte(0xaa),
                taker_asset: Address::repeat_byte(0xbb),
            },
            amounts: Amounts {
                making: U256::from(1000),
                taking: U256::from(3000),
            },
            traits: TraitsConfig {
                allow_partial_fill: true,
                expiration_offset_secs: Some(3600),
                ..Default::default()
            },
            salt: None,
        }
    }

    fn twap_request() -> OrderRequest {
        request(Strategy::Twap {
            total_amount: U256::from(1000),
            number_of_trades: 3,
            time_interval: 600,
            start_time: NOW + 60,
        })
    }

    #[test]
    fn test_plain_order_fields() {
        let built = builder().build_single(&request(Strategy::Plain)).unwrap();
        let order = &built.order;
        assert_eq!(order.receiver, order.maker);
        assert_eq!(order.making_amount, U256::from(1000));
        assert!(order.predicate.is_empty());
        assert_eq!(order.maker_traits.strategy_tag().unwrap(), StrategyTag::Plain);
        assert_eq!(order.maker_traits.expiration(), Some(NOW + 3600));
        assert_eq!(built.signable_payload.signing_hash, built.order_hash);
    }

    #[test]
    fn test_hash_is_deterministic_with_fixed_salt() {
        let mut req = request(Strategy::Plain);
        req.salt = Some(U256::from(777));

        let a = builder().build_single(&req).unwrap();
        let b = builder().build_single(&req).unwrap();
        assert_eq!(a.order_hash, b.order_hash);
        assert_eq!(a.order, b.order);
    }

    #[test]
    fn test_hash_changes_with_single_field() {
        let mut req = request(Strategy::Plain);
        req.salt = Some(U256::from(777));
        let base = builder().build_single(&req).unwrap().order_hash;

        let mut other_salt = req.clone();
        other_salt.salt = Some(U256::from(778));
        assert_ne!(builder().build_single(&other_salt).unwrap().order_hash, base);

        let mut other_amount = req.clone();
        other_amount.amounts.taking = U256::from(3001);
        assert_ne!(builder().build_single(&other_amount).unwrap().order_hash, base);

        let mut other_asset = req.clone();
        other_asset.assets.taker_asset = Address::repeat_byte(0xcc);
        assert_ne!(builder().build_single(&other_asset).unwrap().order_hash, base);

        let mut other_traits = req.clone();
        other_traits.traits.nonce = 1;
        assert_ne!(builder().build_single(&other_traits).unwrap().order_hash, base);
    }

    #[test]
    fn test_fresh_salts_differ() {
        let b = builder();
        let req = request(Strategy::Plain);
        let first = b.build_single(&req).unwrap();
        let second = b.build_single(&req).unwrap();
        assert_ne!(first.order.salt, second.order.salt);
        assert_ne!(first.order_hash, second.order_hash);
    }

    #[test]
    fn test_twap_siblings() {
        let built = builder().build(&twap_request()).unwrap();
        assert_eq!(built.len(), 3);

        let making: Vec<U256> = built.iter().map(|b| b.order.making_amount).collect();
        assert_eq!(making, vec![U256::from(334), U256::from(333), U256::from(333)]);

        let taking: Vec<U256> = built.iter().map(|b| b.order.taking_amount).collect();
        assert_eq!(taking, vec![U256::from(1000); 3]);

        for (i, b) in built.iter().enumerate() {
            assert_eq!(b.order.maker_traits.strategy_tag().unwrap(), StrategyTag::Twap);
            assert_eq!(
                b.order.decoded_predicate().unwrap(),
                Predicate::Twap {
                    start_time: NOW + 60 + 600 * i as u64,
                    interval: 600,
                    trade_count: 3,
                }
            );
        }

        assert_ne!(built[0].order.salt, built[1].order.salt);
        assert_ne!(built[1].order.salt, built[2].order.salt);
        assert_ne!(built[0].order_hash, built[1].order_hash);
    }

    #[test]
    fn test_twap_siblings_with_fixed_salt() {
        let mut req = twap_request();
        req.salt = Some(U256::from(100));
        let built = builder().build(&req).unwrap();
        let salts: Vec<U256> = built.iter().map(|b| b.order.salt).collect();
        assert_eq!(salts, vec![U256::from(100), U256::from(101), U256::from(102)]);
    }

    #[test]
    fn test_twap_total_mismatch_rejected() {
        let mut req = twap_request();
        req.amounts.making = U256::from(999);
        assert!(matches!(
            builder().build(&req),
            Err(CoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_twap_with_more_trades_than_units_rejected() {
        let mut req = request(Strategy::Twap {
            total_amount: U256::from(2),
            number_of_trades: 3,
            time_interval: 60,
            start_time: NOW,
        });
        req.amounts.making = U256::from(2);
        // The third chunk would carry a zero making amount.
        assert!(builder().build(&req).is_err());
    }

    #[test]
    fn test_build_single_rejects_multi_sibling_twap() {
        assert!(builder().build_single(&twap_request()).is_err());
    }

    #[test]
    fn test_options_order() {
        let built = builder()
            .build_single(&request(Strategy::Options {
                strike_price: U256::from(2000),
                expiration_time: NOW + 86_400,
                call_or_put: OptionKind::Put,
                premium: U256::from(15),
            }))
            .unwrap();
        assert_eq!(
            built.order.decoded_predicate().unwrap(),
            Predicate::Options {
                strike: U256::from(2000),
                expiration: NOW + 86_400,
                is_call: false,
            }
        );
    }

    #[test]
    fn test_range_order() {
        let built = builder()
            .build_single(&request(Strategy::Range {
                lower_price: U256::from(95),
                upper_price: U256::from(105),
            }))
            .unwrap();
        assert_eq!(built.order.predicate.len(), 64);
    }

    #[test]
    fn test_equal_assets_rejected() {
        let mut req = request(Strategy::Plain);
        req.assets.taker_asset = req.assets.maker_asset;
        assert!(matches!(
            builder().build(&req),
            Err(CoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_short_expiration_rejected() {
        let mut req = request(Strategy::Plain);
        req.traits.expiration_offset_secs = Some(30);
        assert!(matches!(
            builder().build(&req),
            Err(CoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_one_entropy_draw_per_sibling() {
        let entropy = SequenceEntropy::new(9);
        let b = OrderBuilder::new(OrderConfig::default(), ManualClock::new(NOW), &entropy).unwrap();
        b.build(&twap_request()).unwrap();
        assert_eq!(entropy.draws(), 3);
    }

    #[test]
    fn test_clock_read_once_per_build() {
        let mut clock = MockTestClock::new();
        clock.expect_now_secs().times(1).return_const(NOW);

        let b = OrderBuilder::new(OrderConfig::default(), clock, SequenceEntropy::new(1)).unwrap();
        let built = b.build(&twap_request()).unwrap();
        assert_eq!(built.len(), 3);
    }

    #[test]
    fn test_typed_data_document() {
        let built = builder().build_single(&request(Strategy::Plain)).unwrap();
        let typed = &built.signable_payload.typed_data;
        assert_eq!(typed["primaryType"], "Order");
        assert_eq!(typed["domain"]["chainId"], 1);
        assert_eq!(typed["message"]["makingAmount"], "1000");
        assert_eq!(typed["types"]["Order"].as_array().unwrap().len(), 9);
    }

    #[test]
    fn test_payload_matches_domain() {
        let b = builder();
        let built = b.build_single(&request(Strategy::Plain)).unwrap();
        assert_eq!(
            built.signable_payload.domain_separator,
            b.domain().hash_struct()
        );
        assert_eq!(built.signable_payload.struct_hash, built.order.struct_hash());
        assert_eq!(b.hash_order(&built.order), built.order_hash);
    }
}
