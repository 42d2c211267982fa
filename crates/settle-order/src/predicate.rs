//! Predicate payload encoding.
//!
//! Fixed-width big-endian layouts, no tag prefix (the tag lives in the maker
//! traits):
//!
//! | strategy | layout                                         | bytes |
//! |----------|------------------------------------------------|-------|
//! | plain    | (empty)                                        | 0     |
//! | twap     | start_time u64 ‖ interval u64 ‖ trade_count u32 | 20    |
//! | options  | strike u256 ‖ expiration u64 ‖ is_call u8       | 41    |
//! | range    | lower u256 ‖ upper u256                         | 64    |
//!
//! Encoding is pure: the same predicate always yields the same bytes, which is
//! what lets an independent verifier rebuild it off-chain.

use alloy::primitives::{Bytes, U256};
use serde::{Deserialize, Serialize};
use settle_core::{CoreError, Result};

use crate::strategy::StrategyTag;

pub const TWAP_PREDICATE_LEN: usize = 20;
pub const OPTIONS_PREDICATE_LEN: usize = 41;
pub const RANGE_PREDICATE_LEN: usize = 64;

/// Decoded predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Predicate {
    None,
    #[serde(rename_all = "camelCase")]
    Twap {
        start_time: u64,
        interval: u64,
        trade_count: u32,
    },
    #[serde(rename_all = "camelCase")]
    Options {
        strike: U256,
        expiration: u64,
        is_call: bool,
    },
    Range { lower: U256, upper: U256 },
}

impl Predicate {
    pub fn tag(&self) -> StrategyTag {
        match self {
            Self::None => StrategyTag::Plain,
            Self::Twap { .. } => StrategyTag::Twap,
            Self::Options { .. } => StrategyTag::Options,
            Self::Range { .. } => StrategyTag::Range,
        }
    }

    /// Encode into the fixed binary layout.
    pub fn encode(&self) -> Bytes {
        let mut data = Vec::with_capacity(RANGE_PREDICATE_LEN);
        match self {
            Self::None => {}
            Self::Twap {
                start_time,
                interval,
                trade_count,
            } => {
                data.extend_from_slice(&start_time.to_be_bytes());
                data.extend_from_slice(&interval.to_be_bytes());
                data.extend_from_slice(&trade_count.to_be_bytes());
            }
            Self::Options {
                strike,
                expiration,
                is_call,
            } => {
                data.extend_from_slice(&strike.to_be_bytes::<32>());
                data.extend_from_slice(&expiration.to_be_bytes());
                data.push(u8::from(*is_call));
            }
            Self::Range { lower, upper } => {
                data.extend_from_slice(&lower.to_be_bytes::<32>());
                data.extend_from_slice(&upper.to_be_bytes::<32>());
            }
        }
        Bytes::from(data)
    }

    /// Decode a payload produced for `tag`.
    ///
    /// # Errors
    /// `InvalidArgument` on a length mismatch or an `is_call` byte other than 0/1.
    pub fn decode(tag: StrategyTag, bytes: &[u8]) -> Result<Self> {
        let expect_len = |len: usize| {
            if bytes.len() == len {
                Ok(())
            } else {
                Err(CoreError::invalid_argument(format!(
                    "{tag} predicate must be {len} bytes, got {}",
                    bytes.len()
                )))
            }
        };

        match tag {
            StrategyTag::Plain => {
                expect_len(0)?;
                Ok(Self::None)
            }
            StrategyTag::Twap => {
                expect_len(TWAP_PREDICATE_LEN)?;
                Ok(Self::Twap {
                    start_time: read_u64(&bytes[0..8]),
                    interval: read_u64(&bytes[8..16]),
                    trade_count: read_u32(&bytes[16..20]),
                })
            }
            StrategyTag::Options => {
                expect_len(OPTIONS_PREDICATE_LEN)?;
                let is_call = match bytes[40] {
                    0 => false,
                    1 => true,
                    other => {
                        return Err(CoreError::invalid_argument(format!(
                            "invalid call/put flag {other:#04x}"
                        )))
                    }
                };
                Ok(Self::Options {
                    strike: U256::from_be_slice(&bytes[0..32]),
                    expiration: read_u64(&bytes[32..40]),
                    is_call,
                })
            }
            StrategyTag::Range => {
                expect_len(RANGE_PREDICATE_LEN)?;
                Ok(Self::Range {
                    lower: U256::from_be_slice(&bytes[0..32]),
                    upper: U256::from_be_slice(&bytes[32..64]),
                })
            }
        }
    }
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_be_bytes(buf)
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_be_bytes(buf)
}
