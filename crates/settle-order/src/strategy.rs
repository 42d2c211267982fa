//! Order strategies.
//!
//! A strategy decides the tag packed into the maker traits and the predicate
//! payload the on-chain verifier checks before a fill.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use settle_core::{CoreError, Result};
use std::fmt;

use crate::predicate::Predicate;

/// 3-bit strategy tag stored in maker traits bits 2..=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyTag {
    Plain = 0,
    Twap = 1,
    Options = 2,
    Range = 3,
}

impl StrategyTag {
    #[inline]
    pub fn bits(self) -> u8 {
        self as u8
    }

    pub fn from_bits(bits: u8) -> Result<Self> {
        match bits {
            0 => Ok(Self::Plain),
            1 => Ok(Self::Twap),
            2 => Ok(Self::Options),
            3 => Ok(Self::Range),
            other => Err(CoreError::invalid_argument(format!(
                "unknown strategy tag {other}"
            ))),
        }
    }
}

impl fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Twap => write!(f, "twap"),
            Self::Options => write!(f, "options"),
            Self::Range => write!(f, "range"),
        }
    }
}

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Call,
    Put,
}

impl OptionKind {
    #[inline]
    pub fn is_call(self) -> bool {
        matches!(self, Self::Call)
    }
}

/// Strategy selected by the trader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Strategy {
    /// Single spot order with no predicate.
    Plain,
    /// Time-weighted order split into `number_of_trades` timed chunks.
    #[serde(rename_all = "camelCase")]
    Twap {
        total_amount: U256,
        number_of_trades: u32,
        /// Seconds between consecutive chunks.
        time_interval: u64,
        /// Unix seconds at which the first chunk becomes fillable.
        start_time: u64,
    },
    /// Option-like order fillable only while unexpired.
    #[serde(rename_all = "camelCase")]
    Options {
        strike_price: U256,
        expiration_time: u64,
        call_or_put: OptionKind,
        /// Premium carried for the caller's bookkeeping; not part of the predicate.
        premium: U256,
    },
    /// Fillable only while the price sits in `[lower_price, upper_price]`.
    #[serde(rename_all = "camelCase")]
    Range { lower_price: U256, upper_price: U256 },
}

impl Strategy {
    pub fn tag(&self) -> StrategyTag {
        match self {
            Self::Plain => StrategyTag::Plain,
            Self::Twap { .. } => StrategyTag::Twap,
            Self::Options { .. } => StrategyTag::Options,
            Self::Range { .. } => StrategyTag::Range,
        }
    }

    /// Check strategy parameters against `now` (Unix seconds).
    ///
    /// # Errors
    /// - `InvalidArgument` for zero/out-of-range parameters
    /// - `Expired` for an option whose expiration is not in the future
    pub fn validate(&self, now: u64) -> Result<()> {
        match self {
            Self::Plain => Ok(()),
            Self::Twap {
                total_amount,
                number_of_trades,
                time_interval,
                ..
            } => {
                if total_amount.is_zero() {
                    return Err(CoreError::invalid_argument("TWAP total amount must be positive"));
                }
                if *number_of_trades == 0 {
                    return Err(CoreError::invalid_argument(
                        "TWAP number of trades must be at least 1",
                    ));
                }
                if *time_interval == 0 {
                    return Err(CoreError::invalid_argument("TWAP time interval must be positive"));
                }
                Ok(())
            }
            Self::Options {
                strike_price,
                expiration_time,
                ..
            } => {
                if strike_price.is_zero() {
                    return Err(CoreError::invalid_argument("option strike must be positive"));
                }
                if *expiration_time <= now {
                    return Err(CoreError::expired(format!(
                        "option expiration {expiration_time} is not after now {now}"
                    )));
                }
                Ok(())
            }
            Self::Range {
                lower_price,
                upper_price,
            } => {
                if lower_price.is_zero() {
                    return Err(CoreError::invalid_argument("range lower bound must be positive"));
                }
                if lower_price >= upper_price {
                    return Err(CoreError::invalid_argument(format!(
                        "range lower bound {lower_price} must be below upper bound {upper_price}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Predicate for the `index`-th order produced by this strategy.
    ///
    /// Only TWAP produces more than one order; sibling `index` starts at
    /// `start_time + index * time_interval`.
    pub fn predicate_for(&self, index: u32) -> Result<Predicate> {
        match self {
            Self::Plain => Ok(Predicate::None),
            Self::Twap {
                number_of_trades,
                time_interval,
                start_time,
                ..
            } => {
                let start = time_interval
                    .checked_mul(u64::from(index))
                    .and_then(|offset| start_time.checked_add(offset))
                    .ok_or_else(|| CoreError::invalid_argument("TWAP window overflows u64"))?;
                Ok(Predicate::Twap {
                    start_time: start,
                    interval: *time_interval,
                    trade_count: *number_of_trades,
                })
            }
            Self::Options {
                strike_price,
                expiration_time,
                call_or_put,
                ..
            } => Ok(Predicate::Options {
                strike: *strike_price,
                expiration: *expiration_time,
                is_call: call_or_put.is_call(),
            }),
            Self::Range {
                lower_price,
                upper_price,
            } => Ok(Predicate::Range {
                lower: *lower_price,
                upper: *upper_price,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;

    fn twap() -> Strategy {
        Strategy::Twap {
            total_amount: U256::from(1000),
            number_of_trades: 3,
            time_interval: 600,
            start_time: NOW + 60,
        }
    }

    #[test]
    fn test_tag_round_trip() {
        for tag in [
            StrategyTag::Plain,
            StrategyTag::Twap,
            StrategyTag::Options,
            StrategyTag::Range,
        ] {
            assert_eq!(StrategyTag::from_bits(tag.bits()).unwrap(), tag);
        }
        assert!(StrategyTag::from_bits(4).is_err());
        assert!(StrategyTag::from_bits(7).is_err());
    }

    #[test]
    fn test_twap_validation() {
        assert!(twap().validate(NOW).is_ok());

        let zero_trades = Strategy::Twap {
            total_amount: U256::from(1000),
            number_of_trades: 0,
            time_interval: 600,
            start_time: NOW,
        };
        assert!(matches!(
            zero_trades.validate(NOW),
            Err(CoreError::InvalidArgument(_))
        ));

        let zero_interval = Strategy::Twap {
            total_amount: U256::from(1000),
            number_of_trades: 2,
            time_interval: 0,
            start_time: NOW,
        };
        assert!(zero_interval.validate(NOW).is_err());
    }

    #[test]
    fn test_twap_sibling_windows() {
        let strategy = twap();
        let p0 = strategy.predicate_for(0).unwrap();
        let p2 = strategy.predicate_for(2).unwrap();
        assert_eq!(
            p0,
            Predicate::Twap {
                start_time: NOW + 60,
                interval: 600,
                trade_count: 3
            }
        );
        assert_eq!(
            p2,
            Predicate::Twap {
                start_time: NOW + 60 + 1200,
                interval: 600,
                trade_count: 3
            }
        );
    }

    #[test]
    fn test_twap_window_overflow_rejected() {
        let strategy = Strategy::Twap {
            total_amount: U256::from(10),
            number_of_trades: 2,
            time_interval: u64::MAX,
            start_time: 1,
        };
        assert!(strategy.predicate_for(1).is_err());
    }

    #[test]
    fn test_expired_option_rejected() {
        let option = Strategy::Options {
            strike_price: U256::from(2000),
            expiration_time: NOW,
            call_or_put: OptionKind::Call,
            premium: U256::from(5),
        };
        assert!(matches!(option.validate(NOW), Err(CoreError::Expired(_))));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let range = Strategy::Range {
            lower_price: U256::from(10),
            upper_price: U256::from(10),
        };
        assert!(matches!(
            range.validate(NOW),
            Err(CoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_strategy_json_shape() {
        let json = serde_json::to_value(Strategy::Range {
            lower_price: U256::from(1),
            upper_price: U256::from(2),
        })
        .unwrap();
        assert_eq!(json["type"], "range");
        assert!(json.get("lowerPrice").is_some());
    }
}
