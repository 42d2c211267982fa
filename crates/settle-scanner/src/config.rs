//! Scanner configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use settle_core::{CoreError, Result, Size};

/// Configuration for cross-venue scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Quantity used to estimate profit per opportunity.
    #[serde(default = "default_trade_size")]
    pub trade_size: Size,
    /// Fee charged per leg, in basis points of that leg's price.
    #[serde(default = "default_fee_bps")]
    pub fee_bps: Decimal,
    /// Minimum percentage difference when the caller passes none.
    #[serde(default = "default_min_percent")]
    pub default_min_percent: Decimal,
}

fn default_trade_size() -> Size {
    Size::ONE
}

fn default_fee_bps() -> Decimal {
    Decimal::from(10) // 0.10% per leg
}

fn default_min_percent() -> Decimal {
    Decimal::ONE
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            trade_size: default_trade_size(),
            fee_bps: default_fee_bps(),
            default_min_percent: default_min_percent(),
        }
    }
}

impl ScannerConfig {
    /// Validate configuration values.
    ///
    /// Returns Err if:
    /// - trade_size <= 0
    /// - fee_bps < 0
    /// - default_min_percent < 0
    pub fn validate(&self) -> Result<()> {
        if !self.trade_size.is_positive() {
            return Err(CoreError::invalid_argument(format!(
                "trade_size ({}) must be positive",
                self.trade_size
            )));
        }
        if self.fee_bps.is_sign_negative() {
            return Err(CoreError::invalid_argument(format!(
                "fee_bps ({}) must be non-negative",
                self.fee_bps
            )));
        }
        if self.default_min_percent.is_sign_negative() {
            return Err(CoreError::invalid_argument(format!(
                "default_min_percent ({}) must be non-negative",
                self.default_min_percent
            )));
        }
        Ok(())
    }

    /// Fee as a fraction: `fee_bps / 10000`.
    pub fn fee_rate(&self) -> Decimal {
        self.fee_bps / Decimal::from(10000)
    }
}
