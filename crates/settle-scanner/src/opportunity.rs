//! Observation and opportunity types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use settle_core::Price;

/// One price quote from one venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Asset or token pair, e.g. `ETH/USDC`.
    pub asset: String,
    pub venue: String,
    pub price: Price,
    /// Half-width of the venue's uncertainty band, in price units.
    #[serde(default)]
    pub confidence: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl PriceObservation {
    /// Positive price and non-negative confidence.
    pub fn is_usable(&self) -> bool {
        self.price.is_positive() && !self.confidence.is_sign_negative()
    }
}

/// A venue's side of an opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueQuote {
    pub venue: String,
    pub price: Price,
    pub confidence: Decimal,
}

impl From<&PriceObservation> for VenueQuote {
    fn from(obs: &PriceObservation) -> Self {
        Self {
            venue: obs.venue.clone(),
            price: obs.price,
            confidence: obs.confidence,
        }
    }
}

/// Price discrepancy between two venues for one asset.
///
/// `venue_a` is the venue whose name sorts first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArbitrageOpportunity {
    pub token_pair: String,
    pub venue_a: VenueQuote,
    pub venue_b: VenueQuote,
    /// `|pA - pB| / min(pA, pB) * 100`.
    pub percentage_diff: Decimal,
    /// Trade size times the price gap net of both legs' fees. May be negative
    /// when fees exceed the gap.
    pub estimated_profit: Decimal,
}

impl ArbitrageOpportunity {
    /// Venue to buy on (lower price).
    pub fn buy_venue(&self) -> &VenueQuote {
        if self.venue_a.price <= self.venue_b.price {
            &self.venue_a
        } else {
            &self.venue_b
        }
    }

    /// Venue to sell on (higher price).
    pub fn sell_venue(&self) -> &VenueQuote {
        if self.venue_a.price <= self.venue_b.price {
            &self.venue_b
        } else {
            &self.venue_a
        }
    }

    pub fn is_profitable(&self) -> bool {
        self.estimated_profit > Decimal::ZERO
    }
}
