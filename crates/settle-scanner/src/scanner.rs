//! Arbitrage scanner implementation.
//!
//! Compares every pair of venues quoting the same asset and keeps the pairs
//! whose price gap clears both venues' confidence bands and the caller's
//! minimum percentage.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rust_decimal::Decimal;
use settle_core::Result;
use tracing::{debug, trace, warn};

use crate::config::ScannerConfig;
use crate::opportunity::{ArbitrageOpportunity, PriceObservation, VenueQuote};

/// Cross-venue scanner. Stateless between calls.
pub struct ArbitrageScanner {
    config: ScannerConfig,
}

impl ArbitrageScanner {
    /// Create a scanner.
    ///
    /// # Errors
    /// `InvalidArgument` if the configuration is invalid.
    pub fn new(config: ScannerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Scan with the configured default minimum percentage.
    pub fn scan_default(&self, observations: &[PriceObservation]) -> Vec<ArbitrageOpportunity> {
        self.scan(observations, self.config.default_min_percent)
    }

    /// Find opportunities in `observations`.
    ///
    /// Unusable quotes (non-positive price, negative confidence) are dropped
    /// and only the newest quote per `(asset, venue)` counts. For each venue
    /// pair on one asset an opportunity is emitted iff
    /// `diff > max(conf_a, conf_b)` and `diff / min(p_a, p_b) * 100 >= min_percent`.
    ///
    /// Output is sorted by percentage diff (desc), estimated profit (desc),
    /// then asset and venue names.
    pub fn scan(
        &self,
        observations: &[PriceObservation],
        min_percent: Decimal,
    ) -> Vec<ArbitrageOpportunity> {
        let latest = latest_quotes(observations);

        let mut found = Vec::new();
        for (asset, venues) in &latest {
            // BTreeMap iteration keeps venue_a < venue_b.
            let quotes: Vec<&PriceObservation> = venues.values().copied().collect();
            for (i, a) in quotes.iter().enumerate() {
                for b in &quotes[i + 1..] {
                    if let Some(opp) = self.evaluate(asset, a, b, min_percent) {
                        found.push(opp);
                    }
                }
            }
        }

        found.sort_by(compare_opportunities);

        debug!(
            observations = observations.len(),
            assets = latest.len(),
            opportunities = found.len(),
            min_percent = %min_percent,
            "Scan complete"
        );
        found
    }

    fn evaluate(
        &self,
        asset: &str,
        a: &PriceObservation,
        b: &PriceObservation,
        min_percent: Decimal,
    ) -> Option<ArbitrageOpportunity> {
        let diff = a.price.abs_diff(b.price).inner();
        let band = a.confidence.max(b.confidence);
        if diff <= band {
            trace!(asset, venue_a = %a.venue, venue_b = %b.venue, %diff, %band, "Gap inside confidence band");
            return None;
        }

        let Some(percentage_diff) = a.price.gap_pct(b.price) else {
            warn!(asset, venue_a = %a.venue, venue_b = %b.venue, "Price gap out of decimal range, pair skipped");
            return None;
        };
        if percentage_diff < min_percent {
            return None;
        }

        let Some(estimated_profit) = self.estimate_profit(a, b, diff) else {
            warn!(asset, venue_a = %a.venue, venue_b = %b.venue, "Profit estimate out of decimal range, pair skipped");
            return None;
        };

        debug!(
            asset,
            venue_a = %a.venue,
            venue_b = %b.venue,
            price_a = %a.price,
            price_b = %b.price,
            percentage_diff = %percentage_diff,
            estimated_profit = %estimated_profit,
            "Arbitrage opportunity"
        );

        Some(ArbitrageOpportunity {
            token_pair: asset.to_string(),
            venue_a: VenueQuote::from(a),
            venue_b: VenueQuote::from(b),
            percentage_diff,
            estimated_profit,
        })
    }
}

impl ArbitrageScanner {
    /// `trade_size * (diff - (p_a + p_b) * fee_rate)`, `None` on overflow.
    fn estimate_profit(
        &self,
        a: &PriceObservation,
        b: &PriceObservation,
        diff: Decimal,
    ) -> Option<Decimal> {
        let fees = a
            .price
            .inner()
            .checked_add(b.price.inner())?
            .checked_mul(self.config.fee_rate())?;
        self.config.trade_size.value_at(diff.checked_sub(fees)?)
    }
}

/// Newest usable observation per asset and venue. Equal timestamps keep the
/// later entry in input order.
fn latest_quotes(
    observations: &[PriceObservation],
) -> BTreeMap<&str, BTreeMap<&str, &PriceObservation>> {
    let mut latest: BTreeMap<&str, BTreeMap<&str, &PriceObservation>> = BTreeMap::new();
    for obs in observations.iter().filter(|o| o.is_usable()) {
        let venues = latest.entry(obs.asset.as_str()).or_default();
        match venues.get(obs.venue.as_str()) {
            Some(existing) if existing.timestamp > obs.timestamp => {}
            _ => {
                venues.insert(obs.venue.as_str(), obs);
            }
        }
    }
    latest
}

fn compare_opportunities(x: &ArbitrageOpportunity, y: &ArbitrageOpportunity) -> Ordering {
    y.percentage_diff
        .cmp(&x.percentage_diff)
        .then_with(|| y.estimated_profit.cmp(&x.estimated_profit))
        .then_with(|| x.token_pair.cmp(&y.token_pair))
        .then_with(|| x.venue_a.venue.cmp(&y.venue_a.venue))
        .then_with(|| x.venue_b.venue.cmp(&y.venue_b.venue))
}
