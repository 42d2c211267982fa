//! Prometheus metrics for settle.
//!
//! Recorded at the application layer; the domain crates stay free of global
//! state.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A failure means duplicate metric names,
//! a programming error that surfaces on first use rather than at runtime
//! after a successful start.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

use crate::error::TelemetryResult;

/// Orders built, by strategy.
pub static ORDERS_BUILT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "settle_orders_built_total",
        "Total orders built",
        &["strategy"]
    )
    .unwrap()
});

/// Orders signed through the local signer.
pub static ORDERS_SIGNED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "settle_orders_signed_total",
        "Total orders signed locally",
        &["strategy"]
    )
    .unwrap()
});

/// Escrow state transitions.
/// Labels: to (created/funded/claimed/refunded)
pub static ESCROW_TRANSITIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "settle_escrow_transitions_total",
        "Total escrow state transitions",
        &["to"]
    )
    .unwrap()
});

/// Channel operations applied.
/// Labels: op (create/confirm_open/trade/resize/close/challenge/finalize_challenge)
pub static CHANNEL_OPS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "settle_channel_ops_total",
        "Total channel operations applied",
        &["op"]
    )
    .unwrap()
});

/// Opportunities reported by the scanner, by asset.
pub static OPPORTUNITIES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "settle_opportunities_total",
        "Total arbitrage opportunities found",
        &["asset"]
    )
    .unwrap()
});

/// Percentage difference of reported opportunities.
pub static OPPORTUNITY_PCT: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "settle_opportunity_pct",
        "Percentage price difference of reported opportunities",
        &["asset"],
        vec![0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 25.0]
    )
    .unwrap()
});

/// Rejected operations.
/// Labels: op, kind (invalid_argument/invariant_violation/invalid_state/expired)
pub static REJECTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "settle_rejected_total",
        "Total rejected operations",
        &["op", "kind"]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record built orders.
    pub fn orders_built(strategy: &str, count: usize) {
        ORDERS_BUILT_TOTAL
            .with_label_values(&[strategy])
            .inc_by(count as f64);
    }

    /// Record a locally signed order.
    pub fn order_signed(strategy: &str) {
        ORDERS_SIGNED_TOTAL.with_label_values(&[strategy]).inc();
    }

    /// Record an escrow transition.
    pub fn escrow_transition(to: &str) {
        ESCROW_TRANSITIONS_TOTAL.with_label_values(&[to]).inc();
    }

    /// Record an applied channel operation.
    pub fn channel_op(op: &str) {
        CHANNEL_OPS_TOTAL.with_label_values(&[op]).inc();
    }

    /// Record a reported opportunity.
    pub fn opportunity(asset: &str, pct: f64) {
        OPPORTUNITIES_TOTAL.with_label_values(&[asset]).inc();
        OPPORTUNITY_PCT.with_label_values(&[asset]).observe(pct);
    }

    /// Record a rejected operation.
    pub fn rejected(op: &str, kind: &str) {
        REJECTED_TOTAL.with_label_values(&[op, kind]).inc();
    }

    /// Encode every registered metric in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_increment() {
        let before = ORDERS_BUILT_TOTAL.with_label_values(&["twap"]).get();
        Metrics::orders_built("twap", 3);
        let after = ORDERS_BUILT_TOTAL.with_label_values(&["twap"]).get();
        assert_eq!(after - before, 3.0);
    }

    #[test]
    fn test_render_contains_recorded_metrics() {
        Metrics::rejected("escrow_claim", "invalid_argument");
        Metrics::channel_op("trade");
        let text = Metrics::render().unwrap();
        assert!(text.contains("settle_rejected_total"));
        assert!(text.contains("settle_channel_ops_total"));
    }
}
