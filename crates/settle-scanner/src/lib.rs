//! Cross-venue arbitrage scanning.
//!
//! Takes price observations from several venues and reports asset/venue pairs
//! whose price gap exceeds both confidence bands and a minimum percentage.
//! Scanning is pure; opportunities are ephemeral and can be turned into order
//! requests by the caller.

pub mod config;
pub mod opportunity;
pub mod scanner;

pub use config::ScannerConfig;
pub use opportunity::{ArbitrageOpportunity, PriceObservation, VenueQuote};
pub use scanner::ArbitrageScanner;
