//! Settle command-line application.
//!
//! Wires the domain crates to configuration, key loading, logging and
//! metrics:
//! - `AppConfig`: layered TOML + environment configuration
//! - `Application`: one method per command
//! - `signer`: local key loading and digest signing
//! - `script`: JSON channel scripts

pub mod app;
pub mod config;
pub mod error;
pub mod script;
pub mod signer;

pub use app::{Application, BridgeRequest, BuildOutput};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use script::{ChannelOp, ChannelRunReport, ChannelScript, StepOutcome};
