//! Application error types.

use settle_core::CoreError;
use thiserror::Error;

use crate::signer::KeyError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] settle_telemetry::TelemetryError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl AppError {
    /// Label for the rejection metric.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Core(e) => e.kind(),
            Self::Config(_) => "config",
            Self::Key(_) | Self::Signing(_) => "signing",
            Self::Telemetry(_) => "telemetry",
            Self::Json(_) => "json",
            Self::Io(_) => "io",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
