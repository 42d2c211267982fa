//! Settle - Entry Point
//!
//! Builds orders, escrows and channel transcripts from JSON inputs and prints
//! the results as JSON on stdout. Logs go to stderr.

use std::path::{Path, PathBuf};

use alloy::primitives::{Address, U256};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use settle_cli::signer::{KeyManager, KeySource, LocalSigner};
use settle_cli::{AppConfig, Application, BridgeRequest, ChannelScript};
use settle_escrow::HtlcEscrow;
use settle_order::OrderRequest;
use settle_scanner::PriceObservation;
use settle_telemetry::Metrics;
use tracing::info;

/// Off-chain settlement tooling
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via SETTLE_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Print Prometheus metrics to stderr after the command
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split an amount into near-equal chunks
    Split { total: U256, count: u32 },

    /// Build orders from a JSON order request
    BuildOrder {
        request: PathBuf,
        /// Sign with the key in SETTLE_SIGNING_KEY (must belong to the maker)
        #[arg(long)]
        sign: bool,
        /// Read the signing key from a file instead
        #[arg(long, requires = "sign")]
        key_file: Option<PathBuf>,
    },

    /// Create an HTLC escrow and print it with its secret
    EscrowCreate {
        amount: U256,
        recipient: Address,
        sender: Address,
        /// Seconds until the escrow becomes refundable
        duration: u64,
    },

    /// Check a secret against an escrow JSON document
    EscrowVerify { escrow: PathBuf, secret: String },

    /// Create both escrows of a cross-chain swap
    BridgePlan { request: PathBuf },

    /// Run a channel lifecycle script
    ChannelRun { script: PathBuf },

    /// Scan price observations for arbitrage
    Scan {
        observations: PathBuf,
        /// Minimum percentage gap (defaults to the configured value)
        #[arg(long)]
        min_percent: Option<Decimal>,
    },

    /// Print the effective configuration as TOML
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref())?;
    settle_telemetry::init_logging(&config.telemetry)?;
    info!("Starting settle v{}", env!("CARGO_PKG_VERSION"));

    let app = Application::new(config);

    match args.command {
        Command::Split { total, count } => print_json(&app.split(total, count)?)?,
        Command::BuildOrder {
            request,
            sign,
            key_file,
        } => {
            let request: OrderRequest = read_json(&request)?;
            let signer = if sign {
                let source = key_file
                    .map(|path| KeySource::File { path })
                    .unwrap_or_default();
                let keys = KeyManager::load(&source, Some(request.parties.maker))?;
                Some(LocalSigner::new(keys))
            } else {
                None
            };
            print_json(&app.build_orders(&request, signer.as_ref()).await?)?;
        }
        Command::EscrowCreate {
            amount,
            recipient,
            sender,
            duration,
        } => print_json(&app.escrow_create(amount, recipient, sender, duration)?)?,
        Command::EscrowVerify { escrow, secret } => {
            let escrow: HtlcEscrow = read_json(&escrow)?;
            print_json(&app.escrow_verify(&escrow, &secret)?)?;
        }
        Command::BridgePlan { request } => {
            let request: BridgeRequest = read_json(&request)?;
            print_json(&app.bridge_plan(&request)?)?;
        }
        Command::ChannelRun { script } => {
            let script: ChannelScript = read_json(&script)?;
            print_json(&app.channel_run(script)?)?;
        }
        Command::Scan {
            observations,
            min_percent,
        } => {
            let observations: Vec<PriceObservation> = read_json(&observations)?;
            print_json(&app.scan(&observations, min_percent)?)?;
        }
        Command::ShowConfig => print!("{}", app.config().to_toml()?),
    }

    if args.metrics {
        eprint!("{}", Metrics::render()?);
    }

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
