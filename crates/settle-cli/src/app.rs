//! Command implementations.
//!
//! Each command takes parsed input, runs the domain crates with production
//! clock and entropy (or injected ones in tests), records metrics, and
//! returns a serializable result. Printing is left to `main`.

use alloy::primitives::{Address, U256};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use settle_channel::ChannelLifecycleManager;
use settle_core::{split_amount, Clock, EntropySource, ManualClock, OsEntropy, SystemClock};
use settle_escrow::{BridgeLeg, EscrowBuilder, EscrowStatus, HtlcEscrow, Secret};
use settle_order::{BuiltOrder, OrderBuilder, OrderRequest, SignedOrder};
use settle_scanner::{ArbitrageOpportunity, ArbitrageScanner, PriceObservation};
use settle_telemetry::Metrics;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::script::{ChannelOp, ChannelRunReport, ChannelScript, StepOutcome};
use crate::signer::LocalSigner;

/// Input of `bridge-plan`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeRequest {
    pub source: BridgeLeg,
    pub destination: BridgeLeg,
    pub source_duration_secs: u64,
    pub destination_duration_secs: u64,
}

/// Output of `build-order`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BuildOutput {
    Unsigned(Vec<BuiltOrder>),
    Signed(Vec<SignedOrder>),
}

/// Application wired with a clock and an entropy source.
pub struct Application<C: Clock + Clone, E: EntropySource + Clone> {
    config: AppConfig,
    clock: C,
    entropy: E,
}

impl Application<SystemClock, OsEntropy> {
    /// Production wiring: wall clock and OS randomness.
    pub fn new(config: AppConfig) -> Self {
        Self::with_sources(config, SystemClock, OsEntropy)
    }
}

impl<C: Clock + Clone, E: EntropySource + Clone> Application<C, E> {
    pub fn with_sources(config: AppConfig, clock: C, entropy: E) -> Self {
        Self {
            config,
            clock,
            entropy,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// `split`: residue-free chunks of `total`.
    pub fn split(&self, total: U256, count: u32) -> AppResult<Vec<U256>> {
        split_amount(total, count).map_err(|e| rejected("split", e.into()))
    }

    /// `build-order`: build (and optionally sign) the orders of a request.
    pub async fn build_orders(
        &self,
        request: &OrderRequest,
        signer: Option<&LocalSigner>,
    ) -> AppResult<BuildOutput> {
        let builder = OrderBuilder::new(
            self.config.order.clone(),
            self.clock.clone(),
            self.entropy.clone(),
        )?;
        let strategy = request.strategy.tag().to_string();
        let built = builder
            .build(request)
            .map_err(|e| rejected("build_order", e.into()))?;
        Metrics::orders_built(&strategy, built.len());
        info!(strategy = %strategy, count = built.len(), "Orders built");

        let Some(signer) = signer else {
            return Ok(BuildOutput::Unsigned(built));
        };

        let mut signed = Vec::with_capacity(built.len());
        for order in built {
            let order = signer
                .sign_order(order, builder.domain())
                .await
                .map_err(|e| rejected("sign_order", e))?;
            Metrics::order_signed(&strategy);
            signed.push(order);
        }
        Ok(BuildOutput::Signed(signed))
    }

    /// `escrow-create`: a new escrow and its secret.
    pub fn escrow_create(
        &self,
        amount: U256,
        recipient: Address,
        sender: Address,
        duration_secs: u64,
    ) -> AppResult<Value> {
        let builder = self.escrow_builder()?;
        let created = builder
            .create(amount, recipient, sender, duration_secs)
            .map_err(|e| rejected("escrow_create", e.into()))?;
        Metrics::escrow_transition(&EscrowStatus::Created.to_string());

        Ok(json!({
            "escrow": created.escrow,
            "secret": created.secret.to_hex(),
        }))
    }

    /// `escrow-verify`: check a secret against an escrow without mutating it.
    ///
    /// The document must be self-consistent before the secret is looked at.
    pub fn escrow_verify(&self, escrow: &HtlcEscrow, secret_hex: &str) -> AppResult<Value> {
        escrow
            .check_integrity()
            .map_err(|e| rejected("escrow_verify", e.into()))?;
        let secret = Secret::from_hex(secret_hex).map_err(|e| rejected("escrow_verify", e.into()))?;
        let now = self.clock.now_secs();
        Ok(json!({
            "escrowId": escrow.id(),
            "valid": escrow.verify_secret(&secret),
            "expired": escrow.is_expired(now),
            "status": escrow.status(),
        }))
    }

    /// `bridge-plan`: both legs of a cross-chain swap.
    pub fn bridge_plan(&self, request: &BridgeRequest) -> AppResult<Value> {
        let builder = self.escrow_builder()?;
        let plan = builder
            .create_bridge(
                &request.source,
                &request.destination,
                request.source_duration_secs,
                request.destination_duration_secs,
            )
            .map_err(|e| rejected("bridge_plan", e.into()))?;
        for leg in [&plan.source, &plan.destination] {
            Metrics::escrow_transition(&leg.status().to_string());
        }

        Ok(json!({
            "source": plan.source,
            "destination": plan.destination,
            "secret": plan.secret.to_hex(),
            "safetyMarginSecs": builder.config().safety_margin_secs,
        }))
    }

    /// `channel-run`: drive a manager through a script.
    ///
    /// The script gets its own manual clock starting at `start_time` (or
    /// now), moved only by `advance` steps.
    pub fn channel_run(&self, script: ChannelScript) -> AppResult<ChannelRunReport> {
        let clock = ManualClock::new(script.start_time.unwrap_or_else(|| self.clock.now_secs()));
        let mut manager = ChannelLifecycleManager::create(
            self.config.channel.clone(),
            &clock,
            script.channel_id,
            script.participants,
            script.deposit,
            script.split_percent,
        )
        .map_err(|e| rejected("channel_create", e.into()))?;
        Metrics::channel_op("create");

        let mut steps = Vec::with_capacity(script.ops.len());
        for (index, op) in script.ops.into_iter().enumerate() {
            let name = op.name();
            let result = match op {
                ChannelOp::ConfirmOpen => manager.confirm_open().map(|_| ()),
                ChannelOp::Trade { delta } => manager.trade(delta).map(|_| ()),
                ChannelOp::Resize { new_total } => manager.resize(new_total).map(|_| ()),
                ChannelOp::Close { allocations } => manager.close(allocations).map(|_| ()),
                ChannelOp::Challenge { candidate } => manager.challenge(candidate).map(|_| ()),
                ChannelOp::FinalizeChallenge => manager.finalize_challenge().map(|_| ()),
                ChannelOp::Advance { secs } => {
                    clock.advance(secs);
                    Ok(())
                }
            };

            let error = match result {
                Ok(()) => {
                    if name != "advance" {
                        Metrics::channel_op(name);
                    }
                    None
                }
                Err(e) => {
                    Metrics::rejected(&format!("channel_{name}"), e.kind());
                    warn!(index, op = name, error = %e, "Channel step rejected");
                    if !script.continue_on_error {
                        return Err(AppError::Core(e));
                    }
                    Some(e.to_string())
                }
            };

            let state = manager.state();
            steps.push(StepOutcome {
                index,
                op: name.to_string(),
                now: clock.now_secs(),
                error,
                nonce: state.nonce,
                status: state.status.to_string(),
            });
        }

        Ok(ChannelRunReport {
            steps,
            final_state: manager.state().clone(),
            pending_challenge: manager.pending_challenge().cloned(),
        })
    }

    /// `scan`: arbitrage opportunities in a batch of observations.
    pub fn scan(
        &self,
        observations: &[PriceObservation],
        min_percent: Option<Decimal>,
    ) -> AppResult<Vec<ArbitrageOpportunity>> {
        let scanner = ArbitrageScanner::new(self.config.scanner.clone())?;
        let found = match min_percent {
            Some(pct) => scanner.scan(observations, pct),
            None => scanner.scan_default(observations),
        };

        for opp in &found {
            let pct = opp.percentage_diff.to_f64().unwrap_or_default();
            Metrics::opportunity(&opp.token_pair, pct);
        }
        info!(
            observations = observations.len(),
            opportunities = found.len(),
            "Scan complete"
        );
        Ok(found)
    }

    fn escrow_builder(&self) -> AppResult<EscrowBuilder<C, E>> {
        Ok(EscrowBuilder::new(
            self.config.escrow.clone(),
            self.clock.clone(),
            self.entropy.clone(),
        )?)
    }
}

/// Count a rejected operation and pass the error through.
fn rejected(op: &str, err: AppError) -> AppError {
    Metrics::rejected(op, err.kind());
    warn!(op, error = %err, "Operation rejected");
    err
}
