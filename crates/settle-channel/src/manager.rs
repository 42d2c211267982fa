//! Channel lifecycle manager.
//!
//! One manager owns one channel and is the only writer of its state.
//!
//! ```text
//! Pending ──confirm_open──► Open ──close──────────────► Closed
//!                            │                            ▲
//!                            └──challenge──► Challenged ──┘ finalize_challenge
//!                                              │    ▲
//!                                              └────┘ challenge (higher nonce)
//! ```
//!
//! Every operation computes the next state first and commits it only after
//! all checks pass.

use alloy::primitives::{Address, B256, I256, U256};
use alloy::sol_types::Eip712Domain;
use serde::{Deserialize, Serialize};
use settle_core::{Clock, CoreError, Result};
use tracing::{debug, warn};

use crate::config::ChannelConfig;
use crate::state::{ChannelState, ChannelStatus, SignedChannelState};

/// A challenged state waiting out its window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingChallenge {
    pub candidate: SignedChannelState,
    /// Unix seconds at which the candidate may be finalized.
    pub deadline: u64,
}

/// Owner of a single channel's state.
pub struct ChannelLifecycleManager<C: Clock> {
    config: ChannelConfig,
    domain: Eip712Domain,
    clock: C,
    state: ChannelState,
    challenge: Option<PendingChallenge>,
}

impl<C: Clock> ChannelLifecycleManager<C> {
    /// Open a new channel in `Pending`.
    ///
    /// Allocations are `(deposit * split_percent / 100, deposit - that)`.
    ///
    /// # Errors
    /// `InvalidArgument` if `split_percent` is outside `[1, 99]`, the deposit
    /// is zero, the participants are equal, or the config is invalid.
    pub fn create(
        config: ChannelConfig,
        clock: C,
        channel_id: B256,
        participants: [Address; 2],
        deposit: U256,
        split_percent: u8,
    ) -> Result<Self> {
        config.validate()?;
        if !(1..=99).contains(&split_percent) {
            return Err(CoreError::invalid_argument(format!(
                "split percent {split_percent} outside [1, 99]"
            )));
        }
        if deposit.is_zero() {
            return Err(CoreError::invalid_argument("deposit must be positive"));
        }
        if participants[0] == participants[1] {
            return Err(CoreError::invalid_argument(format!(
                "participants are both {}",
                participants[0]
            )));
        }

        let first = deposit
            .checked_mul(U256::from(split_percent))
            .map(|v| v / U256::from(100))
            .ok_or_else(|| CoreError::invalid_argument("deposit too large to split"))?;
        let second = deposit - first;

        let state = ChannelState {
            channel_id,
            participants,
            allocations: [first, second],
            nonce: 0,
            status: ChannelStatus::Pending,
        };
        debug!(
            channel_id = %channel_id,
            deposit = %deposit,
            split_percent,
            "Channel created"
        );

        Ok(Self {
            domain: config.domain(),
            config,
            clock,
            state,
            challenge: None,
        })
    }

    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    pub fn pending_challenge(&self) -> Option<&PendingChallenge> {
        self.challenge.as_ref()
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn domain(&self) -> &Eip712Domain {
        &self.domain
    }

    /// Digest of `state` under this channel's domain.
    pub fn state_hash(&self, state: &ChannelState) -> B256 {
        state.state_hash(&self.domain)
    }

    /// `Pending → Open` once the funding transaction is confirmed.
    pub fn confirm_open(&mut self) -> Result<&ChannelState> {
        self.require(ChannelStatus::Pending, "confirm_open")?;
        let mut next = self.state.clone();
        next.status = ChannelStatus::Open;
        Ok(self.commit(next, "confirm_open"))
    }

    /// Move value between participants.
    ///
    /// # Errors
    /// - `InvalidState` unless `Open`
    /// - `InvariantViolation` if the delta does not sum to zero or would
    ///   drive an allocation negative
    pub fn trade(&mut self, delta: [I256; 2]) -> Result<&ChannelState> {
        self.require(ChannelStatus::Open, "trade")?;

        let sum = delta[0]
            .checked_add(delta[1])
            .ok_or_else(|| CoreError::invariant("trade delta overflows"))?;
        if !sum.is_zero() {
            return Err(CoreError::invariant(format!(
                "trade delta [{}, {}] does not sum to zero",
                delta[0], delta[1]
            )));
        }

        let mut next = self.state.clone();
        for (allocation, d) in next.allocations.iter_mut().zip(delta) {
            *allocation = apply_delta(*allocation, d)?;
        }
        next.nonce = self.next_nonce()?;
        Ok(self.commit(next, "trade"))
    }

    /// Change the channel total, keeping the ratio between participants.
    ///
    /// `a0' = a0 * new_total / old_total`, `a1' = new_total - a0'`.
    ///
    /// # Errors
    /// - `InvalidState` unless `Open`
    /// - `InvalidArgument` for a zero total or an overflowing product
    pub fn resize(&mut self, new_total: U256) -> Result<&ChannelState> {
        self.require(ChannelStatus::Open, "resize")?;
        if new_total.is_zero() {
            return Err(CoreError::invalid_argument("new total must be positive"));
        }
        let old_total = self.total()?;

        let first = self.state.allocations[0]
            .checked_mul(new_total)
            .map(|v| v / old_total)
            .ok_or_else(|| CoreError::invalid_argument("resize product overflows u256"))?;

        let mut next = self.state.clone();
        next.allocations = [first, new_total - first];
        next.nonce = self.next_nonce()?;
        Ok(self.commit(next, "resize"))
    }

    /// Cooperative close with agreed final allocations.
    ///
    /// # Errors
    /// - `InvalidState` unless `Open`
    /// - `InvariantViolation` if the final allocations change the total
    pub fn close(&mut self, final_allocations: [U256; 2]) -> Result<&ChannelState> {
        self.require(ChannelStatus::Open, "close")?;
        let total = self.total()?;
        let final_total = final_allocations[0]
            .checked_add(final_allocations[1])
            .ok_or_else(|| CoreError::invariant("final allocations overflow"))?;
        if final_total != total {
            return Err(CoreError::invariant(format!(
                "final allocations sum to {final_total}, channel holds {total}"
            )));
        }

        let mut next = self.state.clone();
        next.allocations = final_allocations;
        next.status = ChannelStatus::Closed;
        next.nonce = self.next_nonce()?;
        Ok(self.commit(next, "close"))
    }

    /// Submit a co-signed state to the challenge window.
    ///
    /// Allowed while `Open`, and while `Challenged` to rebut with a newer
    /// state. Each accepted challenge restarts the window.
    ///
    /// # Errors
    /// - `InvalidState` when `Pending` or `Closed`
    /// - `InvalidArgument` for a state of another channel or bad signatures
    /// - `InvariantViolation` for a stale nonce or a changed total
    pub fn challenge(&mut self, candidate: SignedChannelState) -> Result<&PendingChallenge> {
        if !matches!(
            self.state.status,
            ChannelStatus::Open | ChannelStatus::Challenged
        ) {
            return Err(CoreError::invalid_state(format!(
                "cannot challenge channel {} in status {}",
                self.state.channel_id, self.state.status
            )));
        }

        let proposed = &candidate.state;
        if !proposed.same_channel(&self.state) {
            return Err(CoreError::invalid_argument(format!(
                "candidate belongs to channel {}, not {}",
                proposed.channel_id, self.state.channel_id
            )));
        }

        let latest = self.latest_known();
        if !proposed.supersedes(latest) {
            warn!(
                channel_id = %self.state.channel_id,
                candidate_nonce = proposed.nonce,
                current_nonce = latest.nonce,
                "Stale challenge rejected"
            );
            return Err(CoreError::invariant(format!(
                "candidate nonce {} does not exceed current nonce {}",
                proposed.nonce, latest.nonce
            )));
        }

        let total = self.total()?;
        if proposed.total() != Some(total) {
            return Err(CoreError::invariant(format!(
                "candidate allocations do not sum to channel total {total}"
            )));
        }

        candidate.verify(&self.domain)?;

        let deadline = self
            .clock
            .now_secs()
            .checked_add(self.config.challenge_period_secs)
            .ok_or_else(|| CoreError::invalid_argument("challenge deadline overflows u64"))?;

        let mut next = self.state.clone();
        next.status = ChannelStatus::Challenged;
        self.commit(next, "challenge");

        debug!(
            channel_id = %self.state.channel_id,
            candidate_nonce = candidate.state.nonce,
            deadline,
            "Challenge window started"
        );
        Ok(self.challenge.insert(PendingChallenge {
            candidate,
            deadline,
        }))
    }

    /// Adopt the challenged state once its window has passed.
    ///
    /// # Errors
    /// `InvalidState` unless `Challenged` with the deadline reached.
    pub fn finalize_challenge(&mut self) -> Result<&ChannelState> {
        self.require(ChannelStatus::Challenged, "finalize_challenge")?;
        let pending = self
            .challenge
            .as_ref()
            .ok_or_else(|| CoreError::invalid_state("challenged channel has no candidate"))?;

        let now = self.clock.now_secs();
        if now < pending.deadline {
            return Err(CoreError::invalid_state(format!(
                "challenge window open until {}, now {now}",
                pending.deadline
            )));
        }

        let mut next = pending.candidate.state.clone();
        next.status = ChannelStatus::Closed;
        self.challenge = None;
        Ok(self.commit(next, "finalize_challenge"))
    }

    /// The newest state this manager has accepted, including a pending
    /// challenge candidate.
    fn latest_known(&self) -> &ChannelState {
        match &self.challenge {
            Some(pending) if pending.candidate.state.supersedes(&self.state) => {
                &pending.candidate.state
            }
            _ => &self.state,
        }
    }

    fn require(&self, expected: ChannelStatus, op: &str) -> Result<()> {
        if self.state.status != expected {
            return Err(CoreError::invalid_state(format!(
                "cannot {op} channel {} in status {}",
                self.state.channel_id, self.state.status
            )));
        }
        Ok(())
    }

    fn total(&self) -> Result<U256> {
        self.state
            .total()
            .ok_or_else(|| CoreError::invariant("channel allocations overflow"))
    }

    fn next_nonce(&self) -> Result<u64> {
        self.state
            .nonce
            .checked_add(1)
            .ok_or_else(|| CoreError::invariant("channel nonce exhausted"))
    }

    fn commit(&mut self, next: ChannelState, op: &str) -> &ChannelState {
        debug!(
            channel_id = %next.channel_id,
            op,
            from = %self.state.status,
            to = %next.status,
            nonce = next.nonce,
            "Channel transition"
        );
        self.state = next;
        &self.state
    }
}

fn apply_delta(allocation: U256, delta: I256) -> Result<U256> {
    let magnitude = delta.unsigned_abs();
    if delta.is_negative() {
        allocation.checked_sub(magnitude).ok_or_else(|| {
            CoreError::invariant(format!(
                "allocation {allocation} cannot absorb delta {delta}"
            ))
        })
    } else {
        allocation
            .checked_add(magnitude)
            .ok_or_else(|| CoreError::invariant("allocation overflows u256"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::signers::local::PrivateKeySigner;
    use alloy::signers::SignerSync;
    use settle_core::ManualClock;

    const NOW: u64 = 1_700_000_000;

    struct Fixture {
        a: PrivateKeySigner,
        b: PrivateKeySigner,
        clock: ManualClock,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                a: PrivateKeySigner::random(),
                b: PrivateKeySigner::random(),
                clock: ManualClock::new(NOW),
            }
        }

        fn manager(&self) -> ChannelLifecycleManager<&ManualClock> {
            ChannelLifecycleManager::create(
                ChannelConfig::default(),
                &self.clock,
                B256::repeat_byte(0x42),
                [self.a.address(), self.b.address()],
                U256::from(100),
                50,
            )
            .unwrap()
        }

        fn open(&self) -> ChannelLifecycleManager<&ManualClock> {
            let mut m = self.manager();
            m.confirm_open().unwrap();
            m
        }

        fn signed(
            &self,
            m: &ChannelLifecycleManager<&ManualClock>,
            allocations: [u64; 2],
            nonce: u64,
        ) -> SignedChannelState {
            let mut state = m.state().clone();
            state.allocations = [U256::from(allocations[0]), U256::from(allocations[1])];
            state.nonce = nonce;
            let digest = m.state_hash(&state);
            SignedChannelState::new(
                state,
                [
                    self.a.sign_hash_sync(&digest).unwrap(),
                    self.b.sign_hash_sync(&digest).unwrap(),
                ],
            )
        }
    }

    fn delta(a: i64, b: i64) -> [I256; 2] {
        [I256::try_from(a).unwrap(), I256::try_from(b).unwrap()]
    }

    #[test]
    fn test_create_splits_deposit() {
        let f = Fixture::new();
        let m = f.manager();
        assert_eq!(m.state().allocations, [U256::from(50), U256::from(50)]);
        assert_eq!(m.state().nonce, 0);
        assert_eq!(m.state().status, ChannelStatus::Pending);
    }

    #[test]
    fn test_create_uneven_split_floors_first() {
        let f = Fixture::new();
        let m = ChannelLifecycleManager::create(
            ChannelConfig::default(),
            &f.clock,
            B256::ZERO,
            [f.a.address(), f.b.address()],
            U256::from(101),
            33,
        )
        .unwrap();
        assert_eq!(m.state().allocations, [U256::from(33), U256::from(68)]);
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let f = Fixture::new();
        let parties = [f.a.address(), f.b.address()];
        for split in [0u8, 100] {
            assert!(matches!(
                ChannelLifecycleManager::create(
                    ChannelConfig::default(),
                    &f.clock,
                    B256::ZERO,
                    parties,
                    U256::from(100),
                    split,
                ),
                Err(CoreError::InvalidArgument(_))
            ));
        }
        assert!(ChannelLifecycleManager::create(
            ChannelConfig::default(),
            &f.clock,
            B256::ZERO,
            parties,
            U256::ZERO,
            50,
        )
        .is_err());
        assert!(ChannelLifecycleManager::create(
            ChannelConfig::default(),
            &f.clock,
            B256::ZERO,
            [f.a.address(), f.a.address()],
            U256::from(100),
            50,
        )
        .is_err());
    }

    #[test]
    fn test_trade_moves_value() {
        let f = Fixture::new();
        let mut m = f.open();
        let state = m.trade(delta(-10, 10)).unwrap();
        assert_eq!(state.allocations, [U256::from(40), U256::from(60)]);
        assert_eq!(state.nonce, 1);
    }

    #[test]
    fn test_trade_requires_open() {
        let f = Fixture::new();
        let mut m = f.manager();
        assert!(matches!(
            m.trade(delta(-10, 10)),
            Err(CoreError::InvalidState(_))
        ));
    }

    #[test]
    fn test_trade_rejects_unbalanced_delta() {
        let f = Fixture::new();
        let mut m = f.open();
        assert!(matches!(
            m.trade(delta(-10, 11)),
            Err(CoreError::InvariantViolation(_))
        ));
        assert_eq!(m.state().nonce, 0);
    }

    #[test]
    fn test_trade_rejects_negative_allocation() {
        let f = Fixture::new();
        let mut m = f.open();
        assert!(matches!(
            m.trade(delta(-51, 51)),
            Err(CoreError::InvariantViolation(_))
        ));
        assert_eq!(m.state().allocations, [U256::from(50), U256::from(50)]);
        m.trade(delta(-50, 50)).unwrap();
        assert_eq!(m.state().allocations, [U256::ZERO, U256::from(100)]);
    }

    #[test]
    fn test_resize_keeps_ratio() {
        let f = Fixture::new();
        let mut m = f.open();
        m.trade(delta(-10, 10)).unwrap();
        let state = m.resize(U256::from(200)).unwrap();
        assert_eq!(state.allocations, [U256::from(80), U256::from(120)]);
        assert_eq!(state.nonce, 2);

        let state = m.resize(U256::from(7)).unwrap();
        // 80 * 7 / 200 = 2 (floored), remainder to the second participant.
        assert_eq!(state.allocations, [U256::from(2), U256::from(5)]);
        assert!(m.resize(U256::ZERO).is_err());
    }

    #[test]
    fn test_trade_resize_sequence_conserves_total() {
        enum Step {
            Trade(i64),
            Resize(u64),
        }
        use Step::*;

        let fx = Fixture::new();
        let mut m = fx.open();
        let mut total = U256::from(100);
        let mut accepted = 0u64;

        // Trade(k) moves k from participant 0 to participant 1.
        let steps = [
            Trade(10),
            Trade(-25),
            Resize(333),
            Trade(200),
            Trade(1000),
            Resize(7),
            Trade(-7),
            Trade(-1),
            Resize(1),
            Trade(1),
            Resize(1_000_000),
        ];
        // Deterministic pseudo-random tail.
        let mut seed: u64 = 0x5eed;
        let tail = (0..200).map(|_| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let r = seed >> 33;
            if r % 4 == 0 {
                Resize(1 + r % 5000)
            } else {
                Trade((r % 401) as i64 - 200)
            }
        });

        for step in steps.into_iter().chain(tail) {
            let before = m.state().clone();
            let result = match step {
                Trade(k) => m.trade(delta(-k, k)).map(|s| s.clone()),
                Resize(n) => {
                    let result = m.resize(U256::from(n)).map(|s| s.clone());
                    if result.is_ok() {
                        total = U256::from(n);
                    }
                    result
                }
            };

            let after = m.state();
            assert_eq!(after.allocations[0] + after.allocations[1], total);
            match result {
                Ok(state) => {
                    assert_eq!(&state, after);
                    assert_eq!(after.nonce, before.nonce + 1);
                    accepted += 1;
                }
                Err(e) => {
                    assert!(matches!(e, CoreError::InvariantViolation(_)));
                    assert_eq!(after, &before);
                }
            }
        }
        assert!(accepted > 0);
        assert_eq!(m.state().nonce, accepted);
    }

    #[test]
    fn test_close_checks_total() {
        let f = Fixture::new();
        let mut m = f.open();
        assert!(matches!(
            m.close([U256::from(50), U256::from(51)]),
            Err(CoreError::InvariantViolation(_))
        ));
        let state = m.close([U256::from(30), U256::from(70)]).unwrap();
        assert_eq!(state.status, ChannelStatus::Closed);
        assert_eq!(state.nonce, 1);
        assert!(matches!(
            m.trade(delta(-1, 1)),
            Err(CoreError::InvalidState(_))
        ));
    }

    #[test]
    fn test_challenge_and_finalize() {
        let f = Fixture::new();
        let mut m = f.open();
        m.trade(delta(-10, 10)).unwrap();

        let candidate = f.signed(&m, [30, 70], 2);
        let pending = m.challenge(candidate).unwrap();
        assert_eq!(pending.deadline, NOW + 86_400);
        assert_eq!(m.state().status, ChannelStatus::Challenged);

        assert!(matches!(
            m.trade(delta(-1, 1)),
            Err(CoreError::InvalidState(_))
        ));

        f.clock.advance(86_399);
        assert!(matches!(
            m.finalize_challenge(),
            Err(CoreError::InvalidState(_))
        ));

        f.clock.advance(1);
        let state = m.finalize_challenge().unwrap();
        assert_eq!(state.status, ChannelStatus::Closed);
        assert_eq!(state.allocations, [U256::from(30), U256::from(70)]);
        assert_eq!(state.nonce, 2);
        assert!(m.pending_challenge().is_none());
    }

    #[test]
    fn test_stale_challenge_rejected() {
        let f = Fixture::new();
        let mut m = f.open();
        m.trade(delta(-10, 10)).unwrap();
        m.trade(delta(-10, 10)).unwrap();

        let stale = f.signed(&m, [50, 50], 2);
        assert!(matches!(
            m.challenge(stale),
            Err(CoreError::InvariantViolation(_))
        ));
        assert_eq!(m.state().status, ChannelStatus::Open);
    }

    #[test]
    fn test_rebuttal_needs_higher_nonce_and_restarts_window() {
        let f = Fixture::new();
        let mut m = f.open();

        m.challenge(f.signed(&m, [20, 80], 3)).unwrap();
        f.clock.advance(1000);

        assert!(matches!(
            m.challenge(f.signed(&m, [60, 40], 3)),
            Err(CoreError::InvariantViolation(_))
        ));

        let pending = m.challenge(f.signed(&m, [60, 40], 4)).unwrap();
        assert_eq!(pending.deadline, NOW + 1000 + 86_400);
        assert_eq!(pending.candidate.state.nonce, 4);
    }

    #[test]
    fn test_challenge_rejects_changed_total() {
        let f = Fixture::new();
        let mut m = f.open();
        assert!(matches!(
            m.challenge(f.signed(&m, [60, 60], 1)),
            Err(CoreError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_challenge_rejects_other_channel() {
        let f = Fixture::new();
        let mut m = f.open();
        let mut candidate = f.signed(&m, [40, 60], 1);
        candidate.state.channel_id = B256::repeat_byte(0x43);
        assert!(matches!(
            m.challenge(candidate),
            Err(CoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_challenge_rejects_single_signature() {
        let f = Fixture::new();
        let mut m = f.open();
        let mut state = m.state().clone();
        state.nonce = 1;
        let digest = m.state_hash(&state);
        let sig_a = f.a.sign_hash_sync(&digest).unwrap();
        let candidate = SignedChannelState::new(state, [sig_a, sig_a]);

        assert!(matches!(
            m.challenge(candidate),
            Err(CoreError::InvalidArgument(_))
        ));
        assert_eq!(m.state().status, ChannelStatus::Open);
        assert!(m.pending_challenge().is_none());
    }

    #[test]
    fn test_challenge_requires_open_or_challenged() {
        let f = Fixture::new();
        let mut m = f.manager();
        let candidate = f.signed(&m, [50, 50], 1);
        assert!(matches!(
            m.challenge(candidate),
            Err(CoreError::InvalidState(_))
        ));
    }

    #[test]
    fn test_confirm_open_only_once() {
        let f = Fixture::new();
        let mut m = f.open();
        assert!(matches!(m.confirm_open(), Err(CoreError::InvalidState(_))));
    }
}
