//! Round Scheduler
//!
//! The outer control loop. One round: check the native balance against the
//! floor, pick a target token, sync a fresh nonce cursor, run one operation,
//! and every few add-liquidity rounds withdraw part of the position. Rounds
//! run strictly one after another.
//!
//! This is the only place errors are recovered: a failed round is logged,
//! followed by a backoff sleep, and the loop carries on.
//!
//! Created: 2026-10-18

pub mod backoff;
pub mod clock;
pub mod counter;

pub use backoff::{Backoff, BackoffPolicy};
pub use clock::{Clock, SystemClock};
pub use counter::{AmountSpec, RemovalCounter};

use crate::chain::ChainClient;
use crate::error::{BotError, BotResult};
use crate::execution::NonceCursor;
use crate::operations::{OperationComposer, OperationKind, OperationReport};
use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, U256};
use rand::seq::SliceRandom;
use rand::Rng;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct RoundSettings {
    pub mode: OperationKind,
    pub tokens: Vec<Address>,
    pub amount: AmountSpec,
    /// Rounds are skipped while the native balance is below this
    pub balance_floor: U256,
    /// Sleep after a round, uniform in seconds
    pub round_delay_secs: RangeInclusive<u64>,
    pub low_balance_delay: Duration,
}

/// Result of one round that ran an operation
#[derive(Debug, Clone)]
pub struct RoundReport {
    pub operation: OperationReport,
    pub removal: Option<OperationReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub rounds: u64,
    pub completed: u64,
    /// Rounds whose operation found nothing to do
    pub skipped: u64,
    pub low_balance: u64,
    pub failed: u64,
    pub removals: u64,
}

pub struct RoundScheduler<C, K, R> {
    chain: Arc<C>,
    composer: OperationComposer<C, K>,
    clock: Arc<K>,
    rng: R,
    settings: RoundSettings,
    /// `None` when removal is disabled
    removal: Option<RemovalCounter>,
    backoff: Backoff,
}

impl<C: ChainClient, K: Clock, R: Rng + Send> RoundScheduler<C, K, R> {
    pub fn new(
        chain: Arc<C>,
        composer: OperationComposer<C, K>,
        clock: Arc<K>,
        rng: R,
        settings: RoundSettings,
        removal: Option<RemovalCounter>,
        backoff: BackoffPolicy,
    ) -> BotResult<Self> {
        if settings.tokens.is_empty() {
            return Err(BotError::Config("token list is empty".to_string()));
        }
        if settings.round_delay_secs.is_empty() {
            return Err(BotError::Config("round delay range is empty".to_string()));
        }
        Ok(Self {
            chain,
            composer,
            clock,
            rng,
            settings,
            removal,
            backoff: Backoff::new(backoff),
        })
    }

    pub fn removal_counter(&self) -> Option<&RemovalCounter> {
        self.removal.as_ref()
    }

    /// One round without the trailing sleep.
    pub async fn run_round(&mut self) -> BotResult<RoundReport> {
        let owner = self.composer.owner();
        let balance = self
            .chain
            .native_balance(owner)
            .await
            .map_err(|e| BotError::Rpc(format!("balance of {:?}: {}", owner, e)))?;
        info!("Balance: {} ETH", format_ether(balance));

        if balance < self.settings.balance_floor {
            return Err(BotError::InsufficientBalance {
                balance,
                floor: self.settings.balance_floor,
            });
        }

        let token = *self
            .settings
            .tokens
            .choose(&mut self.rng)
            .ok_or_else(|| BotError::Config("token list is empty".to_string()))?;
        let amount = self.settings.amount.draw(&mut self.rng);
        info!(
            "Mode {} | target {} ({:?}) | amount {} ETH",
            self.settings.mode,
            self.composer.token_label(token).await,
            token,
            format_ether(amount)
        );

        let mut cursor = NonceCursor::sync(self.chain.as_ref(), owner).await?;
        let operation = self
            .composer
            .run(self.settings.mode, token, amount, &mut cursor)
            .await?;

        let removal_due = match self.removal.as_mut() {
            Some(counter) if self.settings.mode.adds_liquidity() && operation.completed() => {
                let due = counter.record_add();
                info!("LP count {}/{}", counter.count(), counter.threshold());
                due
            }
            _ => false,
        };

        let removal = if removal_due {
            info!("Removal threshold reached, removing liquidity");
            let mut cursor = NonceCursor::sync(self.chain.as_ref(), owner).await?;
            let report = self
                .composer
                .run(OperationKind::RemoveLiquidity, token, U256::ZERO, &mut cursor)
                .await?;
            if let Some(counter) = self.removal.as_mut() {
                counter.reset(&mut self.rng);
                info!("Next removal after {} LP rounds", counter.threshold());
            }
            Some(report)
        } else {
            None
        };

        Ok(RoundReport { operation, removal })
    }

    /// Run a round, record it, and sleep according to its outcome.
    pub async fn tick(&mut self, stats: &mut RunStats) {
        stats.rounds += 1;
        info!("====== Round {} ======", stats.rounds);

        let delay = match self.run_round().await {
            Ok(report) => {
                if report.operation.skipped() {
                    stats.skipped += 1;
                } else {
                    stats.completed += 1;
                }
                if report.removal.as_ref().is_some_and(|r| r.completed()) {
                    stats.removals += 1;
                }
                self.backoff.reset();
                let secs = self.rng.gen_range(self.settings.round_delay_secs.clone());
                Duration::from_secs(secs)
            }
            Err(BotError::InsufficientBalance { balance, floor }) => {
                stats.low_balance += 1;
                warn!(
                    "Balance {} ETH below floor {} ETH, skipping round",
                    format_ether(balance),
                    format_ether(floor)
                );
                self.settings.low_balance_delay
            }
            Err(e) => {
                stats.failed += 1;
                if e.after_submission() {
                    warn!("A transaction from this round may still be pending or mined");
                }
                let delay = self.backoff.next_delay();
                error!(
                    "Round failed ({}): {} | retrying in {:?} (failure #{})",
                    e.label(),
                    e,
                    delay,
                    self.backoff.failures()
                );
                delay
            }
        };

        info!("Sleeping {:?}", delay);
        self.clock.sleep(delay).await;
    }

    /// Loop until `stop` is set, or for `max_rounds` rounds when given.
    /// The flag is only checked between rounds.
    pub async fn run(&mut self, max_rounds: Option<u64>, stop: &AtomicBool) -> RunStats {
        let mut stats = RunStats::default();
        while !stop.load(Ordering::SeqCst) && max_rounds.map_or(true, |max| stats.rounds < max) {
            self.tick(&mut stats).await;
        }
        info!(
            "Finished {} rounds: {} completed, {} skipped, {} low balance, {} failed, {} removals",
            stats.rounds, stats.completed, stats.skipped, stats.low_balance, stats.failed, stats.removals
        );
        stats
    }
}
