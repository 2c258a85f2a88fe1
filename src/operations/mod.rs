//! Operation Composer
//!
//! Sequences single steps into the logical operations the bot runs each
//! round. Every flow threads one `NonceCursor` through its steps and stops at
//! the first failure; nothing already confirmed is rolled back.
//!
//! Flows:
//!     - `lp`       wrap, approve both legs, add liquidity at the quoted ratio
//!     - `swap`     wrap, approve, swap WETH for the target token
//!     - `swap-lp`  swap, then deposit what the swap actually delivered
//!     - `balanced` swap half a budget, size the base leg from a reverse quote
//!     - removal    withdraw a share of the live LP balance
//!
//! Created: 2026-10-18

mod liquidity;
mod removal;
mod swap;

use crate::amm::{min_accepted, Fraction, QuoteService, Tolerance, TokenPair};
use crate::chain::ChainClient;
use crate::error::{BotError, BotResult};
use crate::execution::action::{AddLiquidityArgs, DepositArgs, SwapArgs};
use crate::execution::{Action, ApprovalGate, NonceCursor, StepExecutor, StepReceipt};
use crate::scheduler::Clock;
use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The operation a round runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    /// Wrap, approve, add liquidity (`lp`)
    #[serde(rename = "lp")]
    WrapAddLiquidity,
    /// Wrap, approve, swap (`swap`)
    #[serde(rename = "swap")]
    WrapSwap,
    /// Swap, then add the received amount as liquidity (`swap-lp`)
    #[serde(rename = "swap-lp")]
    SwapAddLiquidity,
    /// Budget split with reverse-quote sizing (`balanced`)
    Balanced,
    RemoveLiquidity,
}

impl OperationKind {
    /// True for flows that end with an add-liquidity step
    pub fn adds_liquidity(&self) -> bool {
        matches!(
            self,
            OperationKind::WrapAddLiquidity | OperationKind::SwapAddLiquidity | OperationKind::Balanced
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::WrapAddLiquidity => "lp",
            OperationKind::WrapSwap => "swap",
            OperationKind::SwapAddLiquidity => "swap-lp",
            OperationKind::Balanced => "balanced",
            OperationKind::RemoveLiquidity => "remove-liquidity",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-operation state machine. Step numbers start at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationState {
    Building,
    Submitted(usize),
    Confirmed(usize),
    Aborted,
    Complete,
    /// Nothing to do (no pool, no LP balance, empty swap delta)
    Skipped,
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OperationState::Building => write!(f, "building"),
            OperationState::Submitted(n) => write!(f, "submitted(step {})", n),
            OperationState::Confirmed(n) => write!(f, "confirmed(step {})", n),
            OperationState::Aborted => write!(f, "aborted"),
            OperationState::Complete => write!(f, "complete"),
            OperationState::Skipped => write!(f, "skipped"),
        }
    }
}

/// What a finished operation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationReport {
    pub kind: OperationKind,
    pub token: Address,
    pub steps: Vec<StepReceipt>,
    pub state: OperationState,
}

impl OperationReport {
    pub fn completed(&self) -> bool {
        self.state == OperationState::Complete
    }

    pub fn skipped(&self) -> bool {
        self.state == OperationState::Skipped
    }
}

/// Tracks one operation's steps and state transitions.
struct OperationRun {
    kind: OperationKind,
    token: Address,
    steps: Vec<StepReceipt>,
    state: OperationState,
}

impl OperationRun {
    fn new(kind: OperationKind, token: Address) -> Self {
        debug!("[{}] {:?} -> {}", kind, token, OperationState::Building);
        Self {
            kind,
            token,
            steps: Vec::new(),
            state: OperationState::Building,
        }
    }

    fn transition(&mut self, next: OperationState) {
        debug!("[{}] {} -> {}", self.kind, self.state, next);
        self.state = next;
    }

    fn next_step(&self) -> usize {
        self.steps.len() + 1
    }

    fn record(&mut self, receipt: StepReceipt) {
        let n = self.next_step();
        self.steps.push(receipt);
        self.transition(OperationState::Confirmed(n));
    }

    fn skip(&mut self, reason: &str) {
        warn!("[{}] skipped for {:?}: {}", self.kind, self.token, reason);
        self.transition(OperationState::Skipped);
    }

    fn abort(&mut self, err: &BotError) {
        error!(
            "[{}] aborted after {} confirmed step(s): {}",
            self.kind,
            self.steps.len(),
            err
        );
        self.transition(OperationState::Aborted);
    }

    fn finish(mut self) -> OperationReport {
        if self.state != OperationState::Skipped {
            self.transition(OperationState::Complete);
        }
        OperationReport {
            kind: self.kind,
            token: self.token,
            steps: self.steps,
            state: self.state,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComposerSettings {
    pub router: Address,
    pub factory: Address,
    pub weth: Address,
    pub tolerance: Tolerance,
    /// Over-approval on the target token before add-liquidity
    pub approval_margin: Fraction,
    pub swap_deadline_secs: u64,
    pub remove_deadline_secs: u64,
    /// Share of the LP balance withdrawn per removal
    pub removal_fraction: Fraction,
    /// Cap on the base leg in `balanced` mode
    pub balanced_ceiling: U256,
}

pub struct OperationComposer<C, K> {
    executor: StepExecutor<C>,
    quotes: QuoteService<C>,
    settings: ComposerSettings,
    clock: Arc<K>,
}

impl<C: ChainClient, K: Clock> OperationComposer<C, K> {
    pub fn new(executor: StepExecutor<C>, settings: ComposerSettings, clock: Arc<K>) -> Self {
        let quotes = QuoteService::new(executor.chain().clone(), settings.router);
        Self {
            executor,
            quotes,
            settings,
            clock,
        }
    }

    pub fn owner(&self) -> Address {
        self.executor.owner()
    }

    pub fn settings(&self) -> &ComposerSettings {
        &self.settings
    }

    fn chain(&self) -> &Arc<C> {
        self.executor.chain()
    }

    /// Run one operation against `token` with `amount` wei of native input.
    /// `amount` is ignored by `RemoveLiquidity`.
    pub async fn run(
        &self,
        kind: OperationKind,
        token: Address,
        amount: U256,
        cursor: &mut NonceCursor,
    ) -> BotResult<OperationReport> {
        let mut op = OperationRun::new(kind, token);

        let result = match kind {
            OperationKind::WrapAddLiquidity => self.wrap_add_liquidity(&mut op, token, amount, cursor).await,
            OperationKind::WrapSwap => self.wrap_swap(&mut op, token, amount, cursor).await,
            OperationKind::SwapAddLiquidity => self.swap_add_liquidity(&mut op, token, amount, cursor).await,
            OperationKind::Balanced => self.balanced(&mut op, token, amount, cursor).await,
            OperationKind::RemoveLiquidity => self.remove_liquidity(&mut op, token, cursor).await,
        };

        match result {
            Ok(()) => {
                let report = op.finish();
                info!(
                    "[{}] {} with {} transaction(s)",
                    report.kind,
                    report.state,
                    report.steps.len()
                );
                Ok(report)
            }
            Err(e) => {
                op.abort(&e);
                Err(e)
            }
        }
    }

    /// Token symbol for logs, `UNKNOWN` when the call fails.
    pub async fn token_label(&self, token: Address) -> String {
        self.chain()
            .token_symbol(token)
            .await
            .unwrap_or_else(|_| "UNKNOWN".to_string())
    }

    fn deadline(&self, window_secs: u64) -> u64 {
        self.clock.unix_now().saturating_add(window_secs)
    }

    async fn execute(&self, op: &mut OperationRun, action: Action, cursor: &mut NonceCursor) -> BotResult<()> {
        op.transition(OperationState::Submitted(op.next_step()));
        let receipt = self.executor.execute(&action, cursor).await?;
        op.record(receipt);
        Ok(())
    }

    async fn wrap(&self, op: &mut OperationRun, amount: U256, cursor: &mut NonceCursor) -> BotResult<()> {
        info!("Wrap {} ETH", format_ether(amount));
        let action = Action::Deposit(DepositArgs {
            weth: self.settings.weth,
            amount,
        });
        self.execute(op, action, cursor).await
    }

    /// Router allowance for `token`, approving exactly `amount` if short.
    /// A sufficient allowance consumes no step and no nonce.
    async fn approve(
        &self,
        op: &mut OperationRun,
        token: Address,
        amount: U256,
        cursor: &mut NonceCursor,
    ) -> BotResult<()> {
        let gate = ApprovalGate::new(self.chain().as_ref(), self.owner());
        match gate.approval_for(token, self.settings.router, amount).await? {
            Some(action) => self.execute(op, action, cursor).await,
            None => Ok(()),
        }
    }

    /// Swap `amount_in` along `pair`'s forward path, protected by `min_out`.
    async fn swap(
        &self,
        op: &mut OperationRun,
        pair: &TokenPair,
        amount_in: U256,
        min_out: U256,
        cursor: &mut NonceCursor,
    ) -> BotResult<()> {
        let action = Action::Swap(SwapArgs {
            router: self.settings.router,
            amount_in,
            amount_out_min: min_out,
            path: pair.forward_path(),
            to: self.owner(),
            deadline: self.deadline(self.settings.swap_deadline_secs),
        });
        self.execute(op, action, cursor).await
    }

    /// Add `base_amount` WETH and `token_amount` of the target token, each leg
    /// protected by the slippage tolerance independently.
    async fn add_liquidity(
        &self,
        op: &mut OperationRun,
        pair: &TokenPair,
        base_amount: U256,
        token_amount: U256,
        cursor: &mut NonceCursor,
    ) -> BotResult<()> {
        let tolerance = self.settings.tolerance;
        let action = Action::AddLiquidity(AddLiquidityArgs {
            router: self.settings.router,
            token_a: pair.base,
            token_b: pair.quote,
            amount_a_desired: base_amount,
            amount_b_desired: token_amount,
            amount_a_min: min_accepted(base_amount, tolerance),
            amount_b_min: min_accepted(token_amount, tolerance),
            to: self.owner(),
            deadline: self.deadline(self.settings.swap_deadline_secs),
        });
        self.execute(op, action, cursor).await
    }

    /// Protected minimum for a quoted output. A minimum of zero means the
    /// quote is dust and the swap would be unprotected.
    fn protected_min(&self, quoted: U256, path: &[Address]) -> BotResult<U256> {
        let min_out = min_accepted(quoted, self.settings.tolerance);
        if min_out.is_zero() {
            return Err(BotError::QuoteUnavailable {
                path: crate::amm::quote::format_path(path),
                reason: format!("quoted output {} rounds to a zero minimum", quoted),
            });
        }
        Ok(min_out)
    }

    async fn read_token_balance(&self, token: Address) -> BotResult<U256> {
        self.chain()
            .token_balance(token, self.owner())
            .await
            .map_err(|e| BotError::Rpc(format!("balanceOf {:?}: {}", token, e)))
    }
}
