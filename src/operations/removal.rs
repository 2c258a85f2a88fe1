//! Partial liquidity removal
//!
//! The pool is resolved from the canonical token order and the LP balance is
//! re-read live. Both minimums are zero: the removal accepts whatever the pool
//! returns.

use super::{OperationComposer, OperationRun};
use crate::amm::{sort_tokens, TokenPair};
use crate::chain::ChainClient;
use crate::error::{BotError, BotResult};
use crate::execution::action::RemoveLiquidityArgs;
use crate::execution::{Action, NonceCursor};
use crate::scheduler::Clock;
use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, U256};
use tracing::info;

impl<C: ChainClient, K: Clock> OperationComposer<C, K> {
    /// Pool address for an unordered pair, or `None` if the factory has none.
    pub async fn resolve_pool(&self, token_a: Address, token_b: Address) -> BotResult<Option<Address>> {
        let (token0, token1) = sort_tokens(token_a, token_b);
        let pool = self
            .chain()
            .get_pair(self.settings.factory, token0, token1)
            .await
            .map_err(|e| BotError::Rpc(format!("getPair({:?}, {:?}): {}", token0, token1, e)))?;
        Ok((!pool.is_zero()).then_some(pool))
    }

    pub(super) async fn remove_liquidity(
        &self,
        op: &mut OperationRun,
        token: Address,
        cursor: &mut NonceCursor,
    ) -> BotResult<()> {
        let (token0, token1) = TokenPair::new(self.settings.weth, token).canonical();

        let Some(pool) = self.resolve_pool(token0, token1).await? else {
            op.skip("no pool for pair");
            return Ok(());
        };

        let lp_balance = self.read_token_balance(pool).await?;
        if lp_balance.is_zero() {
            op.skip("no LP balance");
            return Ok(());
        }

        let share = self.settings.removal_fraction.share(lp_balance);
        if share.is_zero() {
            op.skip("LP share rounds to zero");
            return Ok(());
        }

        info!(
            "Removing {} LP ({}) of {} from pool {:?}",
            format_ether(share),
            self.settings.removal_fraction,
            format_ether(lp_balance),
            pool
        );

        self.approve(op, pool, share, cursor).await?;

        let action = Action::RemoveLiquidity(RemoveLiquidityArgs {
            router: self.settings.router,
            token_a: token0,
            token_b: token1,
            liquidity: share,
            amount_a_min: U256::ZERO,
            amount_b_min: U256::ZERO,
            to: self.owner(),
            deadline: self.deadline(self.settings.remove_deadline_secs),
        });
        self.execute(op, action, cursor).await
    }
}
