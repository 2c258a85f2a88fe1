//! `swap` flow

use super::{OperationComposer, OperationRun};
use crate::amm::TokenPair;
use crate::chain::ChainClient;
use crate::error::BotResult;
use crate::execution::NonceCursor;
use crate::scheduler::Clock;
use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, U256};
use tracing::info;

impl<C: ChainClient, K: Clock> OperationComposer<C, K> {
    /// Wrap -> Approve(WETH, amount) -> Swap with a protected minimum.
    /// The quote is taken after the approval, right before the swap.
    pub(super) async fn wrap_swap(
        &self,
        op: &mut OperationRun,
        token: Address,
        amount: U256,
        cursor: &mut NonceCursor,
    ) -> BotResult<()> {
        let pair = TokenPair::new(self.settings.weth, token);
        let path = pair.forward_path();

        self.wrap(op, amount, cursor).await?;
        self.approve(op, self.settings.weth, amount, cursor).await?;

        let quote = self.quotes.quote(amount, &path).await?;
        let min_out = self.protected_min(quote.amount_out, &path)?;

        info!(
            "Swap {} ETH -> {} | quoted {} | min {}",
            format_ether(amount),
            self.token_label(token).await,
            quote.amount_out,
            min_out
        );
        self.swap(op, &pair, amount, min_out, cursor).await
    }
}
