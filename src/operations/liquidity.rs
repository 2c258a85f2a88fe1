//! Add-liquidity flows: `lp`, `swap-lp` and `balanced`

use super::{OperationComposer, OperationRun};
use crate::amm::{with_margin, TokenPair};
use crate::chain::ChainClient;
use crate::error::BotResult;
use crate::execution::NonceCursor;
use crate::scheduler::Clock;
use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, U256};
use tracing::info;

impl<C: ChainClient, K: Clock> OperationComposer<C, K> {
    /// Wrap -> Approve(token, quote + margin) -> Approve(WETH) -> AddLiquidity.
    /// The token leg is the router's quote for the base amount.
    pub(super) async fn wrap_add_liquidity(
        &self,
        op: &mut OperationRun,
        token: Address,
        base_amount: U256,
        cursor: &mut NonceCursor,
    ) -> BotResult<()> {
        let pair = TokenPair::new(self.settings.weth, token);
        let quote = self.quotes.quote(base_amount, &pair.forward_path()).await?;
        let token_amount = quote.amount_out;
        let token_approval = with_margin(token_amount, self.settings.approval_margin);

        info!(
            "Add liquidity {} | base {} ETH | token {} (approve {}, +{}) | slippage {}",
            self.token_label(token).await,
            format_ether(base_amount),
            token_amount,
            token_approval,
            self.settings.approval_margin,
            self.settings.tolerance
        );

        self.wrap(op, base_amount, cursor).await?;
        self.approve(op, token, token_approval, cursor).await?;
        self.approve(op, self.settings.weth, base_amount, cursor).await?;
        self.add_liquidity(op, &pair, base_amount, token_amount, cursor).await
    }

    /// Wrap both base legs -> Approve(WETH) -> Swap -> Approve(token, received)
    /// -> Approve(WETH) -> AddLiquidity. The token leg is the balance delta
    /// measured across the confirmed swap, not the quote.
    pub(super) async fn swap_add_liquidity(
        &self,
        op: &mut OperationRun,
        token: Address,
        amount: U256,
        cursor: &mut NonceCursor,
    ) -> BotResult<()> {
        let pair = TokenPair::new(self.settings.weth, token);
        let symbol = self.token_label(token).await;

        self.wrap(op, amount.saturating_mul(U256::from(2u8)), cursor).await?;
        self.approve(op, self.settings.weth, amount, cursor).await?;

        let path = pair.forward_path();
        let quote = self.quotes.quote(amount, &path).await?;
        let min_out = self.protected_min(quote.amount_out, &path)?;

        let before = self.read_token_balance(token).await?;
        info!("Swap {} ETH -> {} (min {})", format_ether(amount), symbol, min_out);
        self.swap(op, &pair, amount, min_out, cursor).await?;
        let after = self.read_token_balance(token).await?;

        let received = after.saturating_sub(before);
        if received.is_zero() {
            op.skip("swap delivered no tokens");
            return Ok(());
        }
        info!("Received {} {} (quoted {})", received, symbol, quote.amount_out);

        self.approve(op, token, received, cursor).await?;
        self.approve(op, self.settings.weth, amount, cursor).await?;
        self.add_liquidity(op, &pair, amount, received, cursor).await
    }

    /// Swap half the budget, price the token balance back into base terms,
    /// inflate by the slippage margin and cap at the ceiling. When the cap
    /// binds the token leg is re-quoted forward for the capped base amount,
    /// bounded by the token balance actually held.
    pub(super) async fn balanced(
        &self,
        op: &mut OperationRun,
        token: Address,
        budget: U256,
        cursor: &mut NonceCursor,
    ) -> BotResult<()> {
        let pair = TokenPair::new(self.settings.weth, token);
        let half = budget / U256::from(2u8);
        let path = pair.forward_path();

        self.wrap(op, half, cursor).await?;
        self.approve(op, self.settings.weth, half, cursor).await?;

        let quote = self.quotes.quote(half, &path).await?;
        let min_out = self.protected_min(quote.amount_out, &path)?;
        self.swap(op, &pair, half, min_out, cursor).await?;

        let token_balance = self.read_token_balance(token).await?;
        let back = self.quotes.quote(token_balance, &pair.reverse_path()).await?;
        let mut base_amount = with_margin(back.amount_out, self.settings.tolerance.fraction());
        let mut token_amount = token_balance;

        if base_amount > self.settings.balanced_ceiling {
            info!(
                "Base leg {} ETH capped at {} ETH",
                format_ether(base_amount),
                format_ether(self.settings.balanced_ceiling)
            );
            base_amount = self.settings.balanced_ceiling;
            // never ask the router for more tokens than the swap left us
            token_amount = self
                .quotes
                .quote(base_amount, &path)
                .await?
                .amount_out
                .min(token_balance);
        }

        info!(
            "Balanced deposit | base {} ETH | token {}",
            format_ether(base_amount),
            token_amount
        );

        self.wrap(op, base_amount, cursor).await?;
        self.approve(op, token, token_amount, cursor).await?;
        self.approve(op, self.settings.weth, base_amount, cursor).await?;
        self.add_liquidity(op, &pair, base_amount, token_amount, cursor).await
    }
}
