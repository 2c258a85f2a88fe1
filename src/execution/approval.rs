//! Approval Gate
//!
//! Decides whether the router may already pull at least `required` of a
//! token. The allowance is re-read from chain every time; earlier steps in
//! the same operation may have spent it. When it falls short the gate hands
//! back the exact-amount approval for the caller to run as its own step.

use super::action::{Action, ApproveArgs};
use crate::chain::ChainClient;
use crate::error::{BotError, BotResult};
use alloy::primitives::{Address, U256};
use tracing::debug;

pub struct ApprovalGate<'a, C: ?Sized> {
    chain: &'a C,
    owner: Address,
}

impl<'a, C: ChainClient + ?Sized> ApprovalGate<'a, C> {
    pub fn new(chain: &'a C, owner: Address) -> Self {
        Self { chain, owner }
    }

    /// `None` when the allowance already covers `required`, otherwise an
    /// approval for exactly `required`.
    pub async fn approval_for(
        &self,
        token: Address,
        spender: Address,
        required: U256,
    ) -> BotResult<Option<Action>> {
        let current = self
            .chain
            .token_allowance(token, self.owner, spender)
            .await
            .map_err(|e| BotError::AllowanceRead {
                token,
                reason: e.to_string(),
            })?;

        if current >= required {
            debug!("Sufficient allowance on {:?}: {} >= {}", token, current, required);
            return Ok(None);
        }

        Ok(Some(Action::Approve(ApproveArgs {
            token,
            spender,
            amount: required,
        })))
    }
}
