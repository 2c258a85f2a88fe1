//! Quote Service
//!
//! Adapter over the router's `getAmountsOut`. Quotes are fetched fresh for the
//! exact amount about to be executed and never cached; pool reserves move
//! between rounds and between steps.

use crate::chain::{ChainClient, ChainError};
use crate::error::{BotError, BotResult};
use alloy::primitives::{Address, U256};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub amount_in: U256,
    pub amount_out: U256,
    pub path: Vec<Address>,
}

pub struct QuoteService<C> {
    chain: Arc<C>,
    router: Address,
}

pub(crate) fn format_path(path: &[Address]) -> String {
    path.iter()
        .map(|a| format!("{:?}", a))
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl<C: ChainClient> QuoteService<C> {
    pub fn new(chain: Arc<C>, router: Address) -> Self {
        Self { chain, router }
    }

    /// Quote `amount_in` along `path`. A missing route, a reverting router or
    /// a zero output is `QuoteUnavailable`; a node failure is `Rpc`.
    pub async fn quote(&self, amount_in: U256, path: &[Address]) -> BotResult<Quote> {
        let unavailable = |reason: String| BotError::QuoteUnavailable {
            path: format_path(path),
            reason,
        };

        if path.len() < 2 {
            return Err(unavailable("path needs at least two assets".to_string()));
        }
        if amount_in.is_zero() {
            return Err(unavailable("zero input amount".to_string()));
        }

        let amounts = match self.chain.amounts_out(self.router, amount_in, path).await {
            Ok(amounts) => amounts,
            Err(ChainError::Reverted(reason)) => return Err(unavailable(reason)),
            Err(ChainError::Transport(reason)) => {
                return Err(BotError::Rpc(format!("getAmountsOut failed: {}", reason)))
            }
        };

        let amount_out = match amounts.last() {
            Some(out) if amounts.len() == path.len() => *out,
            _ => {
                return Err(unavailable(format!(
                    "router returned {} amounts for a {}-hop path",
                    amounts.len(),
                    path.len()
                )))
            }
        };

        if amount_out.is_zero() {
            return Err(unavailable("router quoted zero output".to_string()));
        }

        debug!("Quote {} | in={} out={}", format_path(path), amount_in, amount_out);

        Ok(Quote {
            amount_in,
            amount_out,
            path: path.to_vec(),
        })
    }
}
