//! Nonce Cursor
//!
//! Synced once from the chain at the start of an operation, then advanced
//! locally by exactly one per successful submission. The executor reads
//! `peek()` to sign and calls `advance()` only after the node accepted the
//! raw transaction, so a rejected send leaves no gap.

use crate::chain::ChainClient;
use crate::error::{BotError, BotResult};
use alloy::primitives::Address;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceCursor {
    start: u64,
    next: u64,
}

impl NonceCursor {
    pub fn new(start: u64) -> Self {
        Self { start, next: start }
    }

    /// Read the account's transaction count and start a fresh cursor at it.
    pub async fn sync<C: ChainClient + ?Sized>(chain: &C, owner: Address) -> BotResult<Self> {
        let start = chain
            .transaction_count(owner)
            .await
            .map_err(|e| BotError::Rpc(format!("nonce read for {:?}: {}", owner, e)))?;
        debug!("Nonce synced for {:?}: {}", owner, start);
        Ok(Self::new(start))
    }

    /// Nonce the next transaction must be signed with
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Consume the current nonce. Returns the value consumed.
    pub fn advance(&mut self) -> u64 {
        let used = self.next;
        self.next += 1;
        used
    }

    /// Number of transactions accepted since the last sync
    pub fn consumed(&self) -> u64 {
        self.next - self.start
    }
}
