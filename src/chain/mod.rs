//! Chain access
//!
//! Everything the orchestration engine needs from a node, behind one trait so
//! the executor, composer and scheduler can run against an in-memory chain in
//! tests. `RpcChain` is the alloy-backed implementation used by the binary.
//!
//! Every call may be slow and may fail with a network error; callers map
//! `ChainError` onto the bot's error taxonomy at the point of use.

pub mod rpc;

pub use rpc::RpcChain;

use alloy::primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Node unreachable, timed out, or rejected the request
    #[error("transport error: {0}")]
    Transport(String),
    /// The contract call itself reverted (no route, missing pair, ...)
    #[error("call reverted: {0}")]
    Reverted(String),
}

impl ChainError {
    /// Map an RPC/contract error message onto a variant. Nodes report
    /// eth_call reverts as JSON-RPC errors, so the message is all we get.
    pub fn from_call_error(err: impl std::fmt::Display) -> Self {
        let msg = err.to_string();
        if msg.to_ascii_lowercase().contains("revert") {
            ChainError::Reverted(msg)
        } else {
            ChainError::Transport(msg)
        }
    }
}

/// The parts of a transaction receipt the executor acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub tx_hash: TxHash,
    pub success: bool,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// A read-only call, used to replay a reverted transaction for its reason.
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub input: Bytes,
    pub block: Option<u64>,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError>;

    /// Account nonce counting mined and pending transactions
    async fn transaction_count(&self, owner: Address) -> Result<u64, ChainError>;

    async fn token_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError>;

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError>;

    async fn token_symbol(&self, token: Address) -> Result<String, ChainError>;

    /// Router `getAmountsOut`
    async fn amounts_out(
        &self,
        router: Address,
        amount_in: U256,
        path: &[Address],
    ) -> Result<Vec<U256>, ChainError>;

    /// Factory `getPair`. Returns the zero address when no pool exists.
    async fn get_pair(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
    ) -> Result<Address, ChainError>;

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, ChainError>;

    /// `None` while the transaction is still pending
    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<ReceiptSummary>, ChainError>;

    /// Replay a call and return the revert message, if it reverts.
    async fn revert_reason(&self, call: CallRequest) -> Option<String>;
}
