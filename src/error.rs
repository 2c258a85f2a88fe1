//! Error taxonomy for the orchestration engine
//!
//! Steps fail fast and return one of these; the operation composer aborts on
//! the first one and the round scheduler is the only place that recovers.
//! `Config` is the only variant that is fatal to the process.
//!
//! Created: 2026-10-18

use alloy::primitives::{Address, TxHash, U256};
use std::fmt;
use thiserror::Error;

pub type BotResult<T> = std::result::Result<T, BotError>;

/// Coarse classification of an on-chain revert, used for diagnostics only.
/// Every kind aborts the operation identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertKind {
    /// Allowance, ownership or signature problems (`TRANSFER_FROM_FAILED`, `FORBIDDEN`)
    Authorization,
    /// Output or deposit below the protected minimum (`INSUFFICIENT_OUTPUT_AMOUNT`, `EXPIRED`)
    Slippage,
    /// Pool cannot serve the call (`INSUFFICIENT_LIQUIDITY`, missing pair)
    PoolState,
    /// No reason recovered, or one we don't recognise
    Unknown,
}

impl RevertKind {
    /// Classify a revert message returned by a replayed call.
    pub fn classify(reason: Option<&str>) -> Self {
        let Some(reason) = reason else {
            return RevertKind::Unknown;
        };
        let r = reason.to_ascii_uppercase();

        if r.contains("INSUFFICIENT_LIQUIDITY") || r.contains("INSUFFICIENT_INPUT_AMOUNT") || r.contains("K'") {
            RevertKind::PoolState
        } else if r.contains("INSUFFICIENT_OUTPUT_AMOUNT")
            || r.contains("INSUFFICIENT_A_AMOUNT")
            || r.contains("INSUFFICIENT_B_AMOUNT")
            || r.contains("EXPIRED")
        {
            RevertKind::Slippage
        } else if r.contains("TRANSFER_FROM_FAILED")
            || r.contains("ALLOWANCE")
            || r.contains("FORBIDDEN")
            || r.contains("UNAUTHORIZED")
            || r.contains("SIGNATURE")
        {
            RevertKind::Authorization
        } else {
            RevertKind::Unknown
        }
    }
}

impl fmt::Display for RevertKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RevertKind::Authorization => write!(f, "authorization"),
            RevertKind::Slippage => write!(f, "slippage"),
            RevertKind::PoolState => write!(f, "pool-state"),
            RevertKind::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Quote unavailable for path {path}: {reason}")]
    QuoteUnavailable { path: String, reason: String },

    #[error("Allowance read failed for token {token:?}: {reason}")]
    AllowanceRead { token: Address, reason: String },

    #[error("RPC read failed: {0}")]
    Rpc(String),

    #[error("Failed to build or sign {action} transaction: {reason}")]
    Build { action: String, reason: String },

    #[error("Submission of {action} (nonce {nonce}) failed: {reason}")]
    Submission { action: String, nonce: u64, reason: String },

    #[error("Confirmation of {action} tx {tx_hash:?} failed: {reason}")]
    Confirmation { action: String, tx_hash: TxHash, reason: String },

    #[error("{action} tx {tx_hash:?} reverted ({kind}): {}", .reason.as_deref().unwrap_or("no reason"))]
    Revert {
        action: String,
        tx_hash: TxHash,
        kind: RevertKind,
        reason: Option<String>,
    },

    #[error("Native balance {balance} below floor {floor}")]
    InsufficientBalance { balance: U256, floor: U256 },
}

impl BotError {
    /// True if a transaction may already be pending or mined for this failure,
    /// i.e. the nonce cursor was advanced before the error surfaced.
    pub fn after_submission(&self) -> bool {
        matches!(self, BotError::Confirmation { .. } | BotError::Revert { .. })
    }

    /// Short label used in round logs.
    pub fn label(&self) -> &'static str {
        match self {
            BotError::Config(_) => "config",
            BotError::QuoteUnavailable { .. } => "quote-unavailable",
            BotError::AllowanceRead { .. } => "allowance-read",
            BotError::Rpc(_) => "rpc",
            BotError::Build { .. } => "build",
            BotError::Submission { .. } => "submission",
            BotError::Confirmation { .. } => "confirmation",
            BotError::Revert { .. } => "revert",
            BotError::InsufficientBalance { .. } => "insufficient-balance",
        }
    }
}
