//! LP Autopilot Library
//!
//! Transaction orchestration for an unattended liquidity round bot on a
//! Uniswap-V2-style router: wrap, approve, swap, add liquidity and periodic
//! partial removal, one strictly sequenced round at a time.
//!
//! Created: 2026-10-18

pub mod amm;
pub mod chain;
pub mod config;
pub mod contracts;
pub mod error;
pub mod execution;
pub mod instance;
pub mod operations;
pub mod scheduler;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::{BotSettings, ChainConfig, StrategyFile};
pub use error::{BotError, BotResult};
pub use operations::{OperationComposer, OperationKind};
pub use scheduler::RoundScheduler;
