//! Configuration
//!
//! Two sources: chain credentials and contract addresses from the environment
//! (`.env` via dotenv), and the optional TOML strategy file. `BotSettings`
//! combines both into the typed settings each component takes, validating
//! ranges on the way; any violation is a `Config` error and stops startup.
//!
//! Created: 2026-10-18

pub mod toml_config;

pub use toml_config::StrategyFile;

use crate::amm::{Fraction, Tolerance};
use crate::error::{BotError, BotResult};
use crate::execution::{ExecutorSettings, GasPolicy};
use crate::operations::{ComposerSettings, OperationKind};
use crate::scheduler::{AmountSpec, BackoffPolicy, RoundSettings};
use alloy::primitives::utils::parse_ether;
use alloy::primitives::{address, Address, U256};
use anyhow::{Context, Result};
use std::fmt;
use std::ops::RangeInclusive;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Wrapped native token used when `WETH_ADDRESS` is unset
pub const DEFAULT_WETH: Address = address!("776401b9bc8aae31a685731b7147d4445fd9fb19");

/// Environment-sourced chain configuration
#[derive(Clone)]
pub struct ChainConfig {
    pub private_key: String,
    pub rpc_url: String,
    pub chain_id: u64,
    pub router: Address,
    pub factory: Address,
    pub weth: Address,
    /// Prefix for transaction links, e.g. `https://explorer.example/tx/`
    pub explorer_tx_url: Option<String>,
}

// keep the key out of logs
impl fmt::Debug for ChainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainConfig")
            .field("private_key", &"<redacted>")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("router", &self.router)
            .field("factory", &self.factory)
            .field("weth", &self.weth)
            .field("explorer_tx_url", &self.explorer_tx_url)
            .finish()
    }
}

impl ChainConfig {
    /// Load `.env` (or `env_file`) into the process environment, then read it.
    pub fn load(env_file: Option<&Path>) -> Result<Self> {
        match env_file {
            Some(path) => {
                dotenv::from_path(path)
                    .with_context(|| format!("Failed to load env file: {}", path.display()))?;
            }
            None => {
                dotenv::dotenv().ok();
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; the environment in production, a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| BotError::Config(format!("missing env var: {}", key)).into())
        };
        let parse_address = |key: &str, value: &str| -> Result<Address> {
            Address::from_str(value.trim())
                .map_err(|e| BotError::Config(format!("{} is not an address: {}", key, e)).into())
        };

        let chain_id = require("CHAIN_ID")?
            .trim()
            .parse::<u64>()
            .context("CHAIN_ID must be an integer")?;
        let router = parse_address("ROUTER_ADDRESS", &require("ROUTER_ADDRESS")?)?;
        let factory = parse_address("FACTORY_ADDRESS", &require("FACTORY_ADDRESS")?)?;
        let weth = match lookup("WETH_ADDRESS").filter(|v| !v.trim().is_empty()) {
            Some(value) => parse_address("WETH_ADDRESS", &value)?,
            None => DEFAULT_WETH,
        };

        Ok(Self {
            private_key: require("PRIVATE_KEY")?,
            rpc_url: require("RPC_URL")?,
            chain_id,
            router,
            factory,
            weth,
            explorer_tx_url: lookup("EXPLORER_TX_URL").filter(|v| !v.trim().is_empty()),
        })
    }
}

/// Everything the binary needs to assemble the engine
#[derive(Debug, Clone)]
pub struct BotSettings {
    pub composer: ComposerSettings,
    pub round: RoundSettings,
    pub executor: ExecutorSettings,
    pub gas: GasPolicy,
    pub backoff: BackoffPolicy,
    /// Removal interval range, `None` when removal is disabled
    pub removal_interval: Option<RangeInclusive<u32>>,
}

fn eth(field: &str, value: &str) -> BotResult<U256> {
    parse_ether(value.trim())
        .map_err(|e| BotError::Config(format!("{} = {:?} is not an ETH amount: {}", field, value, e)))
}

impl BotSettings {
    /// Resolve the strategy for `mode`. `removal_override` comes from the CLI
    /// and wins over the file.
    pub fn resolve(
        strategy: &StrategyFile,
        chain: &ChainConfig,
        mode: OperationKind,
        removal_override: Option<bool>,
    ) -> BotResult<Self> {
        if strategy.tokens.is_empty() {
            return Err(BotError::Config("token list is empty".to_string()));
        }

        let tolerance = Tolerance::from_f64(strategy.slippage)?;
        let approval_margin = Fraction::from_f64(strategy.approval_margin)?;
        let removal_fraction = Fraction::from_f64(strategy.removal.fraction)?;
        if removal_fraction.is_zero() {
            return Err(BotError::Config("removal fraction must be above zero".to_string()));
        }

        let amounts = &strategy.amounts;
        let amount = match mode {
            OperationKind::WrapAddLiquidity => AmountSpec::Fixed(eth("lp_eth", &amounts.lp_eth)?),
            OperationKind::WrapSwap => AmountSpec::range(
                eth("swap_min_eth", &amounts.swap_min_eth)?,
                eth("swap_max_eth", &amounts.swap_max_eth)?,
            )?,
            OperationKind::SwapAddLiquidity => {
                AmountSpec::Fixed(eth("swap_lp_eth", &amounts.swap_lp_eth)?)
            }
            OperationKind::Balanced => {
                AmountSpec::Fixed(eth("balanced_budget_eth", &amounts.balanced_budget_eth)?)
            }
            OperationKind::RemoveLiquidity => {
                return Err(BotError::Config(
                    "remove-liquidity is not a round mode".to_string(),
                ))
            }
        };

        let timing = &strategy.timing;
        if timing.round_delay_min_secs > timing.round_delay_max_secs {
            return Err(BotError::Config(format!(
                "round delay {}..{} is not ordered",
                timing.round_delay_min_secs, timing.round_delay_max_secs
            )));
        }
        if timing.poll_interval_ms == 0 {
            return Err(BotError::Config("poll_interval_ms must be above zero".to_string()));
        }

        let removal = &strategy.removal;
        let removal_enabled = removal_override
            .or(removal.enabled)
            .unwrap_or(mode == OperationKind::SwapAddLiquidity);
        let removal_interval = if removal_enabled && mode.adds_liquidity() {
            if removal.min_interval == 0 || removal.min_interval > removal.max_interval {
                return Err(BotError::Config(format!(
                    "removal interval {}..{} must be ordered and start at 1 or more",
                    removal.min_interval, removal.max_interval
                )));
            }
            Some(removal.min_interval..=removal.max_interval)
        } else {
            None
        };

        Ok(Self {
            composer: ComposerSettings {
                router: chain.router,
                factory: chain.factory,
                weth: chain.weth,
                tolerance,
                approval_margin,
                swap_deadline_secs: timing.swap_deadline_secs,
                remove_deadline_secs: timing.remove_deadline_secs,
                removal_fraction,
                balanced_ceiling: eth("balanced_ceiling_eth", &amounts.balanced_ceiling_eth)?,
            },
            round: RoundSettings {
                mode,
                tokens: strategy.tokens.clone(),
                amount,
                balance_floor: eth("balance_floor_eth", &strategy.balance_floor_eth)?,
                round_delay_secs: timing.round_delay_min_secs..=timing.round_delay_max_secs,
                low_balance_delay: Duration::from_secs(timing.low_balance_delay_secs),
            },
            executor: ExecutorSettings {
                confirmation_timeout: Duration::from_secs(timing.confirmation_timeout_secs),
                poll_interval: Duration::from_millis(timing.poll_interval_ms),
                explorer_tx_url: chain.explorer_tx_url.clone(),
            },
            gas: strategy.gas.clone(),
            backoff: strategy.backoff.clone(),
            removal_interval,
        })
    }
}
