//! TOML Strategy File
//!
//! Optional per-deployment tuning: token list, slippage, amounts per mode,
//! removal cadence, timing, backoff and gas. Every field has a default, so an
//! empty file (or no file) reproduces the stock behaviour.
//!
//! Amounts are decimal ETH strings (`"0.000025"`) so they parse exactly.
//!
//! Created: 2026-10-18

use crate::execution::GasPolicy;
use crate::scheduler::BackoffPolicy;
use alloy::primitives::{address, Address};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Default target tokens
pub const DEFAULT_TOKENS: [Address; 12] = [
    address!("e9b6e75c243b6100ffcb1c66e8f78f96feea727f"), // CUSD
    address!("faf334e157175ff676911adcf0964d7f54f2c424"), // tkUSDC
    address!("9629684df53db9e4484697d0a50c442b2bfa80a8"), // GTE
    address!("7f11aa697e05b75600354ac9acf8bb209225e932"), // Bitcoin
    address!("10a6be7d23989d00d528e68cf8051d095f741145"), // Mega
    address!("176735870dc6c22b4ebfbf519de2ce758de78d94"),
    address!("1d2e159712c1a109fa869cc9fef0e3e60abd542b"),
    address!("f82ff0799448630eb56ce747db840a2e02cde4d8"),
    address!("1aa388c43474979c598d1a37309d2f6422a38dfc"),
    address!("a626f15d10f2b30af1fb0d017f20a579500b5029"),
    address!("bba08cf5ece0cc21e1deb5168746c001b123a756"),
    address!("8d635c4702ba38b1f1735e8e784c7265dcc0b623"),
];

/// Top-level strategy file
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyFile {
    #[serde(default = "default_tokens")]
    pub tokens: Vec<Address>,
    /// Slippage tolerance as a fraction, `[0, 1)`
    #[serde(default = "default_slippage")]
    pub slippage: f64,
    /// Over-approval of the token leg before add-liquidity
    #[serde(default = "default_approval_margin")]
    pub approval_margin: f64,
    #[serde(default = "default_balance_floor")]
    pub balance_floor_eth: String,
    #[serde(default)]
    pub amounts: AmountsConfig,
    #[serde(default)]
    pub removal: RemovalConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub backoff: BackoffPolicy,
    #[serde(default)]
    pub gas: GasPolicy,
}

fn default_tokens() -> Vec<Address> { DEFAULT_TOKENS.to_vec() }
fn default_slippage() -> f64 { 0.10 }
fn default_approval_margin() -> f64 { 0.10 }
fn default_balance_floor() -> String { "0.001".to_string() }

/// Native amount per round for each mode
#[derive(Debug, Clone, Deserialize)]
pub struct AmountsConfig {
    #[serde(default = "default_lp_eth")]
    pub lp_eth: String,
    #[serde(default = "default_swap_min_eth")]
    pub swap_min_eth: String,
    #[serde(default = "default_swap_max_eth")]
    pub swap_max_eth: String,
    #[serde(default = "default_swap_lp_eth")]
    pub swap_lp_eth: String,
    /// Total budget in `balanced` mode; half of it is swapped
    #[serde(default = "default_balanced_budget_eth")]
    pub balanced_budget_eth: String,
    #[serde(default = "default_balanced_ceiling_eth")]
    pub balanced_ceiling_eth: String,
}

fn default_lp_eth() -> String { "0.000025".to_string() }
fn default_swap_min_eth() -> String { "0.000025".to_string() }
fn default_swap_max_eth() -> String { "0.00005".to_string() }
fn default_swap_lp_eth() -> String { "0.00003".to_string() }
fn default_balanced_budget_eth() -> String { "0.00005".to_string() }
fn default_balanced_ceiling_eth() -> String { "0.00003".to_string() }

impl Default for AmountsConfig {
    fn default() -> Self {
        Self {
            lp_eth: default_lp_eth(),
            swap_min_eth: default_swap_min_eth(),
            swap_max_eth: default_swap_max_eth(),
            swap_lp_eth: default_swap_lp_eth(),
            balanced_budget_eth: default_balanced_budget_eth(),
            balanced_ceiling_eth: default_balanced_ceiling_eth(),
        }
    }
}

/// Periodic liquidity removal
#[derive(Debug, Clone, Deserialize)]
pub struct RemovalConfig {
    /// Unset: enabled for `swap-lp` only
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default = "default_removal_fraction")]
    pub fraction: f64,
    /// Removal every N completed add-liquidity rounds, N drawn from this range
    #[serde(default = "default_min_interval")]
    pub min_interval: u32,
    #[serde(default = "default_max_interval")]
    pub max_interval: u32,
}

fn default_removal_fraction() -> f64 { 0.30 }
fn default_min_interval() -> u32 { 3 }
fn default_max_interval() -> u32 { 5 }

impl Default for RemovalConfig {
    fn default() -> Self {
        Self {
            enabled: None,
            fraction: default_removal_fraction(),
            min_interval: default_min_interval(),
            max_interval: default_max_interval(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_round_delay_min")]
    pub round_delay_min_secs: u64,
    #[serde(default = "default_round_delay_max")]
    pub round_delay_max_secs: u64,
    #[serde(default = "default_low_balance_delay")]
    pub low_balance_delay_secs: u64,
    #[serde(default = "default_swap_deadline")]
    pub swap_deadline_secs: u64,
    #[serde(default = "default_remove_deadline")]
    pub remove_deadline_secs: u64,
    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout_secs: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_round_delay_min() -> u64 { 5 }
fn default_round_delay_max() -> u64 { 10 }
fn default_low_balance_delay() -> u64 { 10 }
fn default_swap_deadline() -> u64 { 600 }
fn default_remove_deadline() -> u64 { 1000 }
fn default_confirmation_timeout() -> u64 { 120 }
fn default_poll_interval() -> u64 { 1000 }

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            round_delay_min_secs: default_round_delay_min(),
            round_delay_max_secs: default_round_delay_max(),
            low_balance_delay_secs: default_low_balance_delay(),
            swap_deadline_secs: default_swap_deadline(),
            remove_deadline_secs: default_remove_deadline(),
            confirmation_timeout_secs: default_confirmation_timeout(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl Default for StrategyFile {
    fn default() -> Self {
        Self {
            tokens: default_tokens(),
            slippage: default_slippage(),
            approval_margin: default_approval_margin(),
            balance_floor_eth: default_balance_floor(),
            amounts: AmountsConfig::default(),
            removal: RemovalConfig::default(),
            timing: TimingConfig::default(),
            backoff: BackoffPolicy::default(),
            gas: GasPolicy::default(),
        }
    }
}

impl StrategyFile {
    /// Load the strategy from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse TOML configuration")
    }
}
