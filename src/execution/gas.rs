//! Gas policy
//!
//! Legacy gas pricing: one price for every step, a fixed limit per action
//! kind, and optional per-kind price overrides. Loaded from the `[gas]` table
//! of the strategy file; the defaults fit a low-fee L2.

use super::action::ActionKind;
use serde::Deserialize;
use std::collections::HashMap;

/// 0.01 gwei
const DEFAULT_GAS_PRICE_WEI: u64 = 10_000_000;

fn default_gas_price_wei() -> u64 {
    DEFAULT_GAS_PRICE_WEI
}

fn default_deposit_limit() -> u64 {
    100_000
}

fn default_approve_limit() -> u64 {
    80_000
}

fn default_swap_limit() -> u64 {
    240_000
}

fn default_add_liquidity_limit() -> u64 {
    400_000
}

fn default_remove_liquidity_limit() -> u64 {
    300_000
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GasLimits {
    #[serde(default = "default_deposit_limit")]
    pub deposit: u64,
    #[serde(default = "default_approve_limit")]
    pub approve: u64,
    #[serde(default = "default_swap_limit")]
    pub swap: u64,
    #[serde(default = "default_add_liquidity_limit")]
    pub add_liquidity: u64,
    #[serde(default = "default_remove_liquidity_limit")]
    pub remove_liquidity: u64,
}

impl Default for GasLimits {
    fn default() -> Self {
        Self {
            deposit: default_deposit_limit(),
            approve: default_approve_limit(),
            swap: default_swap_limit(),
            add_liquidity: default_add_liquidity_limit(),
            remove_liquidity: default_remove_liquidity_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GasPolicy {
    #[serde(default = "default_gas_price_wei")]
    pub gas_price_wei: u64,
    #[serde(default)]
    pub limits: GasLimits,
    /// Price overrides in wei, keyed by action kind
    #[serde(default)]
    pub price_overrides: HashMap<ActionKind, u64>,
}

impl Default for GasPolicy {
    fn default() -> Self {
        Self {
            gas_price_wei: DEFAULT_GAS_PRICE_WEI,
            limits: GasLimits::default(),
            price_overrides: HashMap::new(),
        }
    }
}

impl GasPolicy {
    pub fn limit(&self, kind: ActionKind) -> u64 {
        match kind {
            ActionKind::Deposit => self.limits.deposit,
            ActionKind::Approve => self.limits.approve,
            ActionKind::Swap => self.limits.swap,
            ActionKind::AddLiquidity => self.limits.add_liquidity,
            ActionKind::RemoveLiquidity => self.limits.remove_liquidity,
        }
    }

    pub fn price(&self, kind: ActionKind) -> u128 {
        self.price_overrides
            .get(&kind)
            .copied()
            .unwrap_or(self.gas_price_wei) as u128
    }
}
