//! Action descriptions
//!
//! One `Action` per on-chain step. An action knows its target contract, the
//! native value it carries and its ABI-encoded calldata; it knows nothing
//! about nonces, gas or signing.
//!
//! Created: 2026-10-18

use crate::contracts::{IUniswapV2Router02, IERC20, IWETH};
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of step, used for gas lookup and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Deposit,
    Approve,
    Swap,
    AddLiquidity,
    RemoveLiquidity,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Deposit => "deposit",
            ActionKind::Approve => "approve",
            ActionKind::Swap => "swap",
            ActionKind::AddLiquidity => "add_liquidity",
            ActionKind::RemoveLiquidity => "remove_liquidity",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositArgs {
    pub weth: Address,
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveArgs {
    pub token: Address,
    pub spender: Address,
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapArgs {
    pub router: Address,
    pub amount_in: U256,
    pub amount_out_min: U256,
    pub path: Vec<Address>,
    pub to: Address,
    pub deadline: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLiquidityArgs {
    pub router: Address,
    pub token_a: Address,
    pub token_b: Address,
    pub amount_a_desired: U256,
    pub amount_b_desired: U256,
    pub amount_a_min: U256,
    pub amount_b_min: U256,
    pub to: Address,
    pub deadline: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveLiquidityArgs {
    pub router: Address,
    pub token_a: Address,
    pub token_b: Address,
    pub liquidity: U256,
    pub amount_a_min: U256,
    pub amount_b_min: U256,
    pub to: Address,
    pub deadline: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Wrap native into WETH (`deposit()` with value)
    Deposit(DepositArgs),
    Approve(ApproveArgs),
    Swap(SwapArgs),
    AddLiquidity(AddLiquidityArgs),
    RemoveLiquidity(RemoveLiquidityArgs),
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Deposit(_) => ActionKind::Deposit,
            Action::Approve(_) => ActionKind::Approve,
            Action::Swap(_) => ActionKind::Swap,
            Action::AddLiquidity(_) => ActionKind::AddLiquidity,
            Action::RemoveLiquidity(_) => ActionKind::RemoveLiquidity,
        }
    }

    /// Contract the transaction is sent to
    pub fn target(&self) -> Address {
        match self {
            Action::Deposit(a) => a.weth,
            Action::Approve(a) => a.token,
            Action::Swap(a) => a.router,
            Action::AddLiquidity(a) => a.router,
            Action::RemoveLiquidity(a) => a.router,
        }
    }

    /// Native value attached; only deposits carry any
    pub fn value(&self) -> U256 {
        match self {
            Action::Deposit(a) => a.amount,
            _ => U256::ZERO,
        }
    }

    pub fn calldata(&self) -> Bytes {
        let encoded = match self {
            Action::Deposit(_) => IWETH::depositCall {}.abi_encode(),
            Action::Approve(a) => IERC20::approveCall {
                spender: a.spender,
                amount: a.amount,
            }
            .abi_encode(),
            Action::Swap(a) => IUniswapV2Router02::swapExactTokensForTokensCall {
                amountIn: a.amount_in,
                amountOutMin: a.amount_out_min,
                path: a.path.clone(),
                to: a.to,
                deadline: U256::from(a.deadline),
            }
            .abi_encode(),
            Action::AddLiquidity(a) => IUniswapV2Router02::addLiquidityCall {
                tokenA: a.token_a,
                tokenB: a.token_b,
                amountADesired: a.amount_a_desired,
                amountBDesired: a.amount_b_desired,
                amountAMin: a.amount_a_min,
                amountBMin: a.amount_b_min,
                to: a.to,
                deadline: U256::from(a.deadline),
            }
            .abi_encode(),
            Action::RemoveLiquidity(a) => IUniswapV2Router02::removeLiquidityCall {
                tokenA: a.token_a,
                tokenB: a.token_b,
                liquidity: a.liquidity,
                amountAMin: a.amount_a_min,
                amountBMin: a.amount_b_min,
                to: a.to,
                deadline: U256::from(a.deadline),
            }
            .abi_encode(),
        };
        Bytes::from(encoded)
    }

    /// One-line summary for logs
    pub fn describe(&self) -> String {
        match self {
            Action::Deposit(a) => format!("deposit {} wei into {:?}", a.amount, a.weth),
            Action::Approve(a) => format!("approve {:?} for {} on {:?}", a.spender, a.amount, a.token),
            Action::Swap(a) => format!(
                "swap {} -> min {} via {} hops",
                a.amount_in,
                a.amount_out_min,
                a.path.len()
            ),
            Action::AddLiquidity(a) => format!(
                "add liquidity {:?}={} (min {}) {:?}={} (min {})",
                a.token_a, a.amount_a_desired, a.amount_a_min, a.token_b, a.amount_b_desired, a.amount_b_min
            ),
            Action::RemoveLiquidity(a) => format!(
                "remove {} LP from {:?}/{:?}",
                a.liquidity, a.token_a, a.token_b
            ),
        }
    }
}
