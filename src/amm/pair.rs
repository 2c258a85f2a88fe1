//! Token pair and canonical ordering
//!
//! A `TokenPair` keeps the trading direction (base = wrapped native, quote =
//! target token). Pool lookups must use the factory's canonical order instead:
//! ascending by address value, which is the same as comparing lowercase hex.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sort two token addresses the way a Uniswap V2 factory does.
pub fn sort_tokens(a: Address, b: Address) -> (Address, Address) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Ordered (base, quote) pair used by every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenPair {
    /// Wrapped native asset
    pub base: Address,
    /// Target token for this round
    pub quote: Address,
}

impl TokenPair {
    pub fn new(base: Address, quote: Address) -> Self {
        Self { base, quote }
    }

    /// Swap route base -> quote
    pub fn forward_path(&self) -> Vec<Address> {
        vec![self.base, self.quote]
    }

    /// Swap route quote -> base
    pub fn reverse_path(&self) -> Vec<Address> {
        vec![self.quote, self.base]
    }

    /// (token0, token1) as the factory stores the pool
    pub fn canonical(&self) -> (Address, Address) {
        sort_tokens(self.base, self.quote)
    }
}

impl fmt::Display for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}/{:?}", self.base, self.quote)
    }
}
