//! Removal counter and per-round amount sampling

use crate::error::{BotError, BotResult};
use alloy::primitives::U256;
use rand::Rng;
use std::ops::RangeInclusive;

/// Counts completed add-liquidity operations since the last removal.
/// The threshold is drawn uniformly from `range` at start and after every
/// reset.
#[derive(Debug, Clone)]
pub struct RemovalCounter {
    count: u32,
    threshold: u32,
    range: RangeInclusive<u32>,
}

impl RemovalCounter {
    pub fn new<R: Rng + ?Sized>(range: RangeInclusive<u32>, rng: &mut R) -> BotResult<Self> {
        if range.is_empty() || *range.start() == 0 {
            return Err(BotError::Config(format!(
                "removal interval {}..={} must be non-empty and start at 1 or more",
                range.start(),
                range.end()
            )));
        }
        let threshold = rng.gen_range(range.clone());
        Ok(Self {
            count: 0,
            threshold,
            range,
        })
    }

    /// Count one add-liquidity. Returns true once the threshold is reached.
    pub fn record_add(&mut self) -> bool {
        self.count = self.count.saturating_add(1);
        self.count >= self.threshold
    }

    /// Zero the count and draw a fresh threshold.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.count = 0;
        self.threshold = rng.gen_range(self.range.clone());
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

/// Native amount used per round: fixed, or uniform over an inclusive range
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountSpec {
    Fixed(U256),
    Range { min: U256, max: U256 },
}

impl AmountSpec {
    pub fn range(min: U256, max: U256) -> BotResult<Self> {
        if min > max {
            return Err(BotError::Config(format!("amount range min {} above max {}", min, max)));
        }
        if max > U256::from(u128::MAX) {
            return Err(BotError::Config(format!("amount range max {} too large", max)));
        }
        Ok(AmountSpec::Range { min, max })
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> U256 {
        match self {
            AmountSpec::Fixed(amount) => *amount,
            AmountSpec::Range { min, max } => {
                let lo = min.saturating_to::<u128>();
                let hi = max.saturating_to::<u128>();
                U256::from(rng.gen_range(lo..=hi))
            }
        }
    }
}
