//! Slippage Calculator
//!
//! Pure integer math for protected bounds. Fractions are held in parts per
//! million so every bound is an exact floor on `U256`, never a float product.
//!
//! - `min_accepted`: floor(quoted * (1 - tolerance))
//! - `with_margin`: floor(amount * (1 + margin)), used for over-provisioned approvals
//! - `Fraction::share`: floor(amount * fraction), used for partial liquidity removal
//!
//! Created: 2026-10-18

use crate::error::{BotError, BotResult};
use alloy::primitives::U256;
use serde::{Deserialize, Deserializer};
use std::fmt;

/// Denominator for all fractions
pub const PPM: u64 = 1_000_000;

/// A fraction in [0, 1], stored as parts per million.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fraction {
    ppm: u64,
}

impl Fraction {
    pub const ZERO: Fraction = Fraction { ppm: 0 };
    pub const ONE: Fraction = Fraction { ppm: PPM };

    pub fn from_ppm(ppm: u64) -> BotResult<Self> {
        if ppm > PPM {
            return Err(BotError::Config(format!("fraction {} ppm exceeds 1.0", ppm)));
        }
        Ok(Self { ppm })
    }

    /// Parse a decimal fraction such as `0.10`. Rounds to the nearest ppm.
    pub fn from_f64(value: f64) -> BotResult<Self> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(BotError::Config(format!("fraction {} outside [0, 1]", value)));
        }
        Self::from_ppm((value * PPM as f64).round() as u64)
    }

    pub fn ppm(self) -> u64 {
        self.ppm
    }

    pub fn as_f64(self) -> f64 {
        self.ppm as f64 / PPM as f64
    }

    pub fn is_zero(self) -> bool {
        self.ppm == 0
    }

    /// floor(amount * self)
    pub fn share(self, amount: U256) -> U256 {
        mul_ppm_floor(amount, self.ppm)
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.2}%", self.as_f64() * 100.0)
    }
}

impl<'de> Deserialize<'de> for Fraction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Fraction::from_f64(value).map_err(serde::de::Error::custom)
    }
}

/// Slippage tolerance: a fraction in [0, 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tolerance(Fraction);

impl Tolerance {
    pub fn new(fraction: Fraction) -> BotResult<Self> {
        if fraction.ppm() >= PPM {
            return Err(BotError::Config(format!(
                "slippage tolerance {} must be below 100%",
                fraction
            )));
        }
        Ok(Self(fraction))
    }

    pub fn from_f64(value: f64) -> BotResult<Self> {
        if !value.is_finite() || !(0.0..1.0).contains(&value) {
            return Err(BotError::Config(format!("slippage tolerance {} outside [0, 1)", value)));
        }
        Self::new(Fraction::from_f64(value)?)
    }

    pub fn fraction(self) -> Fraction {
        self.0
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for Tolerance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Tolerance::from_f64(value).map_err(serde::de::Error::custom)
    }
}

/// Minimum acceptable output for a quoted amount: floor(quoted * (1 - tolerance)).
pub fn min_accepted(quoted: U256, tolerance: Tolerance) -> U256 {
    mul_ppm_floor(quoted, PPM - tolerance.fraction().ppm())
}

/// Over-provisioned amount: floor(amount * (1 + margin)).
pub fn with_margin(amount: U256, margin: Fraction) -> U256 {
    mul_ppm_floor(amount, PPM + margin.ppm())
}

/// floor(amount * factor / PPM) without forming amount * factor.
fn mul_ppm_floor(amount: U256, factor_ppm: u64) -> U256 {
    let denom = U256::from(PPM);
    let factor = U256::from(factor_ppm);
    let whole = (amount / denom).saturating_mul(factor);
    let rest = (amount % denom) * factor / denom;
    whole.saturating_add(rest)
}
