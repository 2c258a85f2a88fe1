//! Round backoff
//!
//! How long the scheduler waits after a failed round. `Fixed` always waits
//! the same; `Exponential` escalates per consecutive failure up to a cap.
//! Any successful round resets the escalation.

use serde::Deserialize;
use std::time::Duration;

fn default_delay_secs() -> u64 {
    10
}

fn default_factor() -> u32 {
    2
}

fn default_max_secs() -> u64 {
    300
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackoffPolicy {
    Fixed {
        #[serde(default = "default_delay_secs")]
        delay_secs: u64,
    },
    Exponential {
        #[serde(default = "default_delay_secs")]
        initial_secs: u64,
        #[serde(default = "default_factor")]
        factor: u32,
        #[serde(default = "default_max_secs")]
        max_secs: u64,
    },
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy::Fixed {
            delay_secs: default_delay_secs(),
        }
    }
}

/// Backoff state: consecutive failures under a policy
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    failures: u32,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self { policy, failures: 0 }
    }

    /// Record a failure and return how long to wait before the next round.
    pub fn next_delay(&mut self) -> Duration {
        let exponent = self.failures;
        self.failures = self.failures.saturating_add(1);

        let secs = match self.policy {
            BackoffPolicy::Fixed { delay_secs } => delay_secs,
            BackoffPolicy::Exponential {
                initial_secs,
                factor,
                max_secs,
            } => {
                let multiplier = (factor.max(1) as u64).saturating_pow(exponent);
                initial_secs.saturating_mul(multiplier).min(max_secs)
            }
        };
        Duration::from_secs(secs)
    }

    pub fn reset(&mut self) {
        self.failures = 0;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}
