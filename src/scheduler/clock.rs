//! Time source for deadlines and scheduler sleeps

use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

#[async_trait]
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch
    fn unix_now(&self) -> u64;

    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by chrono and tokio timers
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn unix_now(&self) -> u64 {
        Utc::now().timestamp().max(0) as u64
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
