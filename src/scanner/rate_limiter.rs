//! Dispatch pacing for host sweeps.
//!
//! A token bucket caps how many hosts per second the orchestrator hands to
//! workers. Bursty ping floods trip some consumer routers' flood protection,
//! which then drops the very echo replies the sweep is waiting for.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Shared token bucket limiting host dispatches per second.
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<GovLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl RateLimiter {
    /// A limiter spacing dispatches evenly at `per_second`, or `None` when the
    /// rate is zero (unlimited). Bursts are capped at one.
    pub fn per_second(per_second: u32) -> Option<Self> {
        let rate = NonZeroU32::new(per_second)?;
        let quota = Quota::per_second(rate).allow_burst(NonZeroU32::MIN);
        Some(Self {
            limiter: Arc::new(GovLimiter::direct(quota)),
        })
    }

    /// Wait until the next dispatch is allowed.
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// Take a token without waiting.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}
