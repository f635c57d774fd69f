//! Registration Intake Rate Limiting
//!
//! Keyed rate limiter over the submitting identity. The window and cap are
//! policy, not core logic, so both are configurable.

use governor::{
    clock::DefaultClock,
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::time::Duration;

use crate::shared::error::{PortalError, Result};

/// Rate-limit policy for registration intake.
#[derive(Debug, Clone)]
pub struct IntakePolicy {
    /// Attempts allowed within the window
    pub max_attempts: u32,
    /// Rolling window length
    pub window: Duration,
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            window: Duration::from_secs(15 * 60),
        }
    }
}

pub struct IntakeRateLimiter {
    limiter: RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>,
}

impl IntakeRateLimiter {
    pub fn new(policy: IntakePolicy) -> Result<Self> {
        let burst = NonZeroU32::new(policy.max_attempts).ok_or_else(|| {
            PortalError::configuration("Rate limit max_attempts must be positive")
        })?;

        // Replenish one attempt per window/max so a full burst recovers over
        // exactly one window.
        let replenish = policy.window / policy.max_attempts;
        let quota = Quota::with_period(replenish)
            .ok_or_else(|| PortalError::configuration("Rate limit window must be non-zero"))?
            .allow_burst(burst);

        Ok(Self {
            limiter: RateLimiter::keyed(quota),
        })
    }

    /// Returns true when the attempt is allowed for this key.
    pub fn check(&self, key: &str) -> bool {
        self.limiter.check_key(&key.to_string()).is_ok()
    }

    /// Drop state for keys whose budget has fully replenished. The keyed
    /// store otherwise grows with every distinct email ever submitted;
    /// call this from a periodic maintenance task.
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
    }
}
