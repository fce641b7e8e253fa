//! When to replay a failed platform call, and how long to wait first.

use std::time::Duration;

use crate::{FetchError, Response};

/// Status BigCommerce answers with once a store's request quota is spent.
pub const RATE_LIMITED: u16 = 429;

/// Retry budget for one dependency.
///
/// Server errors, timeouts and refused connections are replayed after an
/// exponential backoff. Rate-limited responses are replayed once the quota
/// window resets, unless the reset is further away than `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Replays allowed after the first attempt.
    pub max_retries: u32,
    /// Delay before the first replay.
    pub base_delay: Duration,
    /// Longest single wait.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(500),
        }
    }

    /// Never replay.
    pub fn none() -> Self {
        Self::new(0)
    }

    pub fn with_delays(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }

    /// Backoff before replay number `retry` (0-indexed).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Wait before replaying a request that got `resp`, or `None` to keep it.
    pub fn retry_response(&self, resp: &Response, retry: u32) -> Option<Duration> {
        if retry >= self.max_retries {
            return None;
        }
        match resp.status {
            RATE_LIMITED => match resp.rate_limit_reset() {
                Some(reset) if reset > self.max_delay => None,
                Some(reset) => Some(reset),
                None => Some(self.backoff(retry)),
            },
            500..=599 => Some(self.backoff(retry)),
            _ => None,
        }
    }

    /// Wait before replaying a request that failed with `error`, or `None`.
    pub fn retry_error(&self, error: &FetchError, retry: u32) -> Option<Duration> {
        if retry >= self.max_retries {
            return None;
        }
        match error {
            FetchError::Timeout(_) | FetchError::Connection(_) => Some(self.backoff(retry)),
            _ => None,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1)
    }
}
