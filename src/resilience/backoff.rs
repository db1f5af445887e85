//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// First delay after an accept failure, in milliseconds.
pub const ACCEPT_BASE_DELAY_MS: u64 = 10;

/// Ceiling for the delay between accept attempts, in milliseconds.
pub const ACCEPT_MAX_DELAY_MS: u64 = 1_000;

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Jitter of 0 to 10% of the delay
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Tracks consecutive accept failures for the listener loop.
#[derive(Debug, Default)]
pub struct AcceptBackoff {
    consecutive_failures: u32,
}

impl AcceptBackoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure and return how long to pause before accepting again.
    pub fn failed(&mut self) -> Duration {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        calculate_backoff(self.consecutive_failures, ACCEPT_BASE_DELAY_MS, ACCEPT_MAX_DELAY_MS)
    }

    /// Reset after a successful accept.
    pub fn succeeded(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}
