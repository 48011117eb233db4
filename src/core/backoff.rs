//! Exponential backoff for consecutive polling failures.
//!
//! The controller never gives up: after every failure the delay doubles up
//! to a cap, and one success brings it straight back to zero.

use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(30_000);

/// Snapshot of the controller's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackoffState {
    pub consecutive_failures: u32,
    pub current_delay_ms: u64,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BackoffController {
    base_ms: u64,
    cap_ms: u64,
    state: BackoffState,
}

impl BackoffController {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY)
    }

    pub fn with_limits(base: Duration, cap: Duration) -> Self {
        Self {
            base_ms: base.as_millis() as u64,
            cap_ms: cap.as_millis() as u64,
            state: BackoffState::default(),
        }
    }

    pub fn record_success(&mut self) {
        if self.state.consecutive_failures > 0 {
            debug!(
                failures = self.state.consecutive_failures,
                "Recovered, resetting backoff"
            );
        }
        self.state = BackoffState::default();
    }

    pub fn record_failure(&mut self, err: &impl std::fmt::Display) {
        self.state.consecutive_failures = self.state.consecutive_failures.saturating_add(1);
        self.state.current_delay_ms = self.delay_for(self.state.consecutive_failures);
        self.state.last_error = Some(err.to_string());
        warn!(
            error = %err,
            failures = self.state.consecutive_failures,
            delay_ms = self.state.current_delay_ms,
            "Poll failed, backing off"
        );
    }

    /// Extra wait before the next attempt. Zero when healthy.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.state.current_delay_ms)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.state.consecutive_failures
    }

    pub fn state(&self) -> &BackoffState {
        &self.state
    }

    // min(cap, base * 2^(n-1)) without overflowing for large n
    fn delay_for(&self, failures: u32) -> u64 {
        let exponent = failures.saturating_sub(1);
        let factor = 1u64.checked_shl(exponent).unwrap_or(u64::MAX);
        self.base_ms.saturating_mul(factor).min(self.cap_ms)
    }
}

impl Default for BackoffController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::FetchError;

    #[test]
    fn test_delay_doubles_then_saturates() {
        let mut backoff = BackoffController::new();
        assert_eq!(backoff.delay(), Duration::ZERO);

        for n in 1..=8u32 {
            backoff.record_failure(&FetchError::Timeout);
            let expected = 30_000u64.min(1000 * 2u64.pow(n - 1));
            assert_eq!(backoff.state().current_delay_ms, expected, "failure #{n}");
            assert_eq!(backoff.consecutive_failures(), n);
            if n >= 6 {
                assert_eq!(backoff.delay(), Duration::from_millis(30_000));
            }
        }
    }

    #[test]
    fn test_success_resets_regardless_of_history() {
        let mut backoff = BackoffController::new();
        for _ in 0..12 {
            backoff.record_failure(&FetchError::HttpStatus(502));
        }
        assert_eq!(
            backoff.state().last_error.as_deref(),
            Some("HTTP error: 502")
        );

        backoff.record_success();
        assert_eq!(backoff.delay(), Duration::ZERO);
        assert_eq!(backoff.state(), &BackoffState::default());
    }

    #[test]
    fn test_two_timeouts_then_success() {
        let mut backoff = BackoffController::new();
        let mut observed = Vec::new();

        backoff.record_failure(&FetchError::Timeout);
        observed.push(backoff.delay());
        backoff.record_failure(&FetchError::Timeout);
        observed.push(backoff.delay());
        backoff.record_success();
        observed.push(backoff.delay());

        assert_eq!(
            observed,
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::ZERO
            ]
        );
        assert_eq!(backoff.consecutive_failures(), 0);
    }

    #[test]
    fn test_huge_failure_counts_do_not_overflow() {
        let mut backoff = BackoffController::with_limits(
            Duration::from_millis(250),
            Duration::from_secs(5),
        );
        for _ in 0..200 {
            backoff.record_failure(&FetchError::Timeout);
        }
        assert_eq!(backoff.delay(), Duration::from_secs(5));
    }
}
