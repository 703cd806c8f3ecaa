//! Reconnect backoff policy.
//!
//! Delays double on every attempt starting from a base delay:
//! with the defaults the schedule is 1s, 2s, 4s, 8s, 16s, then give up.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default number of reconnect attempts after an unexpected close.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default delay before the first reconnect attempt.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

// ============================================================================
// ReconnectPolicy
// ============================================================================

/// Exponential backoff schedule for automatic reconnection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Attempts made before giving up. `0` disables reconnection.
    pub max_attempts: u32,
    /// Delay before attempt 1; doubled for each later attempt.
    pub base_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl ReconnectPolicy {
    /// Creates a policy with the given limits.
    #[inline]
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Creates a policy that never reconnects.
    #[inline]
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            max_attempts: 0,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }

    /// Returns the delay before the given 1-based attempt.
    ///
    /// `None` once attempts are exhausted (or for attempt 0).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }

        let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
        Some(self.base_delay.saturating_mul(factor))
    }

    /// Returns the full delay schedule.
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..=self.max_attempts).filter_map(|attempt| self.delay_for(attempt))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_default_schedule() {
        let policy = ReconnectPolicy::default();
        let delays: Vec<u64> = policy.schedule().map(|d| d.as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16]);
    }

    #[test]
    fn test_no_sixth_attempt() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(5), Some(Duration::from_secs(16)));
        assert_eq!(policy.delay_for(6), None);
    }

    #[test]
    fn test_attempt_zero() {
        assert_eq!(ReconnectPolicy::default().delay_for(0), None);
    }

    #[test]
    fn test_disabled() {
        let policy = ReconnectPolicy::disabled();
        assert_eq!(policy.delay_for(1), None);
        assert_eq!(policy.schedule().count(), 0);
    }

    #[test]
    fn test_huge_attempt_saturates() {
        let policy = ReconnectPolicy::new(u32::MAX, Duration::from_secs(1));
        assert!(policy.delay_for(64).is_some());
    }

    proptest! {
        #[test]
        fn prop_delays_double(base_ms in 1u64..10_000, attempt in 1u32..20) {
            let policy = ReconnectPolicy::new(20, Duration::from_millis(base_ms));
            let current = policy.delay_for(attempt).expect("in range");
            let next = policy.delay_for(attempt + 1);

            if attempt < 20 {
                prop_assert_eq!(next, Some(current * 2));
            } else {
                prop_assert_eq!(next, None);
            }
        }
    }
}
