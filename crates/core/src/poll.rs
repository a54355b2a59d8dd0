//! Bounded polling policy for long-running provider operations.
//!
//! The workflow re-checks an operation on a fixed interval. The policy
//! caps the number of attempts so an operation that never completes
//! fails the workflow with a timeout instead of suspending it forever.

use std::time::Duration;

/// How often to re-check an in-flight operation, and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between consecutive poll attempts.
    pub interval: Duration,
    /// Hard cap on poll attempts. Always at least 1.
    pub max_attempts: u32,
}

impl PollPolicy {
    /// Create a policy from an explicit interval and attempt cap.
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Derive the attempt cap from a maximum total wait duration.
    ///
    /// Rounds up, so the policy never waits *less* than `max_wait`.
    pub fn with_max_wait(interval: Duration, max_wait: Duration) -> Self {
        let interval_ms = interval.as_millis().max(1);
        let attempts = max_wait.as_millis().div_ceil(interval_ms) as u32;
        Self::new(interval, attempts)
    }

    /// Total wall-clock time this policy is willing to wait.
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

impl Default for PollPolicy {
    /// 5-second interval with a 5-minute ceiling.
    fn default() -> Self {
        Self::with_max_wait(Duration::from_secs(5), Duration::from_secs(300))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_wait_divides_into_attempts() {
        let policy = PollPolicy::with_max_wait(Duration::from_secs(5), Duration::from_secs(300));
        assert_eq!(policy.max_attempts, 60);
        assert_eq!(policy.max_wait(), Duration::from_secs(300));
    }

    #[test]
    fn attempt_count_rounds_up() {
        let policy = PollPolicy::with_max_wait(Duration::from_secs(7), Duration::from_secs(20));
        assert_eq!(policy.max_attempts, 3);
    }

    #[test]
    fn at_least_one_attempt() {
        let policy = PollPolicy::with_max_wait(Duration::from_secs(5), Duration::ZERO);
        assert_eq!(policy.max_attempts, 1);
        let policy = PollPolicy::new(Duration::from_secs(5), 0);
        assert_eq!(policy.max_attempts, 1);
    }
}
