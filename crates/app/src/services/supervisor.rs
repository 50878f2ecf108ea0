//! Connection supervisor: keeps the mesh connection alive.
//!
//! Two states: [`ConnectionState::Connecting`] and
//! [`ConnectionState::Connected`]. Every connection failure schedules exactly
//! one deferred re-initialisation of the mesh transport; the supervisor does
//! not own a timer itself, it tells the bridge loop how long to wait.

use std::time::Duration;

/// Delay the mesh transport waits before reconnecting after a failure.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(10_000);

/// How often, and how long apart, a failed operation is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Constant pause between two attempts.
    pub delay: Duration,
    /// Stop after this many consecutive failures. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Retry forever with a constant delay.
    #[must_use]
    pub const fn fixed(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    /// Retry with a constant delay, giving up after `max_attempts` failures.
    #[must_use]
    pub const fn bounded(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts: Some(max_attempts),
        }
    }

    /// Delay before the next attempt, given the number of consecutive
    /// failures so far, or `None` once the policy is exhausted.
    #[must_use]
    pub fn delay_for(&self, failures: u32) -> Option<Duration> {
        match self.max_attempts {
            Some(max) if failures >= max => None,
            _ => Some(self.delay),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RECONNECT_DELAY)
    }
}

/// Where the mesh connection stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
}

/// State machine deciding when the mesh transport is re-initialised.
#[derive(Debug)]
pub struct ConnectionSupervisor {
    policy: RetryPolicy,
    state: ConnectionState,
    failures: u32,
    retry_pending: bool,
}

impl ConnectionSupervisor {
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: ConnectionState::Connecting,
            failures: 0,
            retry_pending: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn failures(&self) -> u32 {
        self.failures
    }

    #[must_use]
    pub fn retry_pending(&self) -> bool {
        self.retry_pending
    }

    /// The mesh handshake succeeded.
    pub fn on_connected(&mut self) {
        self.state = ConnectionState::Connected;
        self.failures = 0;
    }

    /// A connection attempt failed (or the link dropped).
    ///
    /// Returns the delay after which the bridge must call `init()` again, or
    /// `None` when a retry is already scheduled or the policy gave up.
    pub fn on_connect_failed(&mut self) -> Option<Duration> {
        self.state = ConnectionState::Connecting;
        if self.retry_pending {
            tracing::debug!("mesh retry already scheduled, ignoring failure");
            return None;
        }
        self.failures = self.failures.saturating_add(1);
        let delay = self.policy.delay_for(self.failures);
        match delay {
            Some(delay) => {
                self.retry_pending = true;
                tracing::warn!(
                    failures = self.failures,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "unable to connect to the mesh, retrying later"
                );
            }
            None => {
                tracing::error!(failures = self.failures, "giving up reconnecting to the mesh");
            }
        }
        delay
    }

    /// The scheduled retry is due; the bridge is about to call `init()`.
    pub fn on_retry_due(&mut self) {
        self.retry_pending = false;
        self.state = ConnectionState::Connecting;
    }
}

impl Default for ConnectionSupervisor {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_ten_second_unbounded_retry() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay, Duration::from_secs(10));
        assert_eq!(policy.max_attempts, None);
        assert_eq!(policy.delay_for(u32::MAX), Some(Duration::from_secs(10)));
    }

    #[test]
    fn should_stop_bounded_policy_after_max_attempts() {
        let policy = RetryPolicy::bounded(Duration::from_secs(1), 2);
        assert_eq!(policy.delay_for(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_for(2), None);
    }

    #[test]
    fn should_start_in_connecting_state() {
        let supervisor = ConnectionSupervisor::default();
        assert_eq!(supervisor.state(), ConnectionState::Connecting);
        assert!(!supervisor.retry_pending());
    }

    #[test]
    fn should_schedule_one_retry_per_failure() {
        let mut supervisor = ConnectionSupervisor::default();
        assert_eq!(supervisor.on_connect_failed(), Some(DEFAULT_RECONNECT_DELAY));
        assert!(supervisor.retry_pending());

        supervisor.on_retry_due();
        assert!(!supervisor.retry_pending());
        assert_eq!(supervisor.on_connect_failed(), Some(DEFAULT_RECONNECT_DELAY));
        assert_eq!(supervisor.failures(), 2);
    }

    #[test]
    fn should_not_schedule_second_retry_while_one_is_pending() {
        let mut supervisor = ConnectionSupervisor::default();
        assert!(supervisor.on_connect_failed().is_some());
        assert!(supervisor.on_connect_failed().is_none());
        assert_eq!(supervisor.failures(), 1);
    }

    #[test]
    fn should_enter_connected_and_reset_failures_on_handshake() {
        let mut supervisor = ConnectionSupervisor::default();
        supervisor.on_connect_failed();
        supervisor.on_retry_due();
        supervisor.on_connected();
        assert_eq!(supervisor.state(), ConnectionState::Connected);
        assert_eq!(supervisor.failures(), 0);
    }

    #[test]
    fn should_return_to_connecting_when_connection_drops() {
        let mut supervisor = ConnectionSupervisor::default();
        supervisor.on_connected();
        supervisor.on_connect_failed();
        assert_eq!(supervisor.state(), ConnectionState::Connecting);
    }

    #[test]
    fn should_give_up_when_bounded_policy_is_exhausted() {
        let mut supervisor =
            ConnectionSupervisor::new(RetryPolicy::bounded(Duration::from_millis(5), 1));
        assert!(supervisor.on_connect_failed().is_none());
        assert!(!supervisor.retry_pending());
    }
}
