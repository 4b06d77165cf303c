use std::time::Duration;

use inklink_frame::DEFAULT_MAX_LINE_LENGTH;

/// How the sender reacts when a packet is not acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total send attempts per packet, including the first. Zero acts as one.
    pub max_attempts: u32,
    /// Delay before the first resend; doubles on each further attempt.
    pub backoff: Duration,
    /// Upper bound for the resend delay.
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Send every packet once and give up on the first ACK timeout.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(5),
        }
    }

    /// Delay before resend number `attempt` (1-based count of failed sends).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.backoff.saturating_mul(factor).min(self.max_backoff)
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Configuration for a [`crate::Link`].
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// How long to wait for each packet's ACK. `None` waits forever.
    pub ack_timeout: Option<Duration>,
    /// Resend policy applied after an ACK timeout.
    pub retry: RetryPolicy,
    /// Pause between consecutive chunks of one transmission.
    pub chunk_delay: Duration,
    /// How long a raised control signal stays raised.
    pub signal_clear_delay: Duration,
    /// How long a transmission may queue for the link. `None` waits forever.
    pub admission_timeout: Option<Duration>,
    /// Longest device line buffered before it is flushed as a log line.
    pub max_line_length: usize,
    /// Control signals registered in addition to `ACK`.
    pub extra_signals: Vec<String>,
    /// Device lines retained for slow line subscribers.
    pub line_buffer: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            ack_timeout: Some(Duration::from_secs(30)),
            retry: RetryPolicy::none(),
            chunk_delay: Duration::from_millis(100),
            signal_clear_delay: Duration::from_millis(100),
            admission_timeout: None,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            extra_signals: Vec::new(),
            line_buffer: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(350),
        };
        assert_eq!(policy.backoff_for(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(350));
        assert_eq!(policy.backoff_for(40), Duration::from_millis(350));
    }

    #[test]
    fn zero_attempts_means_one() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::none()
        };
        assert_eq!(policy.attempts(), 1);
    }

    #[test]
    fn defaults_bound_the_ack_wait() {
        let config = LinkConfig::default();
        assert_eq!(config.ack_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.retry.max_attempts, 1);
        assert_eq!(config.chunk_delay, Duration::from_millis(100));
        assert!(config.admission_timeout.is_none());
    }
}
