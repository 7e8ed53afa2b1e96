//! Bounded retry with exponential backoff around a `Prober`.

use std::time::Duration;

use tracing::{debug, warn};

use keepalive_config::MonitorSettings;
use keepalive_state::Outcome;

use crate::probe::Prober;

/// Final result of one scheduled invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryOutcome {
    pub outcome: Outcome,
    pub attempts_used: u32,
}

/// Retry schedule: up to `max_attempts` probes, sleeping
/// `base_delay * 2^i` after failed attempt `i` (zero based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&MonitorSettings::default())
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_settings(settings: &MonitorSettings) -> Self {
        Self::new(settings.max_retries, settings.base_delay)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff slept after failed attempt `attempt_index`.
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt_index).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Probe `url` until it succeeds or attempts run out.
    pub async fn attempt_with_retry(
        &self,
        prober: &dyn Prober,
        url: &str,
        timeout: Duration,
    ) -> RetryOutcome {
        for attempt in 0..self.max_attempts {
            match prober.probe(url, timeout).await {
                Ok(()) => {
                    debug!(%url, attempt = attempt + 1, "probe succeeded");
                    return RetryOutcome {
                        outcome: Outcome::Ok,
                        attempts_used: attempt + 1,
                    };
                }
                Err(e) => {
                    warn!(
                        %url,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "probe attempt failed"
                    );
                    if attempt + 1 < self.max_attempts {
                        tokio::time::sleep(self.delay_for(attempt)).await;
                    }
                }
            }
        }

        RetryOutcome {
            outcome: Outcome::Failed,
            attempts_used: self.max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProber;
    use tokio::time::Instant;

    const URL: &str = "https://a.example/healthz";

    #[test]
    fn default_policy_matches_constants() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay_for(0), Duration::from_secs(5));
        assert_eq!(policy.delay_for(1), Duration::from_secs(10));
    }

    #[test]
    fn delays_are_non_decreasing() {
        let policy = RetryPolicy::new(8, Duration::from_secs(5));
        let delays: Vec<_> = (0..8).map(|i| policy.delay_for(i)).collect();
        for (i, d) in delays.iter().enumerate() {
            assert_eq!(*d, Duration::from_secs(5) * 2u32.pow(i as u32));
        }
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn huge_attempt_index_saturates() {
        let policy = RetryPolicy::new(3, Duration::from_secs(5));
        assert!(policy.delay_for(64) >= policy.delay_for(31));
    }

    #[test]
    fn zero_attempts_clamped_to_one() {
        assert_eq!(RetryPolicy::new(0, Duration::from_secs(1)).max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_first_attempt() {
        let prober = ScriptedProber::always_ok();
        let started = Instant::now();

        let result = RetryPolicy::default()
            .attempt_with_retry(&prober, URL, Duration::from_secs(1))
            .await;

        assert_eq!(result, RetryOutcome { outcome: Outcome::Ok, attempts_used: 1 });
        assert_eq!(prober.calls(), 1);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_second_attempt_stops_retrying() {
        let prober = ScriptedProber::new([false, true, true]);
        let started = Instant::now();

        let result = RetryPolicy::default()
            .attempt_with_retry(&prober, URL, Duration::from_secs(1))
            .await;

        assert_eq!(result, RetryOutcome { outcome: Outcome::Ok, attempts_used: 2 });
        assert_eq!(prober.calls(), 2);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(5) && elapsed < Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_report_failed() {
        let prober = ScriptedProber::always_failing();
        let started = Instant::now();

        let result = RetryPolicy::default()
            .attempt_with_retry(&prober, URL, Duration::from_secs(1))
            .await;

        assert_eq!(result, RetryOutcome { outcome: Outcome::Failed, attempts_used: 3 });
        assert_eq!(prober.calls(), 3);
        // 5s + 10s of backoff, no sleep after the last attempt.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(15) && elapsed < Duration::from_secs(16));
    }
}
