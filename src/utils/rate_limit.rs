// src/utils/rate_limit.rs - minimum spacing between calls to a rate-limited source
use log::debug;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum interval between call starts, measured from the
/// start of the previous governed call. The upstream service rate-limits
/// per client, not per logical search, so the last-call timestamp is
/// shared by every request flowing through one governor instance.
pub struct RateGovernor {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateGovernor {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Suspends until the interval since the previous governed call start
    /// has elapsed, then records this call's start. Holding the lock
    /// across the wait keeps concurrent governed calls serialized.
    pub async fn acquire(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            let ready_at = previous + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                debug!(
                    "Rate governor: waiting {:?} before next call",
                    ready_at - now
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_calls_observe_floor() {
        let governor = RateGovernor::new(Duration::from_millis(1000));

        let first_start = Instant::now();
        governor.acquire().await;
        governor.acquire().await;
        let second_start = Instant::now();

        assert!(second_start - first_start >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_floor_does_not_wait() {
        let governor = RateGovernor::new(Duration::from_millis(1000));

        governor.acquire().await;
        tokio::time::advance(Duration::from_millis(1500)).await;

        let before = Instant::now();
        governor.acquire().await;
        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_call_is_immediate() {
        let governor = RateGovernor::new(Duration::from_millis(1000));
        let before = Instant::now();
        governor.acquire().await;
        assert_eq!(Instant::now(), before);
    }
}
