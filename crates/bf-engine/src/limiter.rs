use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorLimiter};
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use bf_core::EngineError;

type Inner = GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// How often `acquire` re-checks the bucket while waiting for a token.
/// Matches the polling cadence used elsewhere in the workspace for
/// governor-backed limiters; governor's non-async API has no `wait`
/// primitive to block on directly.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Snapshot of the limiter's current parameters, for `Engine::rate_limit_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub min_delay: Duration,
    pub burst: u32,
    /// `true` when `min_delay == 0` and no limiter is installed.
    pub unlimited: bool,
}

struct LimiterState {
    limiter: Option<Arc<Inner>>,
    min_delay: Duration,
    burst: u32,
}

/// The shared token bucket gating every attempt across all targets. Rate =
/// one token every `min_delay`; burst = `burst`. `min_delay == 0` means
/// unlimited (no limiter installed at all), per the documented resolution
/// of the source's degenerate-`rate.Every(0)` behavior.
pub struct RateLimiter {
    state: RwLock<LimiterState>,
}

impl RateLimiter {
    pub fn new(min_delay: Duration, burst: u32) -> Self {
        Self {
            state: RwLock::new(build(min_delay, burst)),
        }
    }

    /// Atomically replace the limiter's parameters. Already-waiting
    /// acquirers observe the new schedule on their next poll.
    pub fn update(&self, min_delay: Duration, burst: u32) {
        *self.state.write() = build(min_delay, burst);
    }

    /// Blocks until a token is available or `cancel` fires.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), EngineError> {
        loop {
            let limiter = self.state.read().limiter.clone();
            let Some(limiter) = limiter else {
                return Ok(());
            };
            if limiter.check().is_ok() {
                return Ok(());
            }
            tokio::select! {
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
                _ = cancel.cancelled() => return Err(EngineError::Cancelled),
            }
        }
    }

    /// Current rate-limit parameters, for progress/status reporting.
    pub fn status(&self) -> RateLimitStatus {
        let state = self.state.read();
        RateLimitStatus {
            min_delay: state.min_delay,
            burst: state.burst,
            unlimited: state.limiter.is_none(),
        }
    }
}

fn build(min_delay: Duration, burst: u32) -> LimiterState {
    if min_delay.is_zero() {
        return LimiterState {
            limiter: None,
            min_delay,
            burst,
        };
    }
    let burst_nonzero = NonZeroU32::new(burst.max(1)).expect("burst.max(1) is never zero");
    let quota = Quota::with_period(min_delay)
        .expect("min_delay is non-zero")
        .allow_burst(burst_nonzero);
    LimiterState {
        limiter: Some(Arc::new(GovernorLimiter::direct(quota))),
        min_delay,
        burst,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_delay_is_unlimited() {
        let limiter = RateLimiter::new(Duration::ZERO, 1);
        let cancel = CancellationToken::new();
        for _ in 0..1000 {
            limiter.acquire(&cancel).await.unwrap();
        }
    }

    #[tokio::test]
    async fn burst_then_throttle() {
        let limiter = RateLimiter::new(Duration::from_millis(50), 3);
        let cancel = CancellationToken::new();
        for _ in 0..3 {
            limiter.acquire(&cancel).await.unwrap();
        }
        let start = tokio::time::Instant::now();
        limiter.acquire(&cancel).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn status_reports_current_params() {
        let limiter = RateLimiter::new(Duration::from_millis(50), 3);
        let status = limiter.status();
        assert!(!status.unlimited);
        assert_eq!(status.min_delay, Duration::from_millis(50));
        assert_eq!(status.burst, 3);

        limiter.update(Duration::ZERO, 1);
        assert!(limiter.status().unlimited);
    }

    #[tokio::test]
    async fn cancellation_aborts_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(5), 1);
        let cancel = CancellationToken::new();
        limiter.acquire(&cancel).await.unwrap();

        let cancel2 = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel2.cancel();
        });
        let err = limiter.acquire(&cancel).await.unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
    }
}
