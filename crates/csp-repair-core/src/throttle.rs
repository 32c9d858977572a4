//! Spacing between oracle calls.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum interval between permits, shared across tasks.
///
/// The lock is held while sleeping, so concurrent callers queue up and
/// leave one interval apart.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// A throttle that never waits.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until at least `interval` has passed since the previous permit.
    pub async fn acquire(&self) {
        if self.interval.is_zero() {
            return;
        }
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.interval).await;
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_permits_are_spaced() {
        let throttle = Throttle::from_millis(500);
        let start = Instant::now();
        throttle.acquire().await;
        throttle.acquire().await;
        throttle.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert!(start.elapsed() < Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_permit_is_immediate() {
        let throttle = Throttle::from_millis(500);
        let start = Instant::now();
        throttle.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_disabled_never_waits() {
        let throttle = Throttle::disabled();
        for _ in 0..100 {
            throttle.acquire().await;
        }
    }
}
