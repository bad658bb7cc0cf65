//! Minimum-interval rate limiter: Jikan needs ≥ 1 s
//! between calls with one 5 s-backoff retry on 429; AniDB needs one call
//! per 2 s. Both are expressed as the same primitive with a different
//! interval.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
pub struct MinIntervalLimiter {
    interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl MinIntervalLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_call: Mutex::new(None),
        }
    }

    /// Blocks the caller, if necessary, until `interval` has elapsed
    /// since the previous call returned from this same method.
    pub async fn acquire(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(last) = *last_call {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_call_waits_out_the_interval() {
        let limiter = MinIntervalLimiter::new(Duration::from_millis(30));
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
