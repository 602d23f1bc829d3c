use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Fixed-interval spacing between successive calls to one upstream.
///
/// `wait` returns immediately the first time and after that only once
/// `interval` has elapsed since the last `mark`.
#[derive(Debug)]
pub struct IntervalGate {
    interval: Duration,
    next_at: Option<Instant>,
}

impl IntervalGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_at: None,
        }
    }

    /// A gate that never waits.
    pub fn unpaced() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn wait(&self) {
        if let Some(at) = self.next_at {
            if at > Instant::now() {
                tracing::debug!(delay_ms = (at - Instant::now()).as_millis() as u64, "pacing");
                sleep_until(at).await;
            }
        }
    }

    /// Record that a call just finished.
    pub fn mark(&mut self) {
        self.next_at = Some(Instant::now() + self.interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_wait_is_immediate() {
        let gate = IntervalGate::new(Duration::from_secs(15));
        let start = Instant::now();
        gate.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_after_mark_spans_interval() {
        let mut gate = IntervalGate::new(Duration::from_secs(15));
        gate.mark();
        let start = Instant::now();
        gate.wait().await;
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_time_counts_toward_interval() {
        let mut gate = IntervalGate::new(Duration::from_secs(15));
        gate.mark();
        tokio::time::advance(Duration::from_secs(10)).await;
        let start = Instant::now();
        gate.wait().await;
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unpaced_never_waits() {
        let mut gate = IntervalGate::unpaced();
        let start = Instant::now();
        for _ in 0..6 {
            gate.wait().await;
            gate.mark();
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
