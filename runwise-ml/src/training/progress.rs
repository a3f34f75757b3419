//! Throughput tracking for a running loop.

use std::time::{Duration, Instant};

/// Counts processed examples against an optional known total.
///
/// Owned by the loop that drives it; not meant for concurrent producers.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    size: Option<usize>,
    n_examples: usize,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(size: Option<usize>) -> Self {
        Self {
            size,
            n_examples: 0,
            start_time: Instant::now(),
        }
    }

    pub fn add(&mut self, n_examples: usize) {
        self.n_examples += n_examples;
    }

    pub fn n_examples(&self) -> usize {
        self.n_examples
    }

    pub fn size(&self) -> Option<usize> {
        self.size
    }

    /// Percent complete, or `None` when the total is unknown.
    pub fn progress(&self) -> Option<f64> {
        let size = self.size?;
        if size == 0 {
            return Some(100.0);
        }
        Some(self.n_examples as f64 / size as f64 * 100.0)
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Throughput since construction, as `"N.NNex/s"` or `"N.NNs/ex"`.
    pub fn speed(&self) -> String {
        self.speed_over(self.elapsed())
    }

    /// Throughput over an explicit elapsed time. Rates above one example per
    /// second are shown as examples/second, slower ones as seconds/example.
    pub fn speed_over(&self, elapsed: Duration) -> String {
        let secs = elapsed.as_secs_f64();
        if self.n_examples == 0 || secs <= 0.0 {
            return "0.00ex/s".to_string();
        }
        let speed = self.n_examples as f64 / secs;
        if speed > 1.0 {
            format!("{speed:.2}ex/s")
        } else {
            format!("{:.2}s/ex", 1.0 / speed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent() {
        let mut tracker = ProgressTracker::new(Some(200));
        tracker.add(50);
        assert_eq!(tracker.progress(), Some(25.0));
        tracker.add(150);
        assert_eq!(tracker.progress(), Some(100.0));
    }

    #[test]
    fn test_progress_unknown_total() {
        let mut tracker = ProgressTracker::new(None);
        tracker.add(10);
        assert_eq!(tracker.progress(), None);
        assert_eq!(tracker.n_examples(), 10);
    }

    #[test]
    fn test_speed_formats() {
        let mut tracker = ProgressTracker::new(None);
        tracker.add(30);
        assert_eq!(tracker.speed_over(Duration::from_secs(10)), "3.00ex/s");
        assert_eq!(tracker.speed_over(Duration::from_secs(120)), "4.00s/ex");
        // exactly one example per second reads as seconds per example
        assert_eq!(tracker.speed_over(Duration::from_secs(30)), "1.00s/ex");
    }

    #[test]
    fn test_speed_without_examples() {
        let tracker = ProgressTracker::new(Some(5));
        assert_eq!(tracker.speed_over(Duration::from_secs(3)), "0.00ex/s");
        assert!(tracker.speed().ends_with("ex/s"));
    }
}
