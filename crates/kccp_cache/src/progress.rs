//! Throttled progress logging for long sequential passes.

use std::time::{Duration, Instant};

use tracing::info;

/// Default minimum time between two progress lines.
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(10);

/// Logs "x% (done/total)" lines, at most once per interval.
#[derive(Debug)]
pub struct Progress {
    label: &'static str,
    total: usize,
    completed: usize,
    interval: Duration,
    last_print: Instant,
}

impl Progress {
    /// Creates a tracker logging at most every [`PROGRESS_INTERVAL`].
    pub fn new(label: &'static str, total: usize) -> Self {
        Self::with_interval(label, total, PROGRESS_INTERVAL)
    }

    /// Creates a tracker with a custom minimum time between lines.
    pub fn with_interval(label: &'static str, total: usize, interval: Duration) -> Self {
        Self {
            label,
            total,
            completed: 0,
            interval,
            last_print: Instant::now(),
        }
    }

    /// Records one processed item. Returns true if a line was logged.
    pub fn tick(&mut self) -> bool {
        self.completed += 1;
        if self.last_print.elapsed() < self.interval {
            return false;
        }

        info!(
            "Current {} progress: {:.1}% ({}/{})",
            self.label,
            self.percent(),
            self.completed,
            self.total
        );
        self.last_print = Instant::now();
        true
    }

    /// Percentage of items processed so far.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }

    /// Number of items processed so far.
    pub fn completed(&self) -> usize {
        self.completed
    }
}
