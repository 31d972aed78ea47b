//! Progress reporting for long alignment streams.
//!
//! The aggregator calls a [`ProgressObserver`] roughly every 0.1% of the
//! expected record count and once more at the end. Observers only see counts;
//! they cannot influence aggregation.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

/// Number of progress steps over a stream of known length
pub const PROGRESS_STEPS: u64 = 1000;

/// Reporting interval when the expected record count is unknown
pub const UNKNOWN_TOTAL_INTERVAL: u64 = 1_000_000;

/// Receives progress updates while a library is ingested
pub trait ProgressObserver: Send + Sync {
    /// `expected` is 0 when the total is not known in advance.
    fn update(&self, source: &str, processed: u64, expected: u64);
}

/// Observer that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn update(&self, _source: &str, _processed: u64, _expected: u64) {}
}

/// Observer that logs each whole percent reached at debug level
#[derive(Debug, Default)]
pub struct LogProgress {
    last_percent: Mutex<HashMap<String, u64>>,
}

impl LogProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressObserver for LogProgress {
    fn update(&self, source: &str, processed: u64, expected: u64) {
        if expected == 0 {
            debug!(source, processed, "Parsed alignment records");
            return;
        }

        let percent = processed.saturating_mul(100) / expected;
        let Ok(mut last) = self.last_percent.lock() else {
            return;
        };
        let previous = last.insert(source.to_string(), percent);
        if previous != Some(percent) {
            debug!(source, processed, expected, "Parsed {percent}% of alignment records");
        }
    }
}

/// Decides when the aggregator should notify its observer
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cadence {
    interval: u64,
    expected: u64,
}

impl Cadence {
    pub(crate) fn new(expected: Option<u64>) -> Self {
        match expected {
            Some(expected) if expected > 0 => Self {
                interval: (expected / PROGRESS_STEPS).max(1),
                expected,
            },
            _ => Self {
                interval: UNKNOWN_TOTAL_INTERVAL,
                expected: 0,
            },
        }
    }

    pub(crate) fn is_due(self, processed: u64) -> bool {
        processed % self.interval == 0
    }

    pub(crate) fn expected(self) -> u64 {
        self.expected
    }

    /// The count reported by the final call
    pub(crate) fn final_count(self, processed: u64) -> u64 {
        if self.expected > 0 {
            self.expected
        } else {
            processed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cadence_interval() {
        let cadence = Cadence::new(Some(1_000_000));
        assert!(cadence.is_due(1000));
        assert!(!cadence.is_due(1500));
        assert!(cadence.is_due(2000));
        assert_eq!(cadence.final_count(999_000), 1_000_000);
    }

    #[test]
    fn test_cadence_small_total() {
        let cadence = Cadence::new(Some(10));
        assert!(cadence.is_due(1));
        assert!(cadence.is_due(7));
    }

    #[test]
    fn test_cadence_unknown_total() {
        let cadence = Cadence::new(None);
        assert_eq!(cadence.expected(), 0);
        assert!(!cadence.is_due(10));
        assert!(cadence.is_due(UNKNOWN_TOTAL_INTERVAL));
        assert_eq!(cadence.final_count(42), 42);

        assert_eq!(Cadence::new(Some(0)).expected(), 0);
    }

    #[test]
    fn test_log_progress_tracks_sources_independently() {
        let progress = LogProgress::new();
        progress.update("lib1", 10, 100);
        progress.update("lib2", 50, 100);
        let last = progress.last_percent.lock().unwrap();
        assert_eq!(last.get("lib1"), Some(&10));
        assert_eq!(last.get("lib2"), Some(&50));
    }
}
