//! Process-wide assembly statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe accumulation of template-construction statistics.
///
/// All fields are plain atomics; readers see each counter individually
/// consistent, not a snapshot across fields.
#[derive(Debug)]
pub struct AssemblyMetrics {
    /// Cumulative microseconds spent in the package pass.
    package_time_us: AtomicU64,
    /// Cumulative microseconds spent in the score pass.
    score_time_us: AtomicU64,
    /// Templates built since process start.
    templates_built: AtomicU64,
    /// Transaction count of the most recent template, proofbase included.
    last_block_tx: AtomicU64,
    /// Serialized size of the most recent template.
    last_block_size: AtomicU64,
}

static METRICS: AssemblyMetrics = AssemblyMetrics::new();

/// The process-wide metrics instance.
pub fn global() -> &'static AssemblyMetrics {
    &METRICS
}

impl AssemblyMetrics {
    /// Creates a zeroed instance.
    pub const fn new() -> Self {
        Self {
            package_time_us: AtomicU64::new(0),
            score_time_us: AtomicU64::new(0),
            templates_built: AtomicU64::new(0),
            last_block_tx: AtomicU64::new(0),
            last_block_size: AtomicU64::new(0),
        }
    }

    /// Adds one package-pass duration.
    pub fn record_package_pass(&self, micros: u64) {
        self.package_time_us.fetch_add(micros, Ordering::Relaxed);
    }

    /// Adds one score-pass duration.
    pub fn record_score_pass(&self, micros: u64) {
        self.score_time_us.fetch_add(micros, Ordering::Relaxed);
    }

    /// Records a completed template.
    pub fn record_template(&self, tx_count: u64, block_size: u64) {
        self.templates_built.fetch_add(1, Ordering::Relaxed);
        self.last_block_tx.store(tx_count, Ordering::Relaxed);
        self.last_block_size.store(block_size, Ordering::Relaxed);
    }

    /// Cumulative package-pass time in microseconds.
    pub fn package_time_us(&self) -> u64 {
        self.package_time_us.load(Ordering::Relaxed)
    }

    /// Cumulative score-pass time in microseconds.
    pub fn score_time_us(&self) -> u64 {
        self.score_time_us.load(Ordering::Relaxed)
    }

    /// Number of templates built.
    pub fn templates_built(&self) -> u64 {
        self.templates_built.load(Ordering::Relaxed)
    }

    /// Transaction count of the most recent template.
    pub fn last_block_tx(&self) -> u64 {
        self.last_block_tx.load(Ordering::Relaxed)
    }

    /// Serialized size of the most recent template.
    pub fn last_block_size(&self) -> u64 {
        self.last_block_size.load(Ordering::Relaxed)
    }
}

impl Default for AssemblyMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate_and_gauges_overwrite() {
        let metrics = AssemblyMetrics::new();
        metrics.record_package_pass(100);
        metrics.record_package_pass(50);
        metrics.record_template(10, 5_000);
        metrics.record_template(3, 900);

        assert_eq!(metrics.package_time_us(), 150);
        assert_eq!(metrics.templates_built(), 2);
        assert_eq!(metrics.last_block_tx(), 3);
        assert_eq!(metrics.last_block_size(), 900);
    }
}
