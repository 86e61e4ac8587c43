//! Per-handler counters for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use contracts::EventOutcome;

/// Metrics for a single handler worker
#[derive(Debug, Default)]
pub struct HandlerMetrics {
    /// Current queue length
    queue_len: AtomicUsize,
    /// Events the handler acted on
    handled_count: AtomicU64,
    /// Events filtered out by the handler
    ignored_count: AtomicU64,
    /// Events that ended in an error
    failure_count: AtomicU64,
    /// Events dropped due to full queue
    dropped_count: AtomicU64,
}

impl HandlerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn handled_count(&self) -> u64 {
        self.handled_count.load(Ordering::Relaxed)
    }

    pub fn ignored_count(&self) -> u64 {
        self.ignored_count.load(Ordering::Relaxed)
    }

    /// Count one successful `on_event` by its outcome
    pub fn record_outcome(&self, outcome: EventOutcome) {
        let counter = match outcome {
            EventOutcome::Handled => &self.handled_count,
            EventOutcome::Ignored => &self.ignored_count,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    pub fn inc_dropped_count(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            handled_count: self.handled_count(),
            ignored_count: self.ignored_count(),
            failure_count: self.failure_count(),
            dropped_count: self.dropped_count(),
        }
    }
}

/// Snapshot of handler metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub handled_count: u64,
    pub ignored_count: u64,
    pub failure_count: u64,
    pub dropped_count: u64,
}

impl MetricsSnapshot {
    /// Events that reached the handler
    pub fn processed(&self) -> u64 {
        self.handled_count + self.ignored_count + self.failure_count
    }
}
