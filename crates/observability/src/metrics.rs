//! Event pipeline metrics
//!
//! Prometheus counters through the `metrics` facade, plus an in-memory
//! aggregator for the end-of-run summary.

use metrics::{counter, gauge, histogram};
use std::collections::BTreeMap;
use std::time::Duration;

/// Result of one handler invocation, as recorded in metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HandleStatus {
    Handled,
    Ignored,
    Failed,
    Dropped,
}

impl HandleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Handled => "handled",
            Self::Ignored => "ignored",
            Self::Failed => "failed",
            Self::Dropped => "dropped",
        }
    }
}

/// Record one event entering the dispatcher
pub fn record_event_received(command: &str) {
    counter!("swarpf_events_received_total").increment(1);
    tracing::trace!(command, "event received");
}

/// Record one handler invocation
pub fn record_event_handled(handler: &str, status: HandleStatus, elapsed: Duration) {
    counter!(
        "swarpf_events_handled_total",
        "handler" => handler.to_string(),
        "status" => status.as_str()
    )
    .increment(1);

    if status != HandleStatus::Dropped {
        histogram!(
            "swarpf_handler_latency_ms",
            "handler" => handler.to_string()
        )
        .record(elapsed.as_secs_f64() * 1000.0);
    }
}

/// Record one remote submission
///
/// `outcome` is a short label such as `success` or `auth_failure`.
pub fn record_upload(endpoint: &str, outcome: &str) {
    counter!(
        "swarpf_uploads_total",
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record one export file written (`profile`, `siege_match`, `siege_defense`)
pub fn record_export_written(kind: &'static str) {
    counter!("swarpf_exports_written_total", "kind" => kind).increment(1);
}

/// Record the queue depth of a handler worker
pub fn record_queue_depth(handler: &str, depth: usize) {
    gauge!(
        "swarpf_handler_queue_depth",
        "handler" => handler.to_string()
    )
    .set(depth as f64);
}

/// In-memory event metrics for the run summary
#[derive(Debug, Clone, Default)]
pub struct EventMetricsAggregator {
    pub total_events: u64,
    /// handler -> status -> count
    pub by_handler: BTreeMap<String, BTreeMap<HandleStatus, u64>>,
    /// handler -> latency (ms)
    pub latency: BTreeMap<String, RunningStats>,
}

impl EventMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&mut self) {
        self.total_events += 1;
    }

    pub fn record(&mut self, handler: &str, status: HandleStatus, elapsed: Duration) {
        *self
            .by_handler
            .entry(handler.to_string())
            .or_default()
            .entry(status)
            .or_insert(0) += 1;

        if status != HandleStatus::Dropped {
            self.latency
                .entry(handler.to_string())
                .or_default()
                .push(elapsed.as_secs_f64() * 1000.0);
        }
    }

    pub fn count(&self, handler: &str, status: HandleStatus) -> u64 {
        self.by_handler
            .get(handler)
            .and_then(|statuses| statuses.get(&status))
            .copied()
            .unwrap_or(0)
    }

    pub fn summary(&self) -> MetricsSummary {
        let handlers = self
            .by_handler
            .iter()
            .map(|(name, statuses)| {
                let get = |s| statuses.get(&s).copied().unwrap_or(0);
                HandlerSummary {
                    name: name.clone(),
                    handled: get(HandleStatus::Handled),
                    ignored: get(HandleStatus::Ignored),
                    failed: get(HandleStatus::Failed),
                    dropped: get(HandleStatus::Dropped),
                    latency_ms: self
                        .latency
                        .get(name)
                        .map(StatsSummary::from)
                        .unwrap_or_default(),
                }
            })
            .collect();

        MetricsSummary {
            total_events: self.total_events,
            handlers,
        }
    }
}

/// Per-handler line of the summary
#[derive(Debug, Clone, Default)]
pub struct HandlerSummary {
    pub name: String,
    pub handled: u64,
    pub ignored: u64,
    pub failed: u64,
    pub dropped: u64,
    pub latency_ms: StatsSummary,
}

#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_events: u64,
    pub handlers: Vec<HandlerSummary>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Event Metrics Summary ===")?;
        writeln!(f, "Total events: {}", self.total_events)?;
        for h in &self.handlers {
            writeln!(
                f,
                "  {}: handled={} ignored={} failed={} dropped={} latency(ms): {}",
                h.name, h.handled, h.ignored, h.failed, h.dropped, h.latency_ms
            )?;
        }
        Ok(())
    }
}

/// Statistics snapshot
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_counts_per_handler() {
        let mut aggregator = EventMetricsAggregator::new();
        aggregator.record_received();
        aggregator.record_received();
        aggregator.record("profile_export", HandleStatus::Handled, Duration::from_millis(4));
        aggregator.record("profile_export", HandleStatus::Ignored, Duration::from_millis(0));
        aggregator.record("swarfarm", HandleStatus::Failed, Duration::from_millis(12));
        aggregator.record("swarfarm", HandleStatus::Dropped, Duration::ZERO);

        assert_eq!(aggregator.count("profile_export", HandleStatus::Handled), 1);
        assert_eq!(aggregator.count("swarfarm", HandleStatus::Dropped), 1);
        assert_eq!(aggregator.count("unknown", HandleStatus::Handled), 0);

        let summary = aggregator.summary();
        assert_eq!(summary.total_events, 2);
        assert_eq!(summary.handlers.len(), 2);
        let swarfarm = &summary.handlers[1];
        assert_eq!(swarfarm.name, "swarfarm");
        assert_eq!(swarfarm.failed, 1);
        // dropped events carry no latency sample
        assert_eq!(swarfarm.latency_ms.count, 1);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = EventMetricsAggregator::new();
        aggregator.record("siege_export", HandleStatus::Handled, Duration::from_millis(1));
        let text = aggregator.summary().to_string();
        assert!(text.contains("siege_export: handled=1"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_event_received("HubUserLogin");
        record_event_handled("swarfarm", HandleStatus::Handled, Duration::from_millis(3));
        record_upload("data_logs", "success");
        record_export_written("profile");
        record_queue_depth("swarfarm", 2);
    }
}
