//! Pipeline statistics.

use std::time::Duration;

use observability::MetricsSummary;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Non-blank input lines read
    pub lines_read: u64,

    /// Events handed to the dispatcher
    pub events_dispatched: u64,

    /// Input lines that were not valid events
    pub invalid_lines: u64,

    /// Total duration of the run
    pub duration: Duration,

    /// Handlers that were running
    pub active_handlers: Vec<String>,

    /// Per-handler outcome counts and latency
    pub metrics: MetricsSummary,
}

impl PipelineStats {
    /// Events per second throughput
    pub fn events_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.events_dispatched as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Share of handler invocations that failed, in percent
    pub fn failure_rate(&self) -> f64 {
        let (failed, total) = self.metrics.handlers.iter().fold((0, 0), |(f, t), h| {
            (f + h.failed, t + h.handled + h.ignored + h.failed)
        });
        if total > 0 {
            (failed as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Pipeline Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Lines read: {}", self.lines_read);
        println!("   ├─ Events dispatched: {}", self.events_dispatched);
        println!("   ├─ Invalid lines: {}", self.invalid_lines);
        println!("   ├─ Events/s: {:.2}", self.events_per_sec());
        println!("   └─ Active handlers: {}", self.active_handlers.join(", "));

        println!("\n📈 Handlers (failure rate {:.2}%)", self.failure_rate());
        let count = self.metrics.handlers.len();
        for (i, h) in self.metrics.handlers.iter().enumerate() {
            let prefix = if i + 1 == count { "└─" } else { "├─" };
            println!(
                "   {} {}: handled={} ignored={} failed={} dropped={}",
                prefix, h.name, h.handled, h.ignored, h.failed, h.dropped
            );
            let rail = if i + 1 == count { " " } else { "│" };
            println!("   {}    latency(ms): {}", rail, h.latency_ms);
        }

        println!();
    }
}
