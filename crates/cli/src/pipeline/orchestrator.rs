//! Pipeline orchestrator - event input, dispatcher and handlers.

use std::future::Future;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{ApiEvent, PluginConfig};
use dispatcher::{DispatcherBuilder, DispatcherConfig};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::events::parse_event_line;
use super::handlers::build_handlers;
use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated plugin configuration
    pub plugin: PluginConfig,

    /// Event file (None = stdin)
    pub events: Option<PathBuf>,

    /// Maximum number of events to dispatch (None = unlimited)
    pub max_events: Option<u64>,

    /// Channel buffer size
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until the input ends or `shutdown` resolves, then drain handlers
    pub async fn run<S>(self, shutdown: S) -> Result<PipelineStats>
    where
        S: Future<Output = ()>,
    {
        match self.config.events.clone() {
            Some(path) => {
                let file = tokio::fs::File::open(&path)
                    .await
                    .with_context(|| format!("Failed to open event file {}", path.display()))?;
                info!(path = %path.display(), "Reading events from file");
                self.run_with_input(BufReader::new(file), shutdown).await
            }
            None => {
                info!("Reading events from stdin");
                self.run_with_input(BufReader::new(tokio::io::stdin()), shutdown)
                    .await
            }
        }
    }

    /// Run against any line-oriented input
    pub async fn run_with_input<R, S>(self, input: R, shutdown: S) -> Result<PipelineStats>
    where
        R: AsyncBufRead + Unpin,
        S: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let plugin = &self.config.plugin;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Setup Handlers
        info!(output_dir = %plugin.output_directory().display(), "Setting up handlers...");
        let handlers = build_handlers(plugin).context("Failed to create handlers")?;
        if handlers.is_empty() {
            warn!("No plugins enabled - events will only be counted");
        }

        // Setup Dispatcher
        let (event_tx, event_rx) = mpsc::channel::<ApiEvent>(self.config.buffer_size.max(1));
        let dispatcher_config = DispatcherConfig::from(&plugin.dispatcher);
        let mut builder = DispatcherBuilder::new(dispatcher_config, event_rx);
        for handler in handlers {
            builder = builder.handler(handler);
        }
        let dispatcher = builder.build().context("Failed to create dispatcher")?;

        let mut stats = PipelineStats {
            active_handlers: dispatcher.handler_names(),
            ..Default::default()
        };
        let dispatcher_handle = dispatcher.spawn();
        info!(handlers = ?stats.active_handlers, "Dispatcher started");

        let feed_result =
            feed_events(input, &event_tx, &mut stats, self.config.max_events, shutdown).await;

        // Shutdown
        info!("Shutting down pipeline...");
        drop(event_tx);
        stats.metrics = dispatcher_handle
            .await
            .context("Dispatcher task failed")?;
        stats.duration = start_time.elapsed();

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            events = stats.events_dispatched,
            "Pipeline shutdown complete"
        );

        feed_result.map(|()| stats)
    }
}

/// Forward parsed events to the dispatcher
async fn feed_events<R, S>(
    input: R,
    event_tx: &mpsc::Sender<ApiEvent>,
    stats: &mut PipelineStats,
    max_events: Option<u64>,
    shutdown: S,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let mut lines = input.lines();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            biased;
            _ = &mut shutdown => {
                warn!("Received shutdown signal, stopping event intake...");
                break;
            }
            line = lines.next_line() => line.context("Failed to read event input")?,
        };
        let Some(line) = line else {
            info!(lines = stats.lines_read, "Event input exhausted");
            break;
        };

        let event = match parse_event_line(&line) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                stats.lines_read += 1;
                stats.invalid_lines += 1;
                warn!(line = stats.lines_read, error = %e, "Skipping malformed event line");
                continue;
            }
        };
        stats.lines_read += 1;

        if event_tx.send(event).await.is_err() {
            warn!("Dispatcher channel closed");
            break;
        }
        stats.events_dispatched += 1;

        if let Some(max) = max_events {
            if stats.events_dispatched >= max {
                info!(events = stats.events_dispatched, "Reached max events limit");
                break;
            }
        }
    }

    Ok(())
}
