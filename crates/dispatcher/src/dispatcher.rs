//! Dispatcher - main loop for fan-out to handlers

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use contracts::{ApiEvent, DispatcherSettings, EventHandler};
use observability::{record_event_received, MetricsSummary};

use crate::error::DispatcherError;
use crate::handle::{HandlerHandle, SharedAggregator};
use crate::metrics::MetricsSnapshot;

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Per-handler queue capacity
    pub queue_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::from(&DispatcherSettings::default())
    }
}

impl From<&DispatcherSettings> for DispatcherConfig {
    fn from(settings: &DispatcherSettings) -> Self {
        Self {
            queue_capacity: settings.queue_capacity,
        }
    }
}

type Spawner = Box<dyn FnOnce(usize, SharedAggregator) -> HandlerHandle + Send>;

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    input_rx: mpsc::Receiver<ApiEvent>,
    spawners: Vec<(String, Spawner)>,
}

impl DispatcherBuilder {
    pub fn new(config: DispatcherConfig, input_rx: mpsc::Receiver<ApiEvent>) -> Self {
        Self {
            config,
            input_rx,
            spawners: Vec::new(),
        }
    }

    /// Register a handler; its worker starts on `build`
    pub fn handler<H>(mut self, handler: H) -> Self
    where
        H: EventHandler + 'static,
    {
        let name = handler.name().to_string();
        self.spawners.push((
            name,
            Box::new(move |capacity, aggregator| {
                HandlerHandle::spawn(handler, capacity, aggregator)
            }),
        ));
        self
    }

    /// Build and start the handler workers
    #[instrument(
        name = "dispatcher_builder_build",
        skip(self),
        fields(handler_count = self.spawners.len())
    )]
    pub fn build(self) -> Result<Dispatcher, DispatcherError> {
        if self.config.queue_capacity == 0 {
            return Err(DispatcherError::InvalidConfig(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.spawners.is_empty() {
            warn!("No handlers configured - events will be dropped");
        }

        let capacity = self.config.queue_capacity;
        let aggregator = SharedAggregator::default();
        let handles = self
            .spawners
            .into_iter()
            .map(|(name, spawn)| {
                debug!(handler = %name, "Starting handler worker");
                spawn(capacity, Arc::clone(&aggregator))
            })
            .collect();

        Ok(Dispatcher {
            handles,
            input_rx: self.input_rx,
            aggregator,
        })
    }
}

/// The main Dispatcher that fans out events to handlers
pub struct Dispatcher {
    handles: Vec<HandlerHandle>,
    input_rx: mpsc::Receiver<ApiEvent>,
    aggregator: SharedAggregator,
}

impl Dispatcher {
    pub fn handler_names(&self) -> Vec<String> {
        self.handles.iter().map(|h| h.name().to_string()).collect()
    }

    /// Get metrics for all handlers
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Run the dispatcher main loop
    ///
    /// Returns once the input channel is closed and every handler has
    /// drained its queue and been closed.
    #[instrument(name = "dispatcher_run", skip(self))]
    pub async fn run(mut self) -> MetricsSummary {
        info!(handlers = self.handles.len(), "Dispatcher started");

        let mut event_count: u64 = 0;

        while let Some(event) = self.input_rx.recv().await {
            event_count += 1;
            record_event_received(&event.command);
            self.aggregator.lock().record_received();
            self.dispatch_event(&event);

            if event_count.is_multiple_of(100) {
                debug!(events = event_count, "Dispatcher progress");
            }
        }

        info!(events = event_count, "Dispatcher input closed, shutting down");

        Self::shutdown_handles(self.handles).await;

        let summary = self.aggregator.lock().summary();
        info!("Dispatcher shutdown complete");
        summary
    }

    /// Spawn the dispatcher as a background task
    pub fn spawn(self) -> JoinHandle<MetricsSummary> {
        tokio::spawn(self.run())
    }

    fn dispatch_event(&self, event: &ApiEvent) {
        for handle in &self.handles {
            // drops are already logged and counted by the handle
            let _ = handle.try_send(event.clone());
        }
    }

    async fn shutdown_handles(handles: Vec<HandlerHandle>) {
        for handle in handles {
            handle.shutdown().await;
        }
    }
}
