//! HandlerHandle - runs one handler behind its own queue and worker task

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{ApiEvent, EventHandler, EventOutcome};
use observability::{
    record_event_handled, record_queue_depth, EventMetricsAggregator, HandleStatus,
};

use crate::error::DispatcherError;
use crate::metrics::HandlerMetrics;

/// Run-wide aggregator shared by every worker
pub type SharedAggregator = Arc<Mutex<EventMetricsAggregator>>;

/// Handle to a running handler worker
pub struct HandlerHandle {
    name: String,
    tx: mpsc::Sender<ApiEvent>,
    metrics: Arc<HandlerMetrics>,
    aggregator: SharedAggregator,
    worker_handle: JoinHandle<()>,
}

impl HandlerHandle {
    /// Spawn the worker task for `handler`
    pub fn spawn<H>(handler: H, queue_capacity: usize, aggregator: SharedAggregator) -> Self
    where
        H: EventHandler + 'static,
    {
        let name = handler.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity);
        let metrics = Arc::new(HandlerMetrics::new());

        let worker = Worker {
            name: name.clone(),
            metrics: Arc::clone(&metrics),
            aggregator: Arc::clone(&aggregator),
        };
        let worker_handle = tokio::spawn(async move {
            worker.run(handler, rx).await;
        });

        Self {
            name,
            tx,
            metrics,
            aggregator,
            worker_handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<HandlerMetrics> {
        &self.metrics
    }

    /// Queue an event for the handler (non-blocking)
    ///
    /// A full queue drops the event and counts it as `dropped`.
    pub fn try_send(&self, event: ApiEvent) -> Result<(), DispatcherError> {
        match self.tx.try_send(event) {
            Ok(()) => {
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(event)) => {
                self.metrics.inc_dropped_count();
                record_event_handled(&self.name, HandleStatus::Dropped, Duration::ZERO);
                self.aggregator
                    .lock()
                    .record(&self.name, HandleStatus::Dropped, Duration::ZERO);
                warn!(
                    handler = %self.name,
                    command = %event.command,
                    "Queue full, event dropped"
                );
                Err(DispatcherError::queue_full(&self.name, event.command.as_str()))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(handler = %self.name, "Handler worker closed unexpectedly");
                Err(DispatcherError::WorkerClosed {
                    handler: self.name.clone(),
                })
            }
        }
    }

    /// Stop accepting events, drain the queue and close the handler
    #[instrument(name = "handler_handle_shutdown", skip(self), fields(handler = %self.name))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(handler = %self.name, error = ?e, "Worker task panicked");
        }
        debug!(handler = %self.name, "HandlerHandle shutdown complete");
    }
}

struct Worker {
    name: String,
    metrics: Arc<HandlerMetrics>,
    aggregator: SharedAggregator,
}

impl Worker {
    #[instrument(name = "handler_worker_loop", skip_all, fields(handler = %self.name))]
    async fn run<H: EventHandler>(self, mut handler: H, mut rx: mpsc::Receiver<ApiEvent>) {
        debug!(handler = %self.name, "Handler worker started");

        while let Some(event) = rx.recv().await {
            self.metrics.set_queue_len(rx.len());
            record_queue_depth(&self.name, rx.len());

            let started = Instant::now();
            let status = match handler.on_event(&event).await {
                Ok(outcome) => {
                    self.metrics.record_outcome(outcome);
                    match outcome {
                        EventOutcome::Handled => HandleStatus::Handled,
                        EventOutcome::Ignored => HandleStatus::Ignored,
                    }
                }
                Err(e) if e.is_remote() => {
                    self.metrics.inc_failure_count();
                    warn!(
                        handler = %self.name,
                        command = %event.command,
                        error = %e,
                        "Remote service rejected event"
                    );
                    HandleStatus::Failed
                }
                Err(e) => {
                    self.metrics.inc_failure_count();
                    error!(
                        handler = %self.name,
                        command = %event.command,
                        error = %e,
                        "Event handling failed"
                    );
                    // one bad event never stops the worker
                    HandleStatus::Failed
                }
            };
            let elapsed = started.elapsed();
            record_event_handled(&self.name, status, elapsed);
            self.aggregator.lock().record(&self.name, status, elapsed);
        }

        if let Err(e) = handler.close().await {
            error!(handler = %self.name, error = %e, "Close failed on shutdown");
        }

        debug!(handler = %self.name, "Handler worker stopped");
    }
}
