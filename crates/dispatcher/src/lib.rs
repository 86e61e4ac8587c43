//! # Dispatcher
//!
//! Event fan-out.
//!
//! - Consumes `ApiEvent`s from the transport
//! - Fans each event out to every registered handler
//! - Isolates slow handlers (uploads) behind their own bounded queue

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod handlers;
pub mod metrics;

pub use contracts::{ApiEvent, EventHandler};
pub use dispatcher::{Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use error::DispatcherError;
pub use handle::{HandlerHandle, SharedAggregator};
pub use handlers::DebugOutput;
pub use metrics::{HandlerMetrics, MetricsSnapshot};
