//! Pipeline orchestration module.

mod events;
mod handlers;
mod orchestrator;
mod stats;

pub use handlers::{describe_handlers, HandlerInfo};
pub use orchestrator::{Pipeline, PipelineConfig};
pub use stats::PipelineStats;
