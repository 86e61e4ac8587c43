//! Built-in handlers
//!
//! Domain handlers live in their own crates; only the log-only debug
//! output ships with the dispatcher.

mod log;

pub use self::log::DebugOutput;
