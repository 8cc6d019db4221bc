//! Durable priority task queue and dispatcher (spec §4.6).

pub mod dispatcher;
pub mod task;

pub use dispatcher::Dispatcher;
pub use task::{backoff_seconds, TaskHandler};
