//! Upload conversion worker.
//!
//! This crate provides:
//! - Task processor: idempotency check, chunk merge, DASH packaging, bookkeeping
//! - Sequential executor with between-task shutdown
//! - Worker configuration and tracing setup

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod processor;

pub use config::{StoreBackend, WorkerConfig};
pub use error::{WorkerError, WorkerResult};
pub use executor::{ExecutionSummary, TaskExecutor};
pub use logging::{init_tracing, TaskLogger};
pub use processor::TaskProcessor;
