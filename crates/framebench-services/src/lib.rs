//! Services layered over the session orchestrator: persistence and the
//! run → metrics → history pipeline.

mod benchmark;
mod history;

pub use benchmark::{BenchmarkService, RunReport, ServiceError};
pub use history::{HistoryError, HistoryStore};

// Re-export core types for the CLI
pub use framebench_core::{HistoryRecord, MetricSet};
