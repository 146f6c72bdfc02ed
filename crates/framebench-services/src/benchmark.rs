use std::path::PathBuf;

use chrono::{DateTime, Local};
use framebench_benchmark::{
    ExternalRunner, ProcessController, SessionError, SessionOrchestrator,
};
use framebench_core::MetricSet;
use thiserror::Error;
use tracing::{info, instrument};

use crate::{HistoryError, HistoryStore};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("Failed to save history: {0}")]
    History(#[from] HistoryError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Result of a completed run as it was recorded in history.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub session_dir: PathBuf,
    pub frame_count: usize,
    pub metrics: MetricSet,
}

/// Runs sessions and records their metrics.
pub struct BenchmarkService<R, P> {
    orchestrator: SessionOrchestrator<R, P>,
    history: HistoryStore,
}

impl<R: ExternalRunner, P: ProcessController> BenchmarkService<R, P> {
    pub fn new(orchestrator: SessionOrchestrator<R, P>, history: HistoryStore) -> Self {
        Self {
            orchestrator,
            history,
        }
    }

    pub fn orchestrator(&self) -> &SessionOrchestrator<R, P> {
        &self.orchestrator
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub async fn run(&mut self) -> Result<RunReport> {
        self.run_at(Local::now()).await
    }

    /// A failed session leaves history untouched.
    #[instrument(skip(self))]
    pub async fn run_at(&mut self, started: DateTime<Local>) -> Result<RunReport> {
        let outcome = self.orchestrator.run_at(started).await?;
        let metrics = MetricSet::from_series(&outcome.series);

        self.history.append(&outcome.run_id, &metrics)?;
        info!("Saved run {} to history", outcome.run_id);

        Ok(RunReport {
            run_id: outcome.run_id,
            session_dir: outcome.session_dir,
            frame_count: outcome.series.len(),
            metrics,
        })
    }
}
