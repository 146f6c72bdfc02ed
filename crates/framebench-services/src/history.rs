use std::io::{self, Write};
use std::path::{Path, PathBuf};

use framebench_benchmark::BenchPaths;
use framebench_core::{HistoryRecord, MetricSet};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, HistoryError>;

/// Per-run metrics in a JSON file, plus ownership of the raw capture artifacts.
///
/// Writes go to a temporary file beside the store and are renamed over it, so a
/// crash mid-write leaves the previously committed history intact.
pub struct HistoryStore {
    path: PathBuf,
    captures_dir: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>, captures_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            captures_dir: captures_dir.into(),
        }
    }

    pub fn from_paths(paths: &BenchPaths) -> Self {
        Self::new(paths.history_file(), paths.captures_dir())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing store is an empty history.
    pub fn load(&self) -> Result<HistoryRecord> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HistoryRecord::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    /// Stores `metrics` rounded to two decimals under `run_id`.
    #[instrument(skip(self, metrics))]
    pub fn append(&self, run_id: &str, metrics: &MetricSet) -> Result<()> {
        let mut record = self.load()?;
        if record.insert(run_id.to_string(), metrics.rounded()).is_some() {
            info!("Overwriting existing history entry {}", run_id);
        }
        self.write(&record)?;
        debug!("History now holds {} run(s)", record.len());
        Ok(())
    }

    /// Deletes the store and every session directory. Safe to call when already empty.
    #[instrument(skip(self))]
    pub fn clear(&self) -> Result<()> {
        remove_if_present(std::fs::remove_file(&self.path))?;
        remove_if_present(std::fs::remove_dir_all(&self.captures_dir))?;
        info!("History and captures cleared");
        Ok(())
    }

    fn write(&self, record: &HistoryRecord) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, record)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

fn remove_if_present(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
