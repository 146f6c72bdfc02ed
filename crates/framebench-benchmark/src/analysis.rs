//! Re-analysis of capture CSVs already on disk.

use std::collections::BTreeMap;
use std::path::Path;

use framebench_core::{FrameBenchError, FrameTimeSeries, MetricSet, Result};
use tracing::{debug, instrument};

pub fn analyze_csv(path: &Path) -> Result<MetricSet> {
    let series = FrameTimeSeries::from_csv_path(path)?;
    debug!("{}: {} frames", path.display(), series.len());
    Ok(MetricSet::from_series(&series))
}

/// Metrics for every `*.csv` directly inside `dir`, keyed by file stem.
#[instrument]
pub fn analyze_directory(dir: &Path) -> Result<BTreeMap<String, MetricSet>> {
    let mut results = BTreeMap::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if !is_csv || !path.is_file() {
            continue;
        }

        let Some(stem) = path.file_stem() else {
            continue;
        };
        results.insert(stem.to_string_lossy().into_owned(), analyze_csv(&path)?);
    }

    if results.is_empty() {
        return Err(FrameBenchError::NoCaptures(dir.display().to_string()));
    }
    Ok(results)
}
