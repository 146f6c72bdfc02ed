//! Inter-frame gap series and the capture CSV reader that produces it.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::{FrameBenchError, Result};

/// Capture column holding the gap between presents, in milliseconds.
pub const FRAME_TIME_COLUMN: &str = "msBetweenPresents";

/// Ordered frame times in milliseconds. Always non-empty, every sample positive and finite.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTimeSeries {
    frame_times_ms: Vec<f64>,
}

impl FrameTimeSeries {
    /// Rejects empty input and any sample that would turn into an infinite or NaN FPS.
    pub fn new(frame_times_ms: Vec<f64>) -> Result<Self> {
        if frame_times_ms.is_empty() {
            return Err(FrameBenchError::EmptySeries);
        }

        if let Some((index, &value)) = frame_times_ms
            .iter()
            .enumerate()
            .find(|(_, t)| !t.is_finite() || **t <= 0.0)
        {
            return Err(FrameBenchError::InvalidFrameTime { index, value });
        }

        Ok(Self { frame_times_ms })
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_csv_reader(BufReader::new(file))
    }

    /// Reads the `msBetweenPresents` column (any casing) and ignores every other column.
    /// Rows with a blank value are skipped.
    pub fn from_csv_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader.lines().enumerate();

        let column = loop {
            let Some((_, line)) = lines.next() else {
                return Err(FrameBenchError::MissingColumn(FRAME_TIME_COLUMN.to_string()));
            };
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            break split_fields(&line)
                .iter()
                .position(|h| h.eq_ignore_ascii_case(FRAME_TIME_COLUMN))
                .ok_or_else(|| FrameBenchError::MissingColumn(FRAME_TIME_COLUMN.to_string()))?;
        };

        let mut frame_times = Vec::new();
        for (i, line) in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let fields = split_fields(&line);
            let Some(raw) = fields.get(column).filter(|v| !v.is_empty()) else {
                continue;
            };

            let value = raw.parse::<f64>().map_err(|e| FrameBenchError::Csv {
                line: i + 1,
                message: format!("'{}' is not a number: {}", raw, e),
            })?;
            frame_times.push(value);
        }

        Self::new(frame_times)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.frame_times_ms
    }

    pub fn len(&self) -> usize {
        self.frame_times_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame_times_ms.is_empty()
    }

    /// Per-frame FPS values, in capture order.
    pub fn fps(&self) -> impl Iterator<Item = f64> + '_ {
        self.frame_times_ms.iter().map(|t| 1000.0 / t)
    }

    /// Frame times sorted slowest first.
    pub fn sorted_descending(&self) -> Vec<f64> {
        let mut sorted = self.frame_times_ms.clone();
        sorted.sort_by(|a, b| b.total_cmp(a));
        sorted
    }
}

// Splits one CSV record, honouring double-quoted fields.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(csv: &str) -> Result<FrameTimeSeries> {
        FrameTimeSeries::from_csv_reader(csv.as_bytes())
    }

    #[test]
    fn test_rejects_zero_frame_time() {
        let err = FrameTimeSeries::new(vec![10.0, 0.0, 12.0]).unwrap_err();
        assert!(matches!(err, FrameBenchError::InvalidFrameTime { index: 1, value } if value == 0.0));
        assert!(err.is_domain());
    }

    #[test]
    fn test_rejects_negative_and_nan() {
        assert!(matches!(
            FrameTimeSeries::new(vec![-1.0]),
            Err(FrameBenchError::InvalidFrameTime { index: 0, .. })
        ));
        assert!(matches!(
            FrameTimeSeries::new(vec![5.0, f64::NAN]),
            Err(FrameBenchError::InvalidFrameTime { index: 1, .. })
        ));
        assert!(matches!(
            FrameTimeSeries::new(vec![f64::INFINITY]),
            Err(FrameBenchError::InvalidFrameTime { .. })
        ));
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(FrameTimeSeries::new(vec![]), Err(FrameBenchError::EmptySeries)));
        assert!(matches!(parse("msBetweenPresents\n"), Err(FrameBenchError::EmptySeries)));
    }

    #[test]
    fn test_column_is_case_insensitive_and_others_ignored() {
        let csv = "Application,ProcessID,MsBetweenPresents,msInPresentAPI\n\
                   lava-triangle.exe,42,10.0,0.5\n\
                   lava-triangle.exe,42,20.5,0.4\n";
        let series = parse(csv).unwrap();
        assert_eq!(series.as_slice(), &[10.0, 20.5]);
    }

    #[test]
    fn test_quoted_fields_and_blank_values() {
        let csv = "\"Application\",\"msbetweenpresents\"\n\
                   \"a, b.exe\",\"16.6\"\n\
                   x.exe,\n\
                   \n\
                   y.exe,8\n";
        let series = parse(csv).unwrap();
        assert_eq!(series.as_slice(), &[16.6, 8.0]);
    }

    #[test]
    fn test_missing_column() {
        let err = parse("Application,msInPresentAPI\nfoo,1.0\n").unwrap_err();
        assert!(matches!(err, FrameBenchError::MissingColumn(_)));
        assert!(matches!(parse(""), Err(FrameBenchError::MissingColumn(_))));
    }

    #[test]
    fn test_unparseable_value_reports_line() {
        let err = parse("msBetweenPresents\n10\nabc\n").unwrap_err();
        assert!(matches!(err, FrameBenchError::Csv { line: 3, .. }));
    }

    #[test]
    fn test_zero_in_csv_is_domain_error() {
        let err = parse("msBetweenPresents\n10\n0\n").unwrap_err();
        assert!(err.is_domain());
    }

    #[test]
    fn test_sorted_descending() {
        let series = FrameTimeSeries::new(vec![10.0, 30.0, 20.0]).unwrap();
        assert_eq!(series.sorted_descending(), vec![30.0, 20.0, 10.0]);
    }
}
