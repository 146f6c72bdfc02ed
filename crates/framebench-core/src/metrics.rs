use serde::{Deserialize, Serialize};

use crate::stats::Fps;
use crate::FrameTimeSeries;

/// Fractions, in percent, reported for percentile and low FPS.
pub const FRACTIONS: [f64; 4] = [1.0, 0.1, 0.01, 0.005];

/// Derived metrics of one run. `percentile` and `lows` are indexed like [`FRACTIONS`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredMetrics", into = "StoredMetrics")]
pub struct MetricSet {
    pub maximum: f64,
    pub average: f64,
    pub minimum: f64,
    pub stdev: f64,
    pub percentile: [f64; 4],
    pub lows: [f64; 4],
}

impl MetricSet {
    pub fn from_series(series: &FrameTimeSeries) -> Self {
        Fps::new(series).metrics()
    }

    /// Copy with every value rounded to two decimals, the precision kept in history.
    pub fn rounded(&self) -> Self {
        Self {
            maximum: round2(self.maximum),
            average: round2(self.average),
            minimum: round2(self.minimum),
            stdev: round2(self.stdev),
            percentile: self.percentile.map(round2),
            lows: self.lows.map(round2),
        }
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Maximum => self.maximum,
            Metric::Average => self.average,
            Metric::Minimum => self.minimum,
            Metric::Stdev => self.stdev,
            Metric::Percentile(i) => self.percentile[i],
            Metric::Lows(i) => self.lows[i],
        }
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One reported column. The index of `Percentile`/`Lows` points into [`FRACTIONS`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    Maximum,
    Average,
    Minimum,
    Stdev,
    Percentile(usize),
    Lows(usize),
}

impl Metric {
    pub fn all() -> Vec<Metric> {
        let mut metrics = vec![Metric::Maximum, Metric::Average, Metric::Minimum, Metric::Stdev];
        metrics.extend((0..FRACTIONS.len()).map(Metric::Percentile));
        metrics.extend((0..FRACTIONS.len()).map(Metric::Lows));
        metrics
    }

    pub fn label(&self) -> String {
        match self {
            Metric::Maximum => "Max".to_string(),
            Metric::Average => "Avg".to_string(),
            Metric::Minimum => "Min".to_string(),
            Metric::Stdev => "STDEV".to_string(),
            Metric::Percentile(i) => format!("{} %ile", FRACTIONS[*i]),
            Metric::Lows(i) => format!("{}% Low", FRACTIONS[*i]),
        }
    }

    /// Variance is the only column where smaller is better.
    pub fn higher_is_better(&self) -> bool {
        !matches!(self, Metric::Stdev)
    }
}

// On-disk shape: one flat object per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredMetrics {
    maximum: f64,
    average: f64,
    minimum: f64,
    stdev: f64,
    #[serde(rename = "percentile1")]
    percentile_1: f64,
    #[serde(rename = "percentile0.1")]
    percentile_0_1: f64,
    #[serde(rename = "percentile0.01")]
    percentile_0_01: f64,
    #[serde(rename = "percentile0.005")]
    percentile_0_005: f64,
    #[serde(rename = "lows1")]
    lows_1: f64,
    #[serde(rename = "lows0.1")]
    lows_0_1: f64,
    #[serde(rename = "lows0.01")]
    lows_0_01: f64,
    #[serde(rename = "lows0.005")]
    lows_0_005: f64,
}

impl From<MetricSet> for StoredMetrics {
    fn from(m: MetricSet) -> Self {
        let [percentile_1, percentile_0_1, percentile_0_01, percentile_0_005] = m.percentile;
        let [lows_1, lows_0_1, lows_0_01, lows_0_005] = m.lows;
        Self {
            maximum: m.maximum,
            average: m.average,
            minimum: m.minimum,
            stdev: m.stdev,
            percentile_1,
            percentile_0_1,
            percentile_0_01,
            percentile_0_005,
            lows_1,
            lows_0_1,
            lows_0_01,
            lows_0_005,
        }
    }
}

impl From<StoredMetrics> for MetricSet {
    fn from(s: StoredMetrics) -> Self {
        Self {
            maximum: s.maximum,
            average: s.average,
            minimum: s.minimum,
            stdev: s.stdev,
            percentile: [s.percentile_1, s.percentile_0_1, s.percentile_0_01, s.percentile_0_005],
            lows: [s.lows_1, s.lows_0_1, s.lows_0_01, s.lows_0_005],
        }
    }
}
