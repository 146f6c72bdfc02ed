//! Frame-time statistics.
//!
//! Every figure is reported in FPS (`1000 / frame_time_ms`) and aggregates are taken
//! over per-frame FPS values. Percentiles use linear interpolation between ranks;
//! lows average the FPS of the slowest slice of frames by count.

use crate::{FrameTimeSeries, MetricSet, FRACTIONS};

pub struct Fps<'a> {
    series: &'a FrameTimeSeries,
    /// Frame times, slowest first.
    sorted: Vec<f64>,
}

impl<'a> Fps<'a> {
    pub fn new(series: &'a FrameTimeSeries) -> Self {
        Self {
            series,
            sorted: series.sorted_descending(),
        }
    }

    /// FPS of the fastest frame.
    pub fn maximum(&self) -> f64 {
        1000.0 / self.sorted[self.sorted.len() - 1]
    }

    /// FPS of the slowest frame.
    pub fn minimum(&self) -> f64 {
        1000.0 / self.sorted[0]
    }

    /// Mean of per-frame FPS, not `1000 / mean(frame_time)`.
    pub fn average(&self) -> f64 {
        self.series.fps().sum::<f64>() / self.series.len() as f64
    }

    /// Population standard deviation of per-frame FPS. Never negative.
    pub fn stdev(&self) -> f64 {
        let mean = self.average();
        let variance = self
            .series
            .fps()
            .map(|fps| (fps - mean).powi(2))
            .sum::<f64>()
            / self.series.len() as f64;
        variance.sqrt()
    }

    /// FPS at the `p`-th percentile of the FPS distribution, `p` in percent.
    ///
    /// Equivalent to the `(100 - p)`-th percentile of frame times, interpolated
    /// linearly between the two nearest ranks.
    pub fn percentile(&self, p: f64) -> f64 {
        let p = p.clamp(0.0, 100.0);
        let rank = p / 100.0 * (self.sorted.len() - 1) as f64;
        let lo = rank.floor() as usize;
        let hi = rank.ceil() as usize;
        let frame_time = self.sorted[lo] + (self.sorted[hi] - self.sorted[lo]) * (rank - lo as f64);
        1000.0 / frame_time
    }

    /// Average FPS over the slowest `p` percent of frames ("p% low").
    ///
    /// The slice always holds at least one frame.
    pub fn lows(&self, p: f64) -> f64 {
        let n = self.sorted.len();
        let p = p.clamp(0.0, 100.0);
        let count = ((p / 100.0 * n as f64 - 1e-9).ceil() as usize).clamp(1, n);
        let slice = &self.sorted[..count];
        slice.iter().map(|t| 1000.0 / t).sum::<f64>() / count as f64
    }

    pub fn metrics(&self) -> MetricSet {
        MetricSet {
            maximum: self.maximum(),
            average: self.average(),
            minimum: self.minimum(),
            stdev: self.stdev(),
            percentile: FRACTIONS.map(|f| self.percentile(f)),
            lows: FRACTIONS.map(|f| self.lows(f)),
        }
    }
}
