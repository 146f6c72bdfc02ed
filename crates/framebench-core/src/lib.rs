pub mod config;
pub mod error;
pub mod frametime;
pub mod history;
pub mod metrics;
pub mod stats;
pub mod subject;

pub use config::{BenchConfig, LiblavaConfig, PathsConfig, SettingsConfig};
pub use error::{FrameBenchError, Result};
pub use frametime::{FrameTimeSeries, FRAME_TIME_COLUMN};
pub use history::{HistoryRecord, RUN_ID_FORMAT};
pub use metrics::{round2, Metric, MetricSet, FRACTIONS};
pub use stats::Fps;
pub use subject::Subject;
