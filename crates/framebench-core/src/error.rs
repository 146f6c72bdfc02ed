use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameBenchError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Frame time series is empty")]
    EmptySeries,

    #[error("Invalid frame time {value} at row {index}: frame times must be positive and finite")]
    InvalidFrameTime { index: usize, value: f64 },

    #[error("Column '{0}' not found in capture header")]
    MissingColumn(String),

    #[error("CSV error at line {line}: {message}")]
    Csv { line: usize, message: String },

    #[error("No capture files found in {0}")]
    NoCaptures(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FrameBenchError {
    /// True for errors caused by unusable frame-time input rather than I/O or config.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            FrameBenchError::EmptySeries | FrameBenchError::InvalidFrameTime { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameBenchError>;
