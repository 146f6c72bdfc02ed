use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{FrameBenchError, Result, Subject};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub liblava: LiblavaConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

impl BenchConfig {
    /// Read a JSON config file. A missing or malformed file is a config error.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            FrameBenchError::Config(format!("config file not found at path {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&raw).map_err(|e| {
            FrameBenchError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    pub fn validate(&self) -> Result<()> {
        let s = &self.settings;
        if s.cache_duration < 0 || s.benchmark_duration <= 0 {
            return Err(FrameBenchError::Config(format!(
                "invalid durations specified (cache_duration={}, benchmark_duration={})",
                s.cache_duration, s.benchmark_duration
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Seconds the subject runs before capture starts.
    pub cache_duration: i64,
    /// Seconds of frame capture.
    pub benchmark_duration: i64,
    pub subject: Subject,
    #[serde(default)]
    pub skip_confirmation: bool,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            cache_duration: 30,
            benchmark_duration: 30,
            subject: Subject::Liblava,
            skip_confirmation: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiblavaConfig {
    pub fullscreen: bool,
    pub x_resolution: u32,
    pub y_resolution: u32,
    /// 0 disables the cap.
    pub fps_cap: u32,
    pub triple_buffering: bool,
}

impl Default for LiblavaConfig {
    fn default() -> Self {
        Self {
            fullscreen: false,
            x_resolution: 1280,
            y_resolution: 720,
            fps_cap: 0,
            triple_buffering: false,
        }
    }
}

/// Tool locations, relative paths resolve against the benchmark root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub capture_tool: PathBuf,
    pub liblava: PathBuf,
    pub d3d9: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            capture_tool: PathBuf::from("bin/PresentMon/PresentMon-1.10.0-x64.exe"),
            liblava: PathBuf::from("bin/liblava/lava-triangle.exe"),
            d3d9: PathBuf::from("bin/D3D9-benchmark.exe"),
        }
    }
}

impl PathsConfig {
    pub fn subject_binary(&self, subject: Subject) -> &Path {
        match subject {
            Subject::Liblava => &self.liblava,
            Subject::D3d9 => &self.d3d9,
        }
    }
}
