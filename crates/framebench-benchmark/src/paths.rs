use std::path::{Path, PathBuf};

/// Filesystem layout of a benchmark root, passed around instead of changing directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchPaths {
    root: PathBuf,
}

impl BenchPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory containing the running executable.
    pub fn from_current_exe() -> std::io::Result<Self> {
        let exe = std::env::current_exe()?;
        let root = exe
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parent of every session directory.
    pub fn captures_dir(&self) -> PathBuf {
        self.root.join("captures")
    }

    pub fn history_file(&self) -> PathBuf {
        self.root.join("history.json")
    }

    pub fn default_config(&self) -> PathBuf {
        self.root.join("config.json")
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
