use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Exit status of a blocking tool run. `code` is `None` when killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolExit {
    pub code: Option<i32>,
}

impl ToolExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchHandle {
    pub pid: Option<u32>,
}

/// Starts the external programs a session depends on.
#[async_trait]
pub trait ExternalRunner: Send + Sync {
    /// Starts `program` and returns without waiting for it.
    async fn launch(&self, program: &Path, args: &[String]) -> io::Result<LaunchHandle>;

    /// Runs a tool that stops itself after `duration` and waits for it to exit.
    async fn run_timed(&self, program: &Path, args: &[String], duration: Duration) -> io::Result<ToolExit>;
}

/// Real processes via `tokio::process`, started from `working_dir`.
pub struct CommandRunner {
    working_dir: PathBuf,
}

impl CommandRunner {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }
}

#[async_trait]
impl ExternalRunner for CommandRunner {
    #[instrument(skip(self, args), fields(program = %program.display()))]
    async fn launch(&self, program: &Path, args: &[String]) -> io::Result<LaunchHandle> {
        debug!("Launching with args {:?}", args);

        // Dropping the child leaves it running.
        let child = Command::new(program)
            .args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let pid = child.id();
        info!("Launched {} (pid {:?})", program.display(), pid);
        Ok(LaunchHandle { pid })
    }

    #[instrument(skip(self, args), fields(program = %program.display(), duration_secs = duration.as_secs()))]
    async fn run_timed(&self, program: &Path, args: &[String], duration: Duration) -> io::Result<ToolExit> {
        debug!("Running with args {:?}", args);

        let status = Command::new(program)
            .args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;

        debug!("Exited with {:?}", status.code());
        Ok(ToolExit { code: status.code() })
    }
}
