//! In-memory doubles for [`ExternalRunner`] and [`ProcessController`].

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::capture;
use crate::process::{ProcessController, ProcessHandle};
use crate::runner::{ExternalRunner, LaunchHandle, ToolExit};

/// What the fake capture tool does when run.
#[derive(Debug, Clone)]
pub enum CaptureBehavior {
    /// Writes this CSV text to the `-output_file` path and exits with `exit_code`.
    WriteCsv { contents: String, exit_code: i32 },
    /// Exits without producing a file.
    NoOutput,
    /// The binary cannot be started.
    SpawnError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Tokio clock reading when the call was made.
    pub at: Instant,
}

impl RecordedCall {
    fn new(program: &Path, args: &[String]) -> Self {
        Self {
            program: program.to_path_buf(),
            args: args.to_vec(),
            at: Instant::now(),
        }
    }
}

pub struct FakeRunner {
    capture: CaptureBehavior,
    launch_fails: bool,
    processes: Option<FakeProcesses>,
    launches: Mutex<Vec<RecordedCall>>,
    timed_runs: Mutex<Vec<(RecordedCall, Duration)>>,
}

impl FakeRunner {
    pub fn new(capture: CaptureBehavior) -> Self {
        Self {
            capture,
            launch_fails: false,
            processes: None,
            launches: Mutex::new(Vec::new()),
            timed_runs: Mutex::new(Vec::new()),
        }
    }

    /// A capture tool that writes `frame_times_ms` as a PresentMon-style CSV.
    pub fn writing_frames(frame_times_ms: &[f64]) -> Self {
        let mut contents = String::from("Application,ProcessID,MsBetweenPresents\n");
        for t in frame_times_ms {
            contents.push_str(&format!("subject.exe,1234,{t}\n"));
        }
        Self::new(CaptureBehavior::WriteCsv { contents, exit_code: 0 })
    }

    pub fn failing_launch(mut self) -> Self {
        self.launch_fails = true;
        self
    }

    /// Launched subjects show up in `processes` until something kills them.
    pub fn spawning_into(mut self, processes: &FakeProcesses) -> Self {
        self.processes = Some(processes.clone());
        self
    }

    pub fn launches(&self) -> Vec<RecordedCall> {
        self.launches.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn timed_runs(&self) -> Vec<(RecordedCall, Duration)> {
        self.timed_runs.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl ExternalRunner for FakeRunner {
    async fn launch(&self, program: &Path, args: &[String]) -> io::Result<LaunchHandle> {
        self.launches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall::new(program, args));

        if self.launch_fails {
            return Err(io::Error::new(io::ErrorKind::NotFound, "subject binary missing"));
        }
        let pid = match &self.processes {
            Some(processes) => processes.spawn(&capture::process_name(program)),
            None => 4242,
        };
        Ok(LaunchHandle { pid: Some(pid) })
    }

    async fn run_timed(&self, program: &Path, args: &[String], duration: Duration) -> io::Result<ToolExit> {
        self.timed_runs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((RecordedCall::new(program, args), duration));

        match &self.capture {
            CaptureBehavior::WriteCsv { contents, exit_code } => {
                let output = args
                    .iter()
                    .position(|a| a == "-output_file")
                    .and_then(|i| args.get(i + 1))
                    .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no -output_file"))?;
                std::fs::write(output, contents)?;
                Ok(ToolExit { code: Some(*exit_code) })
            }
            CaptureBehavior::NoOutput => Ok(ToolExit { code: Some(0) }),
            CaptureBehavior::SpawnError => {
                Err(io::Error::new(io::ErrorKind::NotFound, "capture tool missing"))
            }
        }
    }
}

/// A process table that records what was killed. Clones share one table.
#[derive(Clone, Default)]
pub struct FakeProcesses {
    table: Arc<Mutex<ProcessTable>>,
}

#[derive(Default)]
struct ProcessTable {
    running: Vec<ProcessHandle>,
    killed: Vec<ProcessHandle>,
    next_pid: u32,
}

impl FakeProcesses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_running(names: &[&str]) -> Self {
        let processes = Self::new();
        for name in names {
            processes.spawn(name);
        }
        processes
    }

    /// Adds a running process and returns its pid.
    pub fn spawn(&self, name: &str) -> u32 {
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        let pid = 100 + table.next_pid;
        table.next_pid += 1;
        table.running.push(ProcessHandle {
            pid,
            name: name.to_string(),
        });
        pid
    }

    pub fn killed(&self) -> Vec<ProcessHandle> {
        self.table.lock().unwrap_or_else(|e| e.into_inner()).killed.clone()
    }
}

impl ProcessController for FakeProcesses {
    fn list(&self) -> Vec<ProcessHandle> {
        self.table.lock().unwrap_or_else(|e| e.into_inner()).running.clone()
    }

    fn kill(&self, predicate: &dyn Fn(&ProcessHandle) -> bool) -> usize {
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        let (matched, kept): (Vec<_>, Vec<_>) = table.running.drain(..).partition(|p| predicate(p));
        table.running = kept;

        let count = matched.len();
        table.killed.extend(matched);
        count
    }
}
