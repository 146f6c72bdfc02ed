use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use framebench_core::{BenchConfig, FrameBenchError, FrameTimeSeries, RUN_ID_FORMAT};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::capture::{self, CAPTURE_FILE, CSV_DIR};
use crate::paths::BenchPaths;
use crate::process::ProcessController;
use crate::runner::ExternalRunner;

/// Grace period after launch before the cache window starts counting.
pub const SETTLE_DURATION: Duration = Duration::from_secs(5);

/// Rough allowance for capture tool start-up and shutdown, used for estimates only.
const CAPTURE_OVERHEAD: Duration = Duration::from_secs(5);

const MISSING_CAPTURE_HINT: &str =
    "csv log unsuccessful, this may be due to a missing dependency or windows component";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("Capture failed: {0}")]
    Capture(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    SubjectLaunched,
    CacheWarmup,
    Capturing,
    CaptureComplete,
    Validated,
    Done,
    Failed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::SubjectLaunched => "subject_launched",
            SessionState::CacheWarmup => "cache_warmup",
            SessionState::Capturing => "capturing",
            SessionState::CaptureComplete => "capture_complete",
            SessionState::Validated => "validated",
            SessionState::Done => "done",
            SessionState::Failed => "failed",
        }
    }
}

/// A completed capture, ready for metric derivation.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub run_id: String,
    pub session_dir: PathBuf,
    pub capture_csv: PathBuf,
    pub series: FrameTimeSeries,
}

/// Drives one benchmark run at a time: stale-process cleanup, subject launch,
/// warmup, timed capture and output validation.
pub struct SessionOrchestrator<R, P> {
    config: BenchConfig,
    paths: BenchPaths,
    runner: R,
    processes: P,
    settle: Duration,
    state: SessionState,
    transitions: Vec<SessionState>,
}

impl<R: ExternalRunner, P: ProcessController> SessionOrchestrator<R, P> {
    /// Fails with [`SessionError::Config`] before anything is spawned if the config is invalid.
    pub fn new(config: BenchConfig, paths: BenchPaths, runner: R, processes: P) -> Result<Self> {
        config.validate().map_err(|e| match e {
            FrameBenchError::Config(msg) => SessionError::Config(msg),
            other => SessionError::Config(other.to_string()),
        })?;

        Ok(Self {
            config,
            paths,
            runner,
            processes,
            settle: SETTLE_DURATION,
            state: SessionState::Idle,
            transitions: vec![SessionState::Idle],
        })
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// States visited by the latest run, starting with `Idle`.
    pub fn transitions(&self) -> &[SessionState] {
        &self.transitions
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn processes(&self) -> &P {
        &self.processes
    }

    pub fn subject_binary(&self) -> PathBuf {
        self.paths
            .resolve(self.config.paths.subject_binary(self.config.settings.subject))
    }

    pub fn capture_tool_binary(&self) -> PathBuf {
        self.paths.resolve(&self.config.paths.capture_tool)
    }

    /// Wall time a run is expected to take.
    pub fn estimated_duration(&self) -> Duration {
        self.settle + self.cache_duration() + self.benchmark_duration() + CAPTURE_OVERHEAD
    }

    // Durations are validated non-negative in `new`.
    fn cache_duration(&self) -> Duration {
        Duration::from_secs(self.config.settings.cache_duration.max(0) as u64)
    }

    fn benchmark_duration(&self) -> Duration {
        Duration::from_secs(self.config.settings.benchmark_duration.max(0) as u64)
    }

    pub async fn run(&mut self) -> Result<SessionOutcome> {
        self.run_at(Local::now()).await
    }

    /// Runs a session whose run id and directory name derive from `started`.
    ///
    /// A second run within the same second gets a `-N` suffix on both its
    /// directory and its run id.
    #[instrument(skip(self), fields(subject = ?self.config.settings.subject))]
    pub async fn run_at(&mut self, started: DateTime<Local>) -> Result<SessionOutcome> {
        self.state = SessionState::Idle;
        self.transitions = vec![SessionState::Idle];

        let (session_dir, suffix) = match allocate_session_dir(&self.paths.captures_dir(), started) {
            Ok(allocated) => allocated,
            Err(e) => {
                error!("Could not create a session directory: {}", e);
                self.advance(SessionState::Failed);
                return Err(e);
            }
        };
        let run_id = match suffix {
            0 => started.format(RUN_ID_FORMAT).to_string(),
            n => format!("{}-{}", started.format(RUN_ID_FORMAT), n),
        };
        info!("Session directory {}", session_dir.display());

        match self.drive(&session_dir).await {
            Ok((capture_csv, series)) => {
                self.advance(SessionState::Done);
                info!("Captured {} frames into {}", series.len(), capture_csv.display());
                Ok(SessionOutcome {
                    run_id,
                    session_dir,
                    capture_csv,
                    series,
                })
            }
            Err(e) => {
                error!("Benchmark session failed: {}", e);
                self.advance(SessionState::Failed);
                let killed = self.processes.kill_named(&self.targets());
                if killed > 0 {
                    info!("Stopped {} leftover process(es)", killed);
                }
                if let Err(rm) = std::fs::remove_dir_all(&session_dir) {
                    warn!("Failed to remove session directory {}: {}", session_dir.display(), rm);
                }
                Err(e)
            }
        }
    }

    /// Process names of the subject and the capture tool.
    fn targets(&self) -> [String; 2] {
        [
            capture::process_name(&self.subject_binary()),
            capture::process_name(&self.capture_tool_binary()),
        ]
    }

    async fn drive(&mut self, session_dir: &Path) -> Result<(PathBuf, FrameTimeSeries)> {
        let subject_bin = self.subject_binary();
        let tool_bin = self.capture_tool_binary();
        let targets = self.targets();

        let stale = self.processes.kill_named(&targets);
        if stale > 0 {
            info!("Killed {} stale process(es)", stale);
        }

        let subject_args = capture::subject_args(self.config.settings.subject, &self.config.liblava);
        self.runner
            .launch(&subject_bin, &subject_args)
            .await
            .map_err(|source| SessionError::Launch {
                program: subject_bin.display().to_string(),
                source,
            })?;
        self.advance(SessionState::SubjectLaunched);

        let warmup = self.settle + self.cache_duration();
        self.advance(SessionState::CacheWarmup);
        debug!("Warming up for {:?}", warmup);
        tokio::time::sleep(warmup).await;

        let capture_csv = session_dir.join(CSV_DIR).join(CAPTURE_FILE);
        let benchmark = self.benchmark_duration();
        let capture_args = capture::capture_args(benchmark.as_secs(), &targets[0], &capture_csv);
        self.advance(SessionState::Capturing);

        let exit = self
            .runner
            .run_timed(&tool_bin, &capture_args, benchmark)
            .await
            .map_err(|e| {
                SessionError::Capture(format!("could not run {}: {}", tool_bin.display(), e))
            })?;
        if !exit.success() {
            warn!("Capture tool exited with {:?}", exit.code);
        }
        self.advance(SessionState::CaptureComplete);

        if !capture_csv.exists() {
            return Err(SessionError::Capture(MISSING_CAPTURE_HINT.to_string()));
        }
        let series = FrameTimeSeries::from_csv_path(&capture_csv).map_err(|e| {
            SessionError::Capture(format!("{} is unusable: {}", capture_csv.display(), e))
        })?;
        self.advance(SessionState::Validated);

        self.processes.kill_named(&targets);

        Ok((capture_csv, series))
    }

    fn advance(&mut self, next: SessionState) {
        info!("Session {} -> {}", self.state.as_str(), next.as_str());
        self.state = next;
        self.transitions.push(next);
    }
}

/// Creates `<captures>/FrameBench-<timestamp>[-N]/CSVs`, picking the first free
/// name. Returns the directory and `N` (0 when unsuffixed).
fn allocate_session_dir(captures_dir: &Path, started: DateTime<Local>) -> Result<(PathBuf, u32)> {
    std::fs::create_dir_all(captures_dir)?;
    let base = format!("FrameBench-{}", started.format("%Y%m%d-%H%M%S"));

    let mut suffix = 0u32;
    loop {
        let name = match suffix {
            0 => base.clone(),
            n => format!("{}-{}", base, n),
        };
        let dir = captures_dir.join(name);

        match std::fs::create_dir(&dir) {
            Ok(()) => {
                if let Err(e) = std::fs::create_dir(dir.join(CSV_DIR)) {
                    let _ = std::fs::remove_dir_all(&dir);
                    return Err(e.into());
                }
                return Ok((dir, suffix));
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => suffix += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CaptureBehavior, FakeProcesses, FakeRunner};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn config(cache: i64, benchmark: i64) -> BenchConfig {
        let mut config = BenchConfig::default();
        config.settings.cache_duration = cache;
        config.settings.benchmark_duration = benchmark;
        config.settings.skip_confirmation = true;
        config
    }

    fn started() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    fn orchestrator<R: ExternalRunner>(
        root: &TempDir,
        runner: R,
        processes: FakeProcesses,
    ) -> SessionOrchestrator<R, FakeProcesses> {
        SessionOrchestrator::new(config(0, 5), BenchPaths::new(root.path()), runner, processes)
            .unwrap()
            .with_settle(Duration::ZERO)
    }

    fn session_dirs(root: &TempDir) -> Vec<PathBuf> {
        match std::fs::read_dir(root.path().join("captures")) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_missing_output_fails_and_cleans_up() {
        let root = TempDir::new().unwrap();
        let mut orch = orchestrator(&root, FakeRunner::new(CaptureBehavior::NoOutput), FakeProcesses::new());

        let err = orch.run_at(started()).await.unwrap_err();

        assert!(matches!(err, SessionError::Capture(ref msg) if msg.contains("missing dependency")));
        assert_eq!(orch.state(), SessionState::Failed);
        assert!(!orch.transitions().contains(&SessionState::Validated));
        assert_eq!(orch.transitions().last(), Some(&SessionState::Failed));
        assert!(session_dirs(&root).is_empty());
        assert_eq!(orch.runner().timed_runs().len(), 1);
    }

    #[tokio::test]
    async fn test_successful_run_walks_every_state() {
        let root = TempDir::new().unwrap();
        let mut orch = orchestrator(
            &root,
            FakeRunner::writing_frames(&[10.0, 10.0, 10.0, 20.0]),
            FakeProcesses::new(),
        );

        let outcome = orch.run_at(started()).await.unwrap();

        assert_eq!(
            orch.transitions(),
            &[
                SessionState::Idle,
                SessionState::SubjectLaunched,
                SessionState::CacheWarmup,
                SessionState::Capturing,
                SessionState::CaptureComplete,
                SessionState::Validated,
                SessionState::Done,
            ]
        );
        assert_eq!(outcome.run_id, "2026-03-14 09:26:53");
        assert_eq!(outcome.series.as_slice(), &[10.0, 10.0, 10.0, 20.0]);
        assert!(outcome.capture_csv.exists());
        assert_eq!(
            outcome.session_dir,
            root.path().join("captures").join("FrameBench-20260314-092653")
        );
        assert_eq!(outcome.capture_csv, outcome.session_dir.join("CSVs").join("benchmark.csv"));
    }

    #[tokio::test]
    async fn test_launch_and_capture_arguments() {
        let root = TempDir::new().unwrap();
        let mut orch = orchestrator(&root, FakeRunner::writing_frames(&[16.0]), FakeProcesses::new());
        let outcome = orch.run_at(started()).await.unwrap();

        let launches = orch.runner().launches();
        assert_eq!(launches.len(), 1);
        assert_eq!(launches[0].program, root.path().join("bin/liblava/lava-triangle.exe"));
        assert!(launches[0].args.contains(&"--width=1280".to_string()));

        let timed = orch.runner().timed_runs();
        assert_eq!(timed.len(), 1);
        let (call, duration) = &timed[0];
        assert_eq!(*duration, Duration::from_secs(5));
        assert_eq!(call.program, root.path().join("bin/PresentMon/PresentMon-1.10.0-x64.exe"));
        assert_eq!(
            call.args,
            capture::capture_args(5, "lava-triangle.exe", &outcome.capture_csv)
        );
    }

    #[tokio::test]
    async fn test_stale_processes_killed_before_and_after() {
        let root = TempDir::new().unwrap();
        let processes = FakeProcesses::with_running(&["LAVA-TRIANGLE.EXE", "explorer.exe", "PresentMon-1.10.0-x64.exe"]);
        let runner = FakeRunner::writing_frames(&[16.0, 17.0]).spawning_into(&processes);
        let mut orch = orchestrator(&root, runner, processes.clone());

        orch.run_at(started()).await.unwrap();

        let killed: Vec<String> = processes.killed().into_iter().map(|p| p.name).collect();
        assert_eq!(
            killed,
            vec!["LAVA-TRIANGLE.EXE", "PresentMon-1.10.0-x64.exe", "lava-triangle.exe"]
        );
        let remaining: Vec<String> = processes.list().into_iter().map(|p| p.name).collect();
        assert_eq!(remaining, vec!["explorer.exe"]);
    }

    #[tokio::test]
    async fn test_validated_run_stops_launched_subject() {
        let root = TempDir::new().unwrap();
        let processes = FakeProcesses::new();
        let runner = FakeRunner::writing_frames(&[16.0]).spawning_into(&processes);
        let mut orch = orchestrator(&root, runner, processes.clone());

        orch.run_at(started()).await.unwrap();

        let killed = processes.killed();
        assert_eq!(killed.len(), 1);
        assert_eq!(killed[0].name, "lava-triangle.exe");
        assert!(processes.list().is_empty());
        assert!(orch.transitions().contains(&SessionState::Validated));
    }

    #[tokio::test]
    async fn test_failed_run_stops_launched_subject() {
        let root = TempDir::new().unwrap();
        let processes = FakeProcesses::new();
        let runner = FakeRunner::new(CaptureBehavior::NoOutput).spawning_into(&processes);
        let mut orch = orchestrator(&root, runner, processes.clone());

        orch.run_at(started()).await.unwrap_err();

        assert_eq!(orch.state(), SessionState::Failed);
        assert!(processes.list().is_empty());
        let killed: Vec<String> = processes.killed().into_iter().map(|p| p.name).collect();
        assert_eq!(killed, vec!["lava-triangle.exe"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_starts_after_settle_and_cache() {
        let root = TempDir::new().unwrap();
        let mut orch = SessionOrchestrator::new(
            config(30, 5),
            BenchPaths::new(root.path()),
            FakeRunner::writing_frames(&[16.0]),
            FakeProcesses::new(),
        )
        .unwrap()
        .with_settle(Duration::from_secs(5));

        orch.run_at(started()).await.unwrap();

        let launched = orch.runner().launches()[0].at;
        let timed = orch.runner().timed_runs();
        let waited = timed[0].0.at.duration_since(launched);
        assert!(waited >= Duration::from_secs(35), "waited {:?}", waited);
        assert!(waited < Duration::from_secs(36), "waited {:?}", waited);
    }

    #[tokio::test]
    async fn test_unusable_captures_dir_fails_before_launch() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("captures"), "not a directory").unwrap();
        let mut orch = orchestrator(&root, FakeRunner::writing_frames(&[16.0]), FakeProcesses::new());

        let err = orch.run_at(started()).await.unwrap_err();

        assert!(matches!(err, SessionError::Io(_)));
        assert_eq!(orch.transitions(), &[SessionState::Idle, SessionState::Failed]);
        assert!(orch.runner().launches().is_empty());
    }

    #[tokio::test]
    async fn test_launch_failure_is_fatal() {
        let root = TempDir::new().unwrap();
        let runner = FakeRunner::writing_frames(&[16.0]).failing_launch();
        let mut orch = orchestrator(&root, runner, FakeProcesses::new());

        let err = orch.run_at(started()).await.unwrap_err();

        assert!(matches!(err, SessionError::Launch { .. }));
        assert_eq!(orch.transitions(), &[SessionState::Idle, SessionState::Failed]);
        assert!(orch.runner().timed_runs().is_empty());
        assert!(session_dirs(&root).is_empty());
    }

    #[tokio::test]
    async fn test_capture_tool_spawn_error() {
        let root = TempDir::new().unwrap();
        let mut orch = orchestrator(&root, FakeRunner::new(CaptureBehavior::SpawnError), FakeProcesses::new());

        let err = orch.run_at(started()).await.unwrap_err();

        assert!(matches!(err, SessionError::Capture(_)));
        assert_eq!(orch.state(), SessionState::Failed);
        assert!(session_dirs(&root).is_empty());
    }

    #[tokio::test]
    async fn test_unusable_capture_is_a_capture_failure() {
        let root = TempDir::new().unwrap();
        let runner = FakeRunner::new(CaptureBehavior::WriteCsv {
            contents: "msBetweenPresents\n10\n0\n".to_string(),
            exit_code: 0,
        });
        let mut orch = orchestrator(&root, runner, FakeProcesses::new());

        let err = orch.run_at(started()).await.unwrap_err();

        assert!(matches!(err, SessionError::Capture(ref msg) if msg.contains("unusable")));
        assert!(session_dirs(&root).is_empty());
    }

    #[tokio::test]
    async fn test_nonzero_exit_with_output_still_succeeds() {
        let root = TempDir::new().unwrap();
        let runner = FakeRunner::new(CaptureBehavior::WriteCsv {
            contents: "msBetweenPresents\n8.3\n".to_string(),
            exit_code: 3,
        });
        let mut orch = orchestrator(&root, runner, FakeProcesses::new());

        assert!(orch.run_at(started()).await.is_ok());
        assert_eq!(orch.state(), SessionState::Done);
    }

    #[tokio::test]
    async fn test_same_timestamp_gets_new_directory() {
        let root = TempDir::new().unwrap();
        let mut orch = orchestrator(&root, FakeRunner::writing_frames(&[16.0]), FakeProcesses::new());

        let first = orch.run_at(started()).await.unwrap();
        let second = orch.run_at(started()).await.unwrap();

        assert_ne!(first.session_dir, second.session_dir);
        assert!(second.session_dir.ends_with("FrameBench-20260314-092653-1"));
        assert_eq!(first.run_id, "2026-03-14 09:26:53");
        assert_eq!(second.run_id, "2026-03-14 09:26:53-1");
        assert_eq!(session_dirs(&root).len(), 2);
    }

    #[test]
    fn test_invalid_config_rejected_before_spawn() {
        let root = TempDir::new().unwrap();
        let result = SessionOrchestrator::new(
            config(-1, 5),
            BenchPaths::new(root.path()),
            FakeRunner::new(CaptureBehavior::NoOutput),
            FakeProcesses::new(),
        );
        assert!(matches!(result, Err(SessionError::Config(_))));

        let result = SessionOrchestrator::new(
            config(0, 0),
            BenchPaths::new(root.path()),
            FakeRunner::new(CaptureBehavior::NoOutput),
            FakeProcesses::new(),
        );
        assert!(matches!(result, Err(SessionError::Config(_))));
        assert!(session_dirs(&root).is_empty());
    }

    #[test]
    fn test_estimated_duration() {
        let root = TempDir::new().unwrap();
        let orch = SessionOrchestrator::new(
            config(30, 60),
            BenchPaths::new(root.path()),
            FakeRunner::new(CaptureBehavior::NoOutput),
            FakeProcesses::new(),
        )
        .unwrap();
        assert_eq!(orch.estimated_duration(), Duration::from_secs(100));
    }
}
