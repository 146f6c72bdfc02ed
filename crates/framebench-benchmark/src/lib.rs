pub mod analysis;
pub mod capture;
pub mod paths;
pub mod process;
pub mod runner;
pub mod session;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use analysis::{analyze_csv, analyze_directory};
pub use paths::BenchPaths;
pub use process::{ProcessController, ProcessHandle, SysinfoProcessController};
pub use runner::{CommandRunner, ExternalRunner, LaunchHandle, ToolExit};
pub use session::{
    SessionError, SessionOrchestrator, SessionOutcome, SessionState, SETTLE_DURATION,
};
