use sysinfo::System;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    pub pid: u32,
    pub name: String,
}

/// OS process discovery and termination.
///
/// Killing is best-effort: no matching process is not an error.
pub trait ProcessController: Send + Sync {
    fn list(&self) -> Vec<ProcessHandle>;

    /// Kills every process matching `predicate`, returns how many were signalled.
    fn kill(&self, predicate: &dyn Fn(&ProcessHandle) -> bool) -> usize;

    /// Kills processes whose executable name equals one of `names`, ignoring case.
    fn kill_named(&self, names: &[String]) -> usize {
        self.kill(&|p: &ProcessHandle| names.iter().any(|n| p.name.eq_ignore_ascii_case(n)))
    }
}

/// Live process table via sysinfo. Refreshed on every call.
#[derive(Debug, Default)]
pub struct SysinfoProcessController;

impl SysinfoProcessController {
    pub fn new() -> Self {
        Self
    }

    fn snapshot() -> System {
        let mut sys = System::new();
        sys.refresh_processes();
        sys
    }
}

impl ProcessController for SysinfoProcessController {
    fn list(&self) -> Vec<ProcessHandle> {
        Self::snapshot()
            .processes()
            .iter()
            .map(|(pid, p)| ProcessHandle {
                pid: pid.as_u32(),
                name: p.name().to_string(),
            })
            .collect()
    }

    #[instrument(skip_all)]
    fn kill(&self, predicate: &dyn Fn(&ProcessHandle) -> bool) -> usize {
        let sys = Self::snapshot();
        let mut killed = 0;

        for (pid, process) in sys.processes() {
            let handle = ProcessHandle {
                pid: pid.as_u32(),
                name: process.name().to_string(),
            };
            if !predicate(&handle) {
                continue;
            }

            if process.kill() {
                debug!("Killed {} (pid {})", handle.name, handle.pid);
                killed += 1;
            } else {
                warn!("Failed to kill {} (pid {})", handle.name, handle.pid);
            }
        }

        killed
    }
}
