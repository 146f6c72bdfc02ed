//! Command-line contracts of the subject and the PresentMon capture tool.

use std::path::Path;

use framebench_core::{LiblavaConfig, Subject};

/// Session subdirectory holding the capture CSV.
pub const CSV_DIR: &str = "CSVs";
pub const CAPTURE_FILE: &str = "benchmark.csv";

/// Launch flags for `subject`. Empty for subjects that take none.
pub fn subject_args(subject: Subject, liblava: &LiblavaConfig) -> Vec<String> {
    if !subject.accepts_launch_flags() {
        return Vec::new();
    }

    vec![
        format!("--fullscreen={}", u8::from(liblava.fullscreen)),
        format!("--width={}", liblava.x_resolution),
        format!("--height={}", liblava.y_resolution),
        format!("--fps_cap={}", liblava.fps_cap),
        format!("--triple_buffering={}", u8::from(liblava.triple_buffering)),
    ]
}

/// Flags for a self-terminating capture of `process_name` into `output`.
pub fn capture_args(benchmark_secs: u64, process_name: &str, output: &Path) -> Vec<String> {
    vec![
        "-stop_existing_session".to_string(),
        "-no_top".to_string(),
        "-timed".to_string(),
        benchmark_secs.to_string(),
        "-process_name".to_string(),
        process_name.to_string(),
        "-output_file".to_string(),
        output.display().to_string(),
        "-terminate_after_timed".to_string(),
    ]
}

/// Executable file name used to find a running program.
pub fn process_name(binary: &Path) -> String {
    binary
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| binary.display().to_string())
}
