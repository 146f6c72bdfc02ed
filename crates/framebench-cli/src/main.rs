mod report;

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use framebench_benchmark::{
    analyze_directory, BenchPaths, CommandRunner, SessionOrchestrator, SysinfoProcessController,
};
use framebench_core::{BenchConfig, FrameBenchError};
use framebench_services::{BenchmarkService, HistoryStore};
use report::Presenter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "framebench", version)]
#[command(about = "FrameBench - frame-time benchmark automation", long_about = None)]
struct Cli {
    /// Path to the config file (default: config.json in the root directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding bin/, captures/ and history.json (default: the executable's directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Disable coloured ranking in result tables
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a fresh benchmark (default)
    Run,

    /// Analyze the CSV files of a previous benchmark
    Analyze {
        /// Directory containing capture CSVs
        dir: PathBuf,
    },

    /// Show every recorded run
    History,

    /// Delete recorded history and all capture directories
    Clear {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("framebench=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            if let Some(hint) = failure_hint(&e) {
                tracing::error!("{}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let paths = match cli.root {
        Some(root) => BenchPaths::new(root),
        None => BenchPaths::from_current_exe().context("cannot locate the executable directory")?,
    };
    let presenter = Presenter::new(!cli.no_color && io::stdout().is_terminal());

    println!("FrameBench v{}\n", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(Commands::Analyze { dir }) => cmd_analyze(&dir, &presenter),
        Some(Commands::History) => cmd_history(&paths, &presenter),
        Some(Commands::Clear { yes }) => cmd_clear(&paths, yes),
        Some(Commands::Run) | None => cmd_run(&paths, cli.config, &presenter).await,
    }
}

async fn cmd_run(paths: &BenchPaths, config: Option<PathBuf>, presenter: &Presenter) -> Result<()> {
    let config_path = config.unwrap_or_else(|| paths.default_config());
    let config = BenchConfig::load(&config_path)?;
    let skip_confirmation = config.settings.skip_confirmation;

    let orchestrator = SessionOrchestrator::new(
        config,
        paths.clone(),
        CommandRunner::new(paths.root()),
        SysinfoProcessController::new(),
    )?;

    display_plan(paths, &orchestrator);

    if !skip_confirmation {
        wait_for_enter("press enter to start benchmarking...")?;
    }

    let mut service = BenchmarkService::new(orchestrator, HistoryStore::from_paths(paths));
    tracing::info!("Starting benchmark");
    let report = service.run().await?;

    println!();
    println!(
        "Run {} captured {} frames ({})",
        report.run_id,
        report.frame_count,
        report.session_dir.display()
    );
    println!();

    let history = service.history().load()?;
    presenter.print(&history);
    Ok(())
}

fn cmd_analyze(dir: &std::path::Path, presenter: &Presenter) -> Result<()> {
    let results = analyze_directory(dir)
        .with_context(|| format!("failed to analyze {}", dir.display()))?;
    presenter.print(&results);
    Ok(())
}

fn cmd_history(paths: &BenchPaths, presenter: &Presenter) -> Result<()> {
    let history = HistoryStore::from_paths(paths).load()?;
    if history.is_empty() {
        println!("No runs recorded yet.");
        return Ok(());
    }
    presenter.print(&history);
    Ok(())
}

fn cmd_clear(paths: &BenchPaths, yes: bool) -> Result<()> {
    if !yes && !confirm("Delete all recorded runs and captures? (y/N): ")? {
        println!("Nothing deleted.");
        return Ok(());
    }
    HistoryStore::from_paths(paths).clear()?;
    println!("History cleared.");
    Ok(())
}

fn display_plan<R, P>(paths: &BenchPaths, orchestrator: &SessionOrchestrator<R, P>)
where
    R: framebench_benchmark::ExternalRunner,
    P: framebench_benchmark::ProcessController,
{
    let settings = &orchestrator.config().settings;
    let estimated = orchestrator.estimated_duration();
    let finish = chrono::Local::now()
        + chrono::Duration::from_std(estimated).unwrap_or_else(|_| chrono::Duration::zero());

    println!("  {:<24} {}", "Captures Directory", paths.captures_dir().display());
    println!("  {:<24} {}", "Cache Duration", settings.cache_duration);
    println!("  {:<24} {}", "Benchmark Duration", settings.benchmark_duration);
    println!("  {:<24} {}", "Subject", settings.subject.label());
    println!("  {:<24} {}", "Estimated Time", format_duration(estimated));
    println!("  {:<24} {}", "Estimated End Time", finish.format("%H:%M:%S"));
    println!();
}

fn failure_hint(e: &anyhow::Error) -> Option<&'static str> {
    e.downcast_ref::<FrameBenchError>()
        .is_some_and(FrameBenchError::is_domain)
        .then_some("Capture holds no usable frame times, record it again")
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn wait_for_enter(prompt: &str) -> Result<()> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
