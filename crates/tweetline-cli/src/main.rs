//! tweetline - collect search results into a CSV file
//!
//! Several workers search the same term over staggered date windows; their
//! results are merged, deduplicated and written until the requested number
//! of unique records is reached.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use signal_hook::consts::{SIGINT, SIGTERM};
use tweetline_core::{
    OutputFile, ProgressContext, RunPlan, RunSummary, StopSignal, init_logging, level_for,
};
use tweetline_twitter::{Credentials, TwitterSearch};

mod config;
mod summary;
mod windows;

use config::{Config, Overrides};

const EXIT_RUN_FAILED: u8 = 1;
const EXIT_SETUP: u8 = 2;
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "tweetline")]
#[command(about = "Collect unique search results from concurrent workers into a CSV file")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,

    /// Config file path (default: ./tweetline.toml or ~/.config/tweetline/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let start = Instant::now();
    let cli = Cli::parse();

    let progress = progress_for(cli.quiet);
    let multi = if progress.is_tty() {
        Some(progress.multi())
    } else {
        None
    };
    init_logging(level_for(cli.quiet, cli.verbose), multi);
    log::info!("Starting tweetline");

    let config = match load_config(cli.config.as_deref(), cli.overrides) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Configuration error: {e:#}");
            return ExitCode::from(EXIT_SETUP);
        }
    };

    let stop = StopSignal::new();
    let interrupted = Arc::new(AtomicBool::new(false));
    if let Err(e) = setup_signal_handler(&stop, &interrupted) {
        log::error!("Failed to register signal handlers: {e}");
        return ExitCode::from(EXIT_SETUP);
    }

    let (source, output, file) = match prepare(&config).await {
        Ok(ready) => ready,
        Err(e) => {
            log::error!("Setup failed: {e:#}");
            return ExitCode::from(EXIT_SETUP);
        }
    };

    let outcome = collect(&config, source, output, file, stop, &progress).await;
    log::info!(
        "Total time taken: {:.3} seconds",
        start.elapsed().as_secs_f64()
    );

    match outcome {
        Ok(summary) => {
            let interrupted = interrupted.load(Ordering::Relaxed);
            if progress.is_tty() {
                eprintln!("\n{}", summary::table(&summary, interrupted));
            } else {
                summary::log(&summary, interrupted);
            }
            if interrupted {
                log::warn!("Interrupted, kept {} records", summary.sink.written);
                ExitCode::from(EXIT_INTERRUPTED)
            } else {
                log::info!("Completed");
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::from(EXIT_RUN_FAILED)
        }
    }
}

/// `-q` also hides the progress bar
fn progress_for(quiet: bool) -> ProgressContext {
    if quiet {
        ProgressContext::hidden()
    } else {
        ProgressContext::new()
    }
}

fn load_config(path: Option<&Path>, overrides: Overrides) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    let config = config.with_overrides(overrides)?;

    log::info!("Looking for term: {}", config.search.term);
    log::info!("Looking for record count: {}", config.search.count);
    log::info!("Writing records to: {}", config.output.file.display());
    log::info!("Number of workers to start: {}", config.search.workers);
    log::info!("Batch size for API call: {}", config.search.batch);
    Ok(config)
}

/// First signal: raise the stop flag so the run drains and commits.
/// Second signal: exit immediately.
fn setup_signal_handler(stop: &StopSignal, interrupted: &Arc<AtomicBool>) -> std::io::Result<()> {
    for sig in [SIGINT, SIGTERM] {
        signal_hook::flag::register_conditional_shutdown(
            sig,
            i32::from(EXIT_INTERRUPTED),
            interrupted.clone(),
        )?;
        signal_hook::flag::register(sig, interrupted.clone())?;
        signal_hook::flag::register(sig, stop.as_flag())?;
    }
    Ok(())
}

/// Authenticate and open the output; any failure here is a setup error
async fn prepare(config: &Config) -> Result<(Arc<TwitterSearch>, OutputFile, tokio::fs::File)> {
    let creds = Credentials::resolve(
        config.credentials.consumer_key.clone(),
        config.credentials.consumer_secret.clone(),
        &config.credentials.file,
    )?;
    let source = TwitterSearch::connect(&creds, &config.client_config())
        .await
        .context("Authentication failed")?;

    let (output, file) = OutputFile::create(&config.output.file)
        .await
        .with_context(|| format!("Cannot create {}", config.output.file.display()))?;
    log::debug!("Writing to {}", output.tmp_path().display());

    Ok((Arc::new(source), output, file))
}

async fn collect(
    config: &Config,
    source: Arc<TwitterSearch>,
    output: OutputFile,
    file: tokio::fs::File,
    stop: StopSignal,
    progress: &ProgressContext,
) -> Result<RunSummary> {
    let today = chrono::Local::now().date_naive();
    let plan = RunPlan {
        term: config.search.term.clone(),
        target: config.search.count,
        batch_size: config.search.batch,
        workers: windows::plan_windows(config.search.workers, today),
    };
    if let Some(first) = plan.workers.first() {
        log::debug!("Upper date range for search: {}", first.until);
    }

    let bar = progress.count_bar("written", plan.target);
    let result = tweetline_core::run(&plan, source, file, stop, bar).await;

    match result {
        Ok(summary) => {
            let path = output.final_path().to_path_buf();
            output
                .commit()
                .await
                .with_context(|| format!("Failed to move output into {}", path.display()))?;
            log::info!(
                "Wrote {} records to {}",
                summary.sink.written,
                path.display()
            );
            Ok(summary)
        }
        Err(e) => {
            if let Err(cleanup) = output.discard().await {
                log::warn!("Failed to remove partial output: {cleanup}");
            }
            Err(anyhow::Error::new(e).context("Writing output failed"))
        }
    }
}
