//! hash-walker - Parallel content hashing for directory trees
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use hash_walker::progress::{print_header, print_summary, ProgressReporter};
use hash_walker::runner::RunStats;
use hash_walker::{CliArgs, HashConfig, HashCoordinator, HashReport, SequentialRunner};
use std::io::Write;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(clean) => {
            if clean {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the run finished completely and without file failures
fn run() -> Result<bool> {
    let args = CliArgs::parse();

    setup_logging(args.verbose)?;

    let config = HashConfig::from_args(args).context("Invalid configuration")?;

    if config.show_progress {
        print_header(
            &config.root.display().to_string(),
            config.worker_count,
            config.algorithm.name(),
            config.sequential,
        );
    }

    let report = if config.sequential {
        let runner = SequentialRunner::new(config.clone());
        let shutdown = runner.shutdown_flag();
        let stats = runner.stats();
        execute(shutdown, stats, config.show_progress, move || runner.run())?
    } else {
        let coordinator = HashCoordinator::new(config.clone());
        let shutdown = coordinator.shutdown_flag();
        let stats = coordinator.stats();
        execute(shutdown, stats, config.show_progress, move || {
            coordinator.run()
        })?
    };

    if config.list {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        report
            .write_digest_lines(&mut out)
            .context("Failed to write digest list")?;
        out.flush().ok();
    }

    if config.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report.to_json())
                .context("Failed to serialize report")?
        );
    }

    if config.show_progress {
        print_summary(&report);
    }

    if report.is_partial() {
        info!("run was interrupted before completion");
    }
    if report.failure_count() > 0 {
        info!(failures = report.failure_count(), "run completed with failures");
    }

    Ok(!report.is_partial() && report.failure_count() == 0)
}

/// Drive one run with signal handling and a progress poller around it
fn execute<F>(
    shutdown: Arc<AtomicBool>,
    stats: Arc<RunStats>,
    show_progress: bool,
    run: F,
) -> Result<HashReport>
where
    F: FnOnce() -> hash_walker::Result<HashReport>,
{
    // Graceful shutdown on Ctrl-C: stop claiming work, keep what finished
    ctrlc::set_handler({
        let shutdown = Arc::clone(&shutdown);
        move || {
            eprintln!("\nInterrupt received, shutting down...");
            shutdown.store(true, Ordering::SeqCst);
        }
    })
    .context("Failed to set signal handler")?;

    let progress = if show_progress {
        Some(Arc::new(ProgressReporter::new()))
    } else {
        None
    };

    let done = Arc::new(AtomicBool::new(false));
    let poller = progress.as_ref().map(|reporter| {
        let reporter = Arc::clone(reporter);
        let stats = Arc::clone(&stats);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::Relaxed) {
                reporter.update(&stats.snapshot());
                thread::sleep(Duration::from_millis(100));
            }
        })
    });

    let result = run();

    done.store(true, Ordering::SeqCst);
    if let Some(handle) = poller {
        let _ = handle.join();
    }
    if let Some(reporter) = progress {
        reporter.finish_and_clear();
    }

    result.map_err(anyhow::Error::from)
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("hash_walker=debug,warn")
    } else {
        EnvFilter::new("hash_walker=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
