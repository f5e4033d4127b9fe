//! Progress reporting for hashing runs
//!
//! Provides a spinner-based live display fed by polled [`RunProgress`]
//! snapshots, plus the styled header and summary printed around a run.
//! Rendering stays out of the engine: the reporter only ever reads
//! snapshots, never the queues.

use crate::report::HashReport;
use crate::runner::RunProgress;
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Most failures listed in the summary before eliding the rest
const MAX_LISTED_FAILURES: usize = 20;

/// Progress reporter that displays run status
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the display from a run snapshot
    pub fn update(&self, progress: &RunProgress) {
        let msg = format!(
            "Hashed: {}/{} | Failed: {} | Size: {} | Rate: {:.0}/s",
            format_number(progress.completed()),
            format_number(progress.enumerated),
            format_number(progress.failed),
            format_size(progress.bytes, BINARY),
            progress.files_per_second(),
        );
        self.bar.set_message(msg);
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Finish and clear the display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Print a header at the start of a run
pub fn print_header(root: &str, workers: usize, algorithm: &str, sequential: bool) {
    println!();
    println!(
        "{} {}",
        style("hash-walker").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Root:").bold(), root);
    if sequential {
        println!("  {} sequential baseline", style("Mode:").bold());
    } else {
        println!("  {} {} workers", style("Mode:").bold(), workers);
    }
    println!("  {} {}", style("Algorithm:").bold(), algorithm);
    println!();
}

/// Print a summary of the run results
pub fn print_summary(report: &HashReport) {
    let duration_secs = report.elapsed().as_secs_f64();
    let rate = if duration_secs > 0.0 {
        (report.success_count() + report.failure_count()) as f64 / duration_secs
    } else {
        0.0
    };

    println!();
    if report.is_partial() {
        println!("{}", style("Run Interrupted").yellow().bold());
    } else {
        println!("{}", style("Run Complete").green().bold());
    }
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Files hashed:").bold(),
        format_number(report.success_count() as u64)
    );
    println!(
        "  {} {}",
        style("Total size:").bold(),
        format_size(report.total_bytes(), BINARY)
    );
    println!(
        "  {} {:.2}s ({:.0} files/sec)",
        style("Duration:").bold(),
        duration_secs,
        rate
    );

    if report.failure_count() > 0 {
        println!(
            "  {} {}",
            style("Failures:").yellow().bold(),
            format_number(report.failure_count() as u64)
        );
        for (path, error) in report.failures().iter().take(MAX_LISTED_FAILURES) {
            println!("    {} {}", style("✗").yellow(), error_line(path, error));
        }
        let elided = report.failure_count().saturating_sub(MAX_LISTED_FAILURES);
        if elided > 0 {
            println!("    {}", style(format!("… and {elided} more")).dim());
        }
    }
    println!();
}

fn error_line(path: &std::path::Path, error: &crate::error::FileError) -> String {
    // The error text already names the path for most variants; keep the
    // line readable either way
    let text = error.to_string();
    if text.contains(&path.display().to_string()) {
        text
    } else {
        format!("{}: {}", path.display(), text)
    }
}
