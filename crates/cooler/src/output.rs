//! Terminal output utilities

use cooler_update::{OutcomeReason, ReconciliationOutcome, VersionStatus};
use owo_colors::OwoColorize;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), msg);
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue().bold(), msg);
}

/// Print a header
pub fn header(msg: &str) {
    println!("\n{}", msg.bold().underline());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print one reconciliation outcome
pub fn outcome(outcome: &ReconciliationOutcome) {
    let tag = outcome.latest_tag.as_deref().unwrap_or("-");
    let line = format!("{} ({}): {}", outcome.component_id, tag, outcome.reason);
    match outcome.reason {
        OutcomeReason::Updated => success(&line),
        OutcomeReason::UpToDate => info(&line),
        OutcomeReason::ResolveFailed
        | OutcomeReason::DownloadFailed
        | OutcomeReason::InstallFailed => error(&line),
    }
}

/// Print one version status line
pub fn version_status(status: &VersionStatus) {
    let installed = status.installed.as_deref().unwrap_or("not installed");
    let line = format!(
        "{}: installed {}, latest {}",
        status.component_id, installed, status.latest
    );
    if status.up_to_date {
        success(&line);
    } else {
        warning(&line);
    }
}
