//! CLI output formatting.
//!
//! Two kinds of output:
//!
//! - **Per-file decisions**, logged through `tracing` as each write happens:
//!
//!   ```text
//!   INFO mdpub::output: updating file: site/index.html (3f2a…)
//!   INFO mdpub::output: same checksum: site/guide.html (9c1d…)
//!   ```
//!
//! - **The run summary**, printed to stdout by the binary after a
//!   successful run:
//!
//!   ```text
//!   Documents
//!       README.md → site/index.html (updated)
//!       docs/guide.md → site/guide.html (unchanged)
//!
//!   Assets
//!       css/site.css → site/css/site.css (unchanged)
//!
//!   Rendered 2 documents (1 updated, 1 unchanged)
//!   Mirrored 1 asset (0 updated, 1 unchanged)
//!   ```
//!
//! `format_*` functions are pure and return lines for testability; the
//! `print_*`/`log_*` wrappers do the I/O. Whether anything is logged is
//! decided by the caller's explicit `quiet` value, not by global state.

use crate::publish::PublishReport;
use crate::writer::{WriteOutcome, WriteStatus};
use std::path::Path;
use tracing::info;

/// The log line for one write decision.
pub fn format_outcome(path: &Path, outcome: &WriteOutcome) -> String {
    let verb = match outcome.status {
        WriteStatus::Unchanged => "same checksum",
        WriteStatus::Updated => "updating file",
    };
    format!("{verb}: {} ({})", path.display(), outcome.fingerprint)
}

/// Log a write decision at info level unless `quiet`.
pub fn log_outcome(path: &Path, outcome: &WriteOutcome, quiet: bool) {
    if !quiet {
        info!("{}", format_outcome(path, outcome));
    }
}

fn status_label(outcome: &WriteOutcome) -> &'static str {
    match outcome.status {
        WriteStatus::Updated => "updated",
        WriteStatus::Unchanged => "unchanged",
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn tally<'a>(verb: &str, noun: &str, outcomes: impl Iterator<Item = &'a WriteOutcome>) -> String {
    let (mut updated, mut unchanged) = (0, 0);
    for outcome in outcomes {
        match outcome.status {
            WriteStatus::Updated => updated += 1,
            WriteStatus::Unchanged => unchanged += 1,
        }
    }
    format!(
        "{verb} {} ({updated} updated, {unchanged} unchanged)",
        plural(updated + unchanged, noun)
    )
}

/// Summary of a finished run.
pub fn format_report(report: &PublishReport) -> Vec<String> {
    let mut lines = vec!["Documents".to_string()];
    for doc in &report.documents {
        lines.push(format!(
            "    {} \u{2192} {} ({})",
            doc.source.display(),
            doc.destination.display(),
            status_label(&doc.outcome)
        ));
    }

    if let Some(assets) = &report.assets
        && !assets.is_empty()
    {
        lines.push(String::new());
        lines.push("Assets".to_string());
        for asset in assets {
            lines.push(format!(
                "    {} \u{2192} {} ({})",
                asset.entry.relative_path.display(),
                asset.entry.destination.display(),
                status_label(&asset.outcome)
            ));
        }
    }

    lines.push(String::new());
    lines.push(tally(
        "Rendered",
        "document",
        report.documents.iter().map(|d| &d.outcome),
    ));
    if let Some(assets) = &report.assets {
        lines.push(tally("Mirrored", "asset", assets.iter().map(|a| &a.outcome)));
    }

    lines
}

/// Print the run summary to stdout.
pub fn print_report(report: &PublishReport) {
    for line in format_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
