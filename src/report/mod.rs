pub mod types;

pub use types::DigestReport;

use crate::diff::{parse_simple, summarize};
use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Build a DigestReport from raw unified diff text.
pub fn build(diff_text: &str) -> DigestReport {
    let files = parse_simple(diff_text);
    let total_added = files.iter().map(|f| f.added).sum();
    let total_removed = files.iter().map(|f| f.removed).sum();

    DigestReport {
        files,
        total_added,
        total_removed,
        digest: summarize(diff_text),
    }
}

/// Output the report to terminal (default) or to a markdown file.
#[instrument(skip(report), fields(files = report.files_changed()))]
pub fn output(report: &DigestReport, output_path: Option<&Path>) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing digest to terminal");
            print_terminal_report(report);
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing digest to file");
            write_markdown_report(report, path)
        }
    }
}

fn print_terminal_report(report: &DigestReport) {
    println!();
    if report.is_empty() {
        println!("{}", "No file changes found in diff.".yellow());
        println!();
        return;
    }

    println!(
        "Files changed: {} | {} {}",
        report.files_changed(),
        format!("+{}", report.total_added).green().bold(),
        format!("-{}", report.total_removed).red().bold()
    );
    println!();

    println!("═══ Files ═══");
    for stat in &report.files {
        println!(
            "  • {} {} {}",
            stat.file,
            format!("+{}", stat.added).green(),
            format!("-{}", stat.removed).red()
        );
    }
    println!();

    println!("═══ Digest ═══");
    println!("{}", report.digest.trim_end());
    println!();
}

fn write_markdown_report(report: &DigestReport, path: &Path) -> Result<(), ReportError> {
    let mut md = String::new();
    md.push_str("# Diff digest\n\n");
    md.push_str(&format!(
        "**Files changed:** {} | **+{} -{}**\n\n",
        report.files_changed(),
        report.total_added,
        report.total_removed
    ));

    md.push_str("## Files\n\n");
    if report.is_empty() {
        md.push_str("No file changes.\n\n");
    } else {
        for stat in &report.files {
            md.push_str(&format!("- `{}` +{} -{}\n", stat.file, stat.added, stat.removed));
        }
        md.push('\n');
    }

    md.push_str("## Digest\n\n```text\n");
    md.push_str(report.digest.trim());
    md.push_str("\n```\n");

    std::fs::write(path, md)?;
    Ok(())
}
