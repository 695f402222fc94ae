//! Text output formatter

use remold_core::{MessageLevel, RunSummary};

pub fn output_text(summary: &RunSummary, dry_run: bool, written: usize) {
    for report in &summary.reports {
        let Some(path) = &report.path else {
            continue;
        };

        if report.has_output() {
            let verb = if dry_run { "Would change" } else { "Changed" };
            println!("{} {}", verb, path.display());
        }
        for message in &report.messages {
            let level = match message.level {
                MessageLevel::Info => "info",
                MessageLevel::Warning => "warning",
            };
            println!(
                "  {} [{}]: {}",
                level,
                message.recipe.as_deref().unwrap_or("-"),
                message.text
            );
        }
    }

    if !summary.failures.is_empty() {
        eprintln!("\n{} file(s) failed:", summary.failures.len());
        for (path, error) in &summary.failures {
            eprintln!("  {}: {}", path.display(), error);
        }
    }
    if summary.aborted {
        eprintln!("Run aborted; no files were written");
    }

    let changed = summary.changed().count();
    println!();
    if dry_run {
        println!(
            "Processed {} files, {} would change",
            summary.reports.len(),
            changed
        );
    } else {
        println!(
            "Processed {} files, changed {} ({} written)",
            summary.reports.len(),
            changed,
            written
        );
    }
}
