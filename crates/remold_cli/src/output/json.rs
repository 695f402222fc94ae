//! JSON output formatter

use std::collections::BTreeMap;

use miette::{IntoDiagnostic, Result};
use remold_core::RunSummary;

pub fn output_json(summary: &RunSummary, dry_run: bool) -> Result<()> {
    let files: Vec<_> = summary
        .reports
        .iter()
        .map(|r| {
            let counters: BTreeMap<_, _> = r.counters.iter().collect();
            serde_json::json!({
                "path": r.path.as_ref().map(|p| p.display().to_string()),
                "changed": r.has_output(),
                "cycles": r.cycles,
                "converged": r.converged,
                "messages": r.messages,
                "counters": counters,
            })
        })
        .collect();
    let failures: Vec<_> = summary
        .failures
        .iter()
        .map(|(path, error)| {
            serde_json::json!({
                "path": path.display().to_string(),
                "error": error.to_string(),
            })
        })
        .collect();

    let output = serde_json::json!({
        "dry_run": dry_run,
        "aborted": summary.aborted,
        "files": files,
        "failures": failures,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&output).into_diagnostic()?
    );
    Ok(())
}
