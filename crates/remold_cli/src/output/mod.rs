//! Output formatting module

mod json;
mod text;

use miette::Result;
use remold_core::RunSummary;

use crate::cli::OutputFormat;

pub fn output_summary(
    summary: &RunSummary,
    format: OutputFormat,
    dry_run: bool,
    written: usize,
) -> Result<()> {
    match format {
        OutputFormat::Json => json::output_json(summary, dry_run)?,
        OutputFormat::Text => text::output_text(summary, dry_run, written),
    }
    Ok(())
}
