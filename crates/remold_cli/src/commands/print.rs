//! Print command implementation

use std::fs;
use std::io::Write;
use std::path::Path;

use miette::{IntoDiagnostic, Result};
use remold_core::{Pipeline, Remolder, RunConfig};
use remold_parser::{Parser, SettingsParser};
use remold_tree::print_document;

use crate::cli::Cli;

/// Prints the round-tripped text, or the tree as JSON.
///
/// With a configuration, the tree dump includes the document markers a run
/// would attach.
pub fn print_file(cli: &Cli, file: &Path, tree: bool) -> Result<()> {
    let content = fs::read_to_string(file).into_diagnostic()?;
    let document = SettingsParser::new().parse(&content).into_diagnostic()?;

    if !tree {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(print_document(&document).as_bytes())
            .into_diagnostic()?;
        return Ok(());
    }

    let document = match &cli.config {
        Some(path) => {
            let config = RunConfig::from_file(path).into_diagnostic()?;
            let remolder = Remolder::with_pipeline(config, Pipeline::new())
                .into_diagnostic()?;
            remolder.prepare(document, Some(file))
        }
        None => document.with_source_path(file),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&document).into_diagnostic()?
    );
    Ok(())
}
