//! remold CLI
//!
//! Runs format-preserving recipes over settings files.

mod cli;
mod commands;
mod output;

use std::process::ExitCode;

use clap::Parser;
use miette::Result;
use tracing::error;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(has_failures) => {
            if has_failures {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<bool> {
    match &cli.command {
        Commands::Run {
            patterns,
            recipes,
            options,
            dry_run,
            fail_fast,
            max_cycles,
            format,
        } => commands::run::run_recipes(
            cli,
            &commands::run::RunArgs {
                patterns,
                recipes,
                options,
                dry_run: *dry_run,
                fail_fast: *fail_fast,
                max_cycles: *max_cycles,
                format: *format,
            },
        ),
        Commands::Recipes { format } => commands::recipes::list_recipes(*format).map(|_| false),
        Commands::Print { file, tree } => commands::print::print_file(cli, file, *tree).map(|_| false),
    }
}
