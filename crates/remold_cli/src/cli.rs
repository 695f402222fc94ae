//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// remold - Format-preserving source transformations
#[derive(Parser)]
#[command(name = "remold")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run recipes over files
    Run {
        /// File patterns to process
        #[arg(required = true)]
        patterns: Vec<String>,

        /// Recipe to apply; repeat to build a pipeline (replaces configured recipes)
        #[arg(short, long = "recipe", value_name = "NAME")]
        recipes: Vec<String>,

        /// Recipe option
        #[arg(short, long = "option", value_name = "RECIPE.KEY=VALUE")]
        options: Vec<String>,

        /// List changed files without writing them
        #[arg(long)]
        dry_run: bool,

        /// Abort the whole batch on the first failure
        #[arg(long)]
        fail_fast: bool,

        /// Maximum number of pipeline cycles per file
        #[arg(long, value_name = "N")]
        max_cycles: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List built-in recipes and their options
    Recipes {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Parse a file and print it back
    Print {
        /// File to print
        file: PathBuf,

        /// Dump the parsed tree as JSON instead
        #[arg(long)]
        tree: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
