//! Subcommand implementations

pub mod print;
pub mod recipes;
pub mod run;
