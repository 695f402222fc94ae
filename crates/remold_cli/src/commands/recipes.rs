//! Recipes command implementation

use miette::{IntoDiagnostic, Result};
use remold_core::RecipeRegistry;

use crate::cli::OutputFormat;

pub fn list_recipes(format: OutputFormat) -> Result<()> {
    let descriptors = RecipeRegistry::with_builtins().descriptors();

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&descriptors).into_diagnostic()?
            );
        }
        OutputFormat::Text => {
            for descriptor in &descriptors {
                println!("{} ({})", descriptor.name, descriptor.display_name);
                println!("  {}", descriptor.description);
                for option in &descriptor.options {
                    let required = if option.required { "required" } else { "optional" };
                    match option.example {
                        Some(example) => println!(
                            "    {:<16} {:<8} {} (e.g. {})",
                            option.name, required, option.description, example
                        ),
                        None => println!(
                            "    {:<16} {:<8} {}",
                            option.name, required, option.description
                        ),
                    }
                }
            }
        }
    }
    Ok(())
}
