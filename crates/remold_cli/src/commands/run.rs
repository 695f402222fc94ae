//! Run command implementation

use miette::{IntoDiagnostic, Result, miette};
use remold_core::{RecipeConfig, RecipeRegistry, Remolder, RunConfig};
use tracing::info;

use crate::cli::{Cli, OutputFormat};
use crate::output::output_summary;

pub struct RunArgs<'a> {
    pub patterns: &'a [String],
    pub recipes: &'a [String],
    pub options: &'a [String],
    pub dry_run: bool,
    pub fail_fast: bool,
    pub max_cycles: Option<usize>,
    pub format: OutputFormat,
}

/// Returns `true` when any file failed.
pub fn run_recipes(cli: &Cli, args: &RunArgs<'_>) -> Result<bool> {
    let mut config = if let Some(ref path) = cli.config {
        RunConfig::from_file(path).into_diagnostic()?
    } else {
        find_config()?
    };

    if !args.recipes.is_empty() {
        config.recipes = args
            .recipes
            .iter()
            .map(|name| RecipeConfig::Name(name.clone()))
            .collect();
    }
    for option in args.options {
        apply_option(&mut config.recipes, option)?;
    }
    if args.fail_fast {
        config.fail_fast = true;
    }
    if let Some(max_cycles) = args.max_cycles {
        config.max_cycles = max_cycles;
    }

    if config.recipes.is_empty() {
        return Err(miette!(
            "No recipes to run. Pass --recipe or configure `recipes`."
        ));
    }

    let registry = RecipeRegistry::with_builtins();
    let remolder = Remolder::new(config, &registry).into_diagnostic()?;

    let summary = remolder.run_patterns(args.patterns).into_diagnostic()?;

    let written = if args.dry_run {
        0
    } else {
        remolder.write_changes(&summary).into_diagnostic()?
    };

    output_summary(&summary, args.format, args.dry_run, written)?;

    Ok(summary.has_failures())
}

pub fn find_config() -> Result<RunConfig> {
    if let Some(path) = RunConfig::discover(std::path::Path::new(".")) {
        info!("Using config: {}", path.display());
        return RunConfig::from_file(&path).into_diagnostic();
    }

    info!("No config file found, using defaults");
    Ok(RunConfig::new())
}

/// Applies a `RECIPE.KEY=VALUE` option to the matching configured recipes.
///
/// Values are always strings.
fn apply_option(recipes: &mut [RecipeConfig], option: &str) -> Result<()> {
    let (target, value) = option
        .split_once('=')
        .ok_or_else(|| miette!("Invalid option '{}': expected RECIPE.KEY=VALUE", option))?;
    let (recipe, key) = target
        .split_once('.')
        .filter(|(recipe, key)| !recipe.is_empty() && !key.is_empty())
        .ok_or_else(|| miette!("Invalid option '{}': expected RECIPE.KEY=VALUE", option))?;

    let mut matched = false;
    for config in recipes.iter_mut().filter(|config| config.name() == recipe) {
        let mut options = match config.options() {
            serde_json::Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        options.insert(key.to_string(), serde_json::Value::String(value.to_string()));
        *config = RecipeConfig::Detail {
            name: recipe.to_string(),
            options: serde_json::Value::Object(options),
        };
        matched = true;
    }

    if !matched {
        return Err(miette!(
            "Option '{}' targets recipe '{}', which is not in the pipeline",
            option,
            recipe
        ));
    }
    Ok(())
}
