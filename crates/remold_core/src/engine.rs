//! Run orchestration over files.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use rayon::prelude::*;
use remold_parser::{Parser, SettingsParser};
use remold_tree::Document;
use tracing::{debug, info, warn};

use crate::file_finder::FileFinder;
use crate::markers::SourceRole;
use crate::runner::{DocumentReport, run_documents};
use crate::{Pipeline, RecipeRegistry, RunConfig, RunError};

/// Result of running over a set of files.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Reports of every document that was parsed and run.
    pub reports: Vec<DocumentReport>,
    /// Files that could not be loaded or whose pipeline failed.
    pub failures: Vec<(PathBuf, RunError)>,
    /// `true` when fail-fast stopped the batch.
    pub aborted: bool,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Reports whose printed text changed.
    pub fn changed(&self) -> impl Iterator<Item = &DocumentReport> {
        self.reports.iter().filter(|report| report.has_output())
    }
}

/// The run orchestrator.
///
/// Discovers files, parses them with the settings grammar, attaches the
/// configured document markers and runs the recipe pipeline on all of them.
pub struct Remolder {
    config: RunConfig,
    config_hash: String,
    pipeline: Pipeline,
    finder: FileFinder,
    roles: Vec<(GlobMatcher, SourceRole)>,
    parser: SettingsParser,
}

impl Remolder {
    /// Creates an orchestrator building the configured recipes from `registry`.
    pub fn new(config: RunConfig, registry: &RecipeRegistry) -> Result<Self, RunError> {
        let pipeline = registry.build_pipeline(&config.recipes, config.max_cycles)?;
        Self::with_pipeline(config, pipeline)
    }

    /// Creates an orchestrator running an already assembled pipeline.
    pub fn with_pipeline(config: RunConfig, pipeline: Pipeline) -> Result<Self, RunError> {
        let finder = FileFinder::new(&config.include, &config.exclude)?;

        let roles = config
            .roles
            .iter()
            .map(|(pattern, role)| {
                Glob::new(pattern)
                    .map(|glob| (glob.compile_matcher(), role.clone()))
                    .map_err(|e| {
                        RunError::config(format!("Invalid role pattern '{}': {}", pattern, e))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let config_hash = config.hash();
        debug!(recipes = pipeline.len(), config_hash = %config_hash, "created remolder");

        Ok(Self {
            config,
            config_hash,
            pipeline,
            finder,
            roles,
            parser: SettingsParser::new(),
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Expands patterns relative to the configuration's base directory.
    pub fn discover(&self, patterns: &[String]) -> Result<Vec<PathBuf>, RunError> {
        let base_dir = self
            .config
            .base_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        self.finder.discover_files(patterns, &base_dir)
    }

    /// Role of a file, from the first matching role pattern in config order.
    pub fn role_of(&self, path: &Path) -> Option<&SourceRole> {
        self.roles
            .iter()
            .find(|(matcher, _)| matcher.is_match(path))
            .map(|(_, role)| role)
    }

    /// Attaches role, plugin repositories and configured styles.
    pub fn prepare(&self, mut document: Document, path: Option<&Path>) -> Document {
        if let Some(role) = path.and_then(|path| self.role_of(path)) {
            document = document.with_marker(role.clone());
            if *role == SourceRole::Settings
                && let Some(repositories) = &self.config.plugin_repositories
            {
                document = document.with_marker(repositories.clone());
            }
        }
        let document = self.config.styles.apply(document);
        match path {
            Some(path) => document.with_source_path(path),
            None => document,
        }
    }

    /// Parses `source` and prepares it as if it were read from `path`.
    pub fn parse_source(&self, source: &str, path: Option<&Path>) -> Result<Document, RunError> {
        let document = self
            .parser
            .parse(source)
            .map_err(|e| RunError::parse(path.unwrap_or(Path::new("<input>")), e))?;
        Ok(self.prepare(document, path))
    }

    /// Reads and parses one file.
    pub fn load(&self, path: &Path) -> Result<Document, RunError> {
        let content = fs::read_to_string(path).map_err(|e| {
            RunError::file(format!("Failed to read {}: {}", path.display(), e))
        })?;
        self.parse_source(&content, Some(path))
    }

    /// Runs the pipeline on a single source text.
    pub fn run_source(&self, source: &str, path: Option<&Path>) -> Result<DocumentReport, RunError> {
        let document = self.parse_source(source, path)?;
        let mut batch = run_documents(&self.pipeline, std::slice::from_ref(&document), false);
        let mut report = batch
            .documents
            .pop()
            .ok_or_else(|| RunError::file("Pipeline produced no report"))?;
        match report.error.take() {
            Some(error) => Err(error),
            None => Ok(report),
        }
    }

    /// Runs files matching the given patterns.
    pub fn run_patterns(&self, patterns: &[String]) -> Result<RunSummary, RunError> {
        let files = self.discover(patterns)?;
        Ok(self.run_files(&files))
    }

    /// Loads and runs a list of files in parallel.
    pub fn run_files(&self, paths: &[PathBuf]) -> RunSummary {
        let loaded: Vec<Result<Document, (PathBuf, RunError)>> = paths
            .par_iter()
            .map(|path| self.load(path).map_err(|e| (path.clone(), e)))
            .collect();

        let mut documents = Vec::new();
        let mut failures = Vec::new();
        for result in loaded {
            match result {
                Ok(document) => documents.push(document),
                Err((path, error)) => {
                    warn!("Failed to load {}: {}", path.display(), error);
                    failures.push((path, error));
                }
            }
        }

        if self.config.fail_fast && !failures.is_empty() {
            warn!("Not running recipes: {} files failed to load", failures.len());
            return RunSummary {
                reports: Vec::new(),
                failures,
                aborted: true,
            };
        }

        let batch = run_documents(&self.pipeline, &documents, self.config.fail_fast);
        let aborted = batch.is_aborted();

        let mut reports = Vec::with_capacity(batch.documents.len());
        for mut report in batch.documents {
            if let Some(error) = report.error.take() {
                let path = report.path.clone().unwrap_or_default();
                warn!("Failed to run recipes on {}: {}", path.display(), error);
                failures.push((path, error));
            } else {
                reports.push(report);
            }
        }

        info!(
            "Ran {} recipes on {} files ({} failed)",
            self.pipeline.len(),
            reports.len(),
            failures.len()
        );

        RunSummary {
            reports,
            failures,
            aborted,
        }
    }

    /// Writes every changed document back to its file.
    ///
    /// Nothing is written for an aborted run. Returns the number of files
    /// written.
    pub fn write_changes(&self, summary: &RunSummary) -> Result<usize, RunError> {
        if summary.aborted {
            return Ok(0);
        }

        let mut written = 0;
        for report in summary.changed() {
            let (Some(path), Some(output)) = (&report.path, &report.output) else {
                continue;
            };
            fs::write(path, output)?;
            debug!("Wrote {}", path.display());
            written += 1;
        }
        Ok(written)
    }
}
