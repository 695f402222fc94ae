//! File discovery with include/exclude filtering.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::RunError;

/// Finds the files a run should process.
pub struct FileFinder {
    include_globs: Option<GlobSet>,
    exclude_globs: Option<GlobSet>,
}

impl FileFinder {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, RunError> {
        let include_globs = build_globset(include)?;
        let exclude_globs = build_globset(exclude)?;

        Ok(Self {
            include_globs,
            exclude_globs,
        })
    }

    /// Checks if a file path should be skipped based on include/exclude patterns.
    ///
    /// Exclusion wins over inclusion.
    pub fn should_ignore(&self, path: &Path) -> bool {
        if self
            .exclude_globs
            .as_ref()
            .is_some_and(|excludes| excludes.is_match(path))
        {
            return true;
        }

        self.include_globs
            .as_ref()
            .is_some_and(|includes| !includes.is_match(path))
    }

    /// Expands `patterns` into a sorted, de-duplicated list of files.
    ///
    /// A pattern naming an existing file is taken literally; anything else is
    /// a glob matched while walking `base_dir`.
    pub fn discover_files(
        &self,
        patterns: &[String],
        base_dir: &Path,
    ) -> Result<Vec<PathBuf>, RunError> {
        let mut files = Vec::new();

        let mut glob_builder = GlobSetBuilder::new();
        let mut has_globs = false;

        for pattern in patterns {
            let literal = Path::new(pattern);
            let literal = if literal.is_relative() && !literal.exists() {
                base_dir.join(literal)
            } else {
                literal.to_path_buf()
            };

            if literal
                .symlink_metadata()
                .is_ok_and(|m| m.file_type().is_file())
            {
                let path = literal.canonicalize().unwrap_or(literal);
                if self.should_ignore(&path) {
                    debug!("Skipping excluded file {}", path.display());
                    continue;
                }
                files.push(path);
            } else {
                let glob = Glob::new(pattern).map_err(|e| {
                    RunError::config(format!("Invalid pattern '{}': {}", pattern, e))
                })?;
                glob_builder.add(glob);
                has_globs = true;
            }
        }

        if has_globs {
            let glob_set = glob_builder
                .build()
                .map_err(|e| RunError::config(format!("Failed to build globset: {}", e)))?;

            for entry in WalkDir::new(base_dir).into_iter().filter_map(|e| e.ok()) {
                let path = entry.path();
                if !entry.file_type().is_file() {
                    continue;
                }
                let relative = path.strip_prefix(base_dir).unwrap_or(path);
                if !(glob_set.is_match(path) || glob_set.is_match(relative)) {
                    continue;
                }
                if self.should_ignore(path) {
                    continue;
                }
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        files.dedup();

        info!("Discovered {} files to process", files.len());
        Ok(files)
    }
}

/// Compiles `patterns` into one set, or `None` when there are none.
pub(crate) fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>, RunError> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| RunError::config(format!("Invalid glob pattern: {}", e)))?;
        builder.add(glob);
    }

    let globset = builder
        .build()
        .map_err(|e| RunError::config(format!("Failed to build globset: {}", e)))?;

    Ok(Some(globset))
}
