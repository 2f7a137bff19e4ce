
use crate::{
    corpus::RunMapping,
    parser::{self, ParseError},
};
use globset::GlobMatcher;
use ignore::{DirEntry, WalkBuilder};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// conventional location of a benchmark's output files, relative to its directory
pub const PROFILE_DIR: &str = "profile";

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("Failed to parse {path:?}: {source}")]
    File { path: PathBuf, source: ParseError },
    #[error("Failed to list profile directory: {0}")]
    Walk(#[from] ignore::Error),
}

/// What to do with an output file that fails to parse
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// abort the whole invocation on the first failure
    #[default]
    Abort,
    /// skip the file and report it in the collection summary
    Skip,
}

#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: CollectError,
}

/// path an `ignore` error is about, if it names one
fn error_path(error: &ignore::Error) -> Option<&Path> {
    match error {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        _ => None,
    }
}

/// Measurements gathered from one or more profile directories
#[derive(Debug, Default)]
pub struct Collection {
    pub run: RunMapping,
    /// files skipped under `FailurePolicy::Skip`
    pub failures: Vec<FileFailure>,
}

impl Collection {
    /// union with `other`, values of `other` win on collisions
    pub fn join(&mut self, other: Collection) {
        self.run.union(other.run);
        self.failures.extend(other.failures);
    }
}

/// Parses every output file of a single, flat profile directory
#[derive(Debug, Clone, Default)]
pub struct ProfileCollector {
    filter: Option<GlobMatcher>,
    policy: FailurePolicy,
}

impl ProfileCollector {
    pub fn new(filter: Option<GlobMatcher>, policy: FailurePolicy) -> Self {
        Self { filter, policy }
    }

    /// Record `error` under `Skip`, hand it back under `Abort`
    fn fail(
        &self,
        failures: &mut Vec<FileFailure>,
        path: PathBuf,
        error: CollectError,
    ) -> Result<(), CollectError> {
        match self.policy {
            FailurePolicy::Abort => Err(error),
            FailurePolicy::Skip => {
                warn!(path = ?path, error = %error, "Skipping output file");

                failures.push(FileFailure { path, error });

                Ok(())
            }
        }
    }

    /// list the regular files of `dir` (no recursion), sorted by name
    fn list(
        &self,
        dir: &Path,
        failures: &mut Vec<FileFailure>,
    ) -> Result<Vec<PathBuf>, CollectError> {
        let mut builder = WalkBuilder::new(dir);

        // every file counts, hidden or ignored ones included
        builder
            .standard_filters(false)
            .follow_links(true)
            .max_depth(Some(1))
            .sort_by_file_name(|left, right| left.cmp(right));

        let mut paths = Vec::new();

        for entry in builder.build() {
            let entry: DirEntry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    let path = error_path(&error).unwrap_or(dir).to_path_buf();
                    self.fail(failures, path, CollectError::Walk(error))?;

                    continue;
                }
            };

            if !entry.file_type().map_or(false, |kind| kind.is_file()) {
                continue;
            }

            if let Some(ref filter) = self.filter {
                if !filter.is_match(entry.file_name()) {
                    debug!(path = ?entry.path(), "Skipping file not matching the profile glob");
                    continue;
                }
            }

            paths.push(entry.into_path());
        }

        Ok(paths)
    }

    /// Parse all files in `dir` for `benchmark`
    ///
    /// A missing directory yields an empty collection. On identifier collisions
    /// the file processed later wins.
    #[tracing::instrument(level = "debug", skip(self, dir), fields(dir = ?dir.as_ref()))]
    pub fn collect(
        &self,
        dir: impl AsRef<Path>,
        benchmark: &str,
    ) -> Result<Collection, CollectError> {
        let dir = dir.as_ref();
        let mut collection = Collection::default();

        if !dir.is_dir() {
            info!("{} not existing, skipping", dir.display());

            return Ok(collection);
        }

        for path in self.list(dir, &mut collection.failures)? {
            debug!(path = ?path, "Parsing output file");

            match parser::parse_file(&path, benchmark) {
                Ok(run) => collection.run.union(run),
                Err(source) => {
                    let error = CollectError::File {
                        path: path.clone(),
                        source,
                    };

                    self.fail(&mut collection.failures, path, error)?;
                }
            }
        }

        Ok(collection)
    }
}

/// Builds the run mapping of a whole invocation over a list of benchmarks
#[derive(Debug, Clone)]
pub struct CorpusBuilder {
    root: PathBuf,
    collector: ProfileCollector,
}

impl CorpusBuilder {
    pub fn new(root: impl Into<PathBuf>, collector: ProfileCollector) -> Self {
        Self {
            root: root.into(),
            collector,
        }
    }

    /// `<root>/<benchmark>/profile`
    pub fn profile_dir(&self, benchmark: &str) -> PathBuf {
        self.root.join(benchmark).join(PROFILE_DIR)
    }

    /// Collect every benchmark in order, later benchmarks win on collisions
    #[tracing::instrument(level = "info", skip_all, fields(root = ?self.root))]
    pub fn build<S: AsRef<str>>(&self, benchmarks: &[S]) -> Result<Collection, CollectError> {
        let mut collection = Collection::default();

        for benchmark in benchmarks.iter().map(AsRef::as_ref) {
            info!("Parsing {benchmark}");

            collection.join(
                self.collector
                    .collect(self.profile_dir(benchmark), benchmark)?,
            );
        }

        if !collection.failures.is_empty() {
            warn!(
                failed = collection.failures.len(),
                "Skipped output files that failed to parse: {}",
                collection
                    .failures
                    .iter()
                    .map(|failure| failure.path.display())
                    .join(", ")
            );
        }

        info!(measures = collection.run.len(), "Built run mapping");

        Ok(collection)
    }
}
