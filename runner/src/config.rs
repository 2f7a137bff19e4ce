#[cfg(test)]
mod config_test;

use dpubench_analysis::{check::default_rules, CheckAction, CheckRule, Checker, Plotter};
use dpubench_ingest::{CorpusBuilder, FailurePolicy, Identifier, ProfileCollector, Store};
use globset::Glob;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::Error,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// picked up from the working directory when no config is given
pub const DEFAULT_CONFIG: &str = "dpubench.yaml";

#[derive(Error, Debug)]
pub enum ConfigErrors {
    #[error("Failed to read config {path:?}: {source}")]
    Read { path: PathBuf, source: Error },
    #[error("Config is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Config contains errors, see the log for details")]
    Invalid,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct AggregateConfig {
    // benchmarks in the order they are parsed
    #[serde(default = "default_benchmarks")]
    pub benchmarks: Vec<String>,
    // directory containing `<benchmark>/profile`
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub plot: PlotConfig,
    #[serde(default)]
    pub check: CheckConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    // only file names matching this glob are parsed
    pub glob: Option<Glob>,
    #[serde(default)]
    pub failures: FailurePolicy,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct PlotConfig {
    #[serde(default = "default_root")]
    pub output: PathBuf,
    #[serde(default = "default_cell_width")]
    pub cell_width: u32,
    #[serde(default = "default_cell_height")]
    pub cell_height: u32,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct CheckConfig {
    #[serde(default = "default_report_path")]
    pub output: PathBuf,
    // applied when no rule matches a series
    #[serde(default)]
    pub default: CheckAction,
    #[serde(default = "default_rules")]
    pub rules: Vec<CheckRule>,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            benchmarks: default_benchmarks(),
            root: default_root(),
            profile: ProfileConfig::default(),
            store: StoreConfig::default(),
            plot: PlotConfig::default(),
            check: CheckConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            output: default_root(),
            cell_width: default_cell_width(),
            cell_height: default_cell_height(),
        }
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            output: default_report_path(),
            default: CheckAction::default(),
            rules: default_rules(),
        }
    }
}

impl AggregateConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigErrors> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load `path`, else `dpubench.yaml` if present, else the defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigErrors> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None if Path::new(DEFAULT_CONFIG).is_file() => PathBuf::from(DEFAULT_CONFIG),
            None => {
                info!("No config given, using defaults");

                return Ok(Self::default());
            }
        };

        debug!(path = ?path, "Loading config");

        let yaml = fs::read_to_string(&path).map_err(|source| ConfigErrors::Read {
            path: path.clone(),
            source,
        })?;

        Self::from_yaml(&yaml)
    }

    /// Check the whole config and log every problem, returns true on errors
    pub fn preflight_checks(&mut self) -> bool {
        // attempt to catch all errors instead of piece-by-piece to make debugging easier for users
        let mut contains_error = false;

        if self.benchmarks.is_empty() {
            error!("No benchmark was defined, nothing to aggregate");
            contains_error = true;
        }

        for benchmark in self.benchmarks.iter() {
            if let Err(e) = Identifier::check_benchmark(benchmark) {
                error!("benchmarks: '{benchmark}' can't be used: {e}");
                contains_error = true;
            }
        }

        let unique = self.benchmarks.iter().unique().cloned().collect_vec();
        if unique.len() != self.benchmarks.len() {
            warn!(
                "benchmarks contains duplicates ({}), only the first occurrence is kept",
                self.benchmarks.iter().duplicates().join(", ")
            );
            self.benchmarks = unique;
        }

        if self.plot.cell_width == 0 || self.plot.cell_height == 0 {
            error!("plot.cell_width and plot.cell_height must be positive");
            contains_error = true;
        }

        if let CheckAction::Decrease { threshold } = self.check.default {
            if !(0.0..1.0).contains(&threshold) {
                error!("check.default.threshold ({threshold}) must be in [0, 1)");
                contains_error = true;
            }
        }

        for (index, rule) in self.check.rules.iter().enumerate() {
            if let CheckAction::Decrease { threshold } = rule.action {
                if !(0.0..1.0).contains(&threshold) {
                    error!("check.rules[{index}].action.threshold ({threshold}) must be in [0, 1)");
                    contains_error = true;
                }
            }
        }

        contains_error
    }

    pub fn corpus_builder(&self) -> CorpusBuilder {
        let filter = self.profile.glob.as_ref().map(Glob::compile_matcher);

        CorpusBuilder::new(
            &self.root,
            ProfileCollector::new(filter, self.profile.failures),
        )
    }

    pub fn store(&self) -> Store {
        Store::new(&self.store.path)
    }

    pub fn plotter(&self) -> Plotter {
        Plotter::new(
            &self.plot.output,
            self.plot.cell_width,
            self.plot.cell_height,
        )
    }

    pub fn checker(&self) -> Checker {
        Checker::new(self.check.rules.clone(), self.check.default.clone())
    }
}

fn default_benchmarks() -> Vec<String> {
    [
        "BS", "BFS", "GEMV", "HST-L", "HST-S", "MLP", "NW", "RED", "SCAN-RSS", "SCAN-SSA",
        "SpMV", "TRNS", "TS", "UNI", "VA",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_store_path() -> PathBuf {
    PathBuf::from("aggregate.json")
}

fn default_report_path() -> PathBuf {
    PathBuf::from("checked.json")
}

fn default_cell_width() -> u32 {
    500
}

fn default_cell_height() -> u32 {
    400
}
