#[cfg(test)]
mod nested_test;

use dpubench_ingest::{Corpus, History, Identifier};
use std::collections::{btree_map, BTreeMap};
use tracing::warn;

/// suffix dropped from measure names in the nested layout
pub const MEASURE_SUFFIX: &str = " Time (ms)";

#[derive(Clone, Debug)]
pub struct Series {
    /// full identifier the history was stored under
    pub identifier: Identifier,
    pub history: History,
}

/// measure label -> series
pub type MeasureMap = BTreeMap<String, Series>;
/// tasklet count -> measures
pub type TaskletMap = BTreeMap<u32, MeasureMap>;
/// dpu count -> tasklets
pub type DpuMap = BTreeMap<u32, TaskletMap>;

/// `CPU-DPU Time (ms)` -> `CPU-DPU`
pub fn measure_label(measure: &str) -> &str {
    measure.strip_suffix(MEASURE_SUFFIX).unwrap_or(measure)
}

/// Normalized performance of a time series
///
/// Each time becomes its inverse (missing or non-positive times count as 0) and
/// is scaled by the series maximum, so values are in `0..=1`.
pub fn performance(history: &[f64]) -> Vec<f64> {
    let inverted: Vec<f64> = history
        .iter()
        .map(|time| if *time > 0.0 { 1.0 / time } else { 0.0 })
        .collect();

    let max = inverted.iter().copied().fold(0.0, f64::max);

    if max > 0.0 {
        inverted.into_iter().map(|value| value / max).collect()
    } else {
        inverted
    }
}

/// Corpus laid out as benchmark -> dpus -> tasklets -> measure label
#[derive(Clone, Debug, Default)]
pub struct Nested {
    benchmarks: BTreeMap<String, DpuMap>,
}

impl Nested {
    /// Expand a flat corpus in one pass
    ///
    /// The `bl` parameter is not part of the path, identifiers that only differ
    /// in `bl` collapse and the later one wins.
    pub fn expand(corpus: &Corpus) -> Self {
        let mut benchmarks: BTreeMap<String, DpuMap> = BTreeMap::new();

        for (identifier, history) in corpus.iter() {
            let measures = benchmarks
                .entry(identifier.benchmark.clone())
                .or_default()
                .entry(identifier.dpus)
                .or_default()
                .entry(identifier.tasklets)
                .or_default();

            let series = Series {
                identifier: identifier.clone(),
                history: history.clone(),
            };

            if let Some(previous) =
                measures.insert(measure_label(&identifier.measure).to_string(), series)
            {
                warn!(
                    replaced = %previous.identifier,
                    by = %identifier,
                    "Series map to the same nested path, keeping the later one"
                );
            }
        }

        Self { benchmarks }
    }

    pub fn benchmark(&self, name: &str) -> Option<&DpuMap> {
        self.benchmarks.get(name)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, DpuMap> {
        self.benchmarks.iter()
    }

    pub fn len(&self) -> usize {
        self.benchmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }

    /// every series with its path
    pub fn series(&self) -> impl Iterator<Item = (&str, u32, u32, &str, &Series)> {
        self.benchmarks.iter().flat_map(|(benchmark, dpus)| {
            dpus.iter().flat_map(move |(dpu_count, tasklets)| {
                tasklets.iter().flat_map(move |(tasklet_count, measures)| {
                    measures.iter().map(move |(label, series)| {
                        (
                            benchmark.as_str(),
                            *dpu_count,
                            *tasklet_count,
                            label.as_str(),
                            series,
                        )
                    })
                })
            })
        })
    }
}

/// widest tasklet row of a benchmark
pub fn count_tasklets(dpus: &DpuMap) -> usize {
    dpus.values().map(BTreeMap::len).max().unwrap_or(0)
}
