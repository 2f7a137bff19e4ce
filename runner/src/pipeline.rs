
use crate::config::AggregateConfig;
use dpubench_analysis::{Nested, PlotError, Report};
use dpubench_ingest::{CollectError, Corpus, StoreError};
use std::{fs, io, path::PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to collect profiles: {0}")]
    Collect(#[from] CollectError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Plot(#[from] PlotError),
    #[error("No corpus at {0:?}, run aggregate first")]
    NoCorpus(PathBuf),
    #[error("Failed to write {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse all profiles and append them as a new epoch to the persisted corpus
#[tracing::instrument(level = "info", skip_all)]
pub fn aggregate(config: &AggregateConfig) -> Result<Corpus, PipelineError> {
    let collection = config.corpus_builder().build(&config.benchmarks)?;
    let store = config.store();

    let corpus = match store.load()? {
        Some(previous) => previous.append(collection.run),
        None => Corpus::from(collection.run),
    };

    store.save(&corpus)?;

    Ok(corpus)
}

fn load_nested(config: &AggregateConfig) -> Result<Nested, PipelineError> {
    let store = config.store();

    match store.load()? {
        Some(corpus) => Ok(Nested::expand(&corpus)),
        None => Err(PipelineError::NoCorpus(store.path().to_path_buf())),
    }
}

/// Render one plot per benchmark of the persisted corpus
#[tracing::instrument(level = "info", skip_all)]
pub fn plot(config: &AggregateConfig) -> Result<Vec<PathBuf>, PipelineError> {
    let nested = load_nested(config)?;

    fs::create_dir_all(&config.plot.output).map_err(|source| PipelineError::Write {
        path: config.plot.output.clone(),
        source,
    })?;

    Ok(config.plotter().plot_all(&nested)?)
}

/// Check every series of the persisted corpus and write the report
#[tracing::instrument(level = "info", skip_all)]
pub fn check(config: &AggregateConfig) -> Result<Report, PipelineError> {
    let nested = load_nested(config)?;
    let report = config.checker().check(&nested);

    let json = serde_json::to_string_pretty(&report)?;
    fs::write(&config.check.output, json).map_err(|source| PipelineError::Write {
        path: config.check.output.clone(),
        source,
    })?;

    info!(
        findings = report.len(),
        "Wrote report to {}",
        config.check.output.display()
    );

    Ok(report)
}
