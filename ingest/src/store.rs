
use crate::{
    corpus::{Corpus, CorpusError, History, MISSING},
    identifier::{Identifier, IdentifierError},
};
use std::{
    collections::BTreeMap,
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info};

/// on-disk shape: encoded identifier -> history, `null` for the sentinel
type Document = BTreeMap<String, Vec<Option<f64>>>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Failed to (de)serialize corpus: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid key '{key}': {source}")]
    Key {
        key: String,
        source: IdentifierError,
    },
    #[error("Persisted corpus is not rectangular: {0}")]
    Corpus(#[from] CorpusError),
}

/// Serialize a corpus with sorted keys and 2 space indentation
pub fn to_json(corpus: &Corpus) -> Result<String, StoreError> {
    let document: Document = corpus
        .iter()
        .map(|(identifier, history)| {
            (
                identifier.encode(),
                history
                    .iter()
                    .map(|value| (!value.is_nan()).then_some(*value))
                    .collect(),
            )
        })
        .collect();

    Ok(serde_json::to_string_pretty(&document)?)
}

/// Deserialize and validate a corpus
pub fn from_json(json: &str) -> Result<Corpus, StoreError> {
    let document: Document = serde_json::from_str(json)?;

    let corpus = document
        .into_iter()
        .map(|(key, history)| -> Result<(Identifier, History), StoreError> {
            let identifier = key
                .parse::<Identifier>()
                .map_err(|source| StoreError::Key { key, source })?;

            Ok((
                identifier,
                history
                    .into_iter()
                    .map(|value| value.unwrap_or(MISSING))
                    .collect(),
            ))
        })
        .collect::<Result<Corpus, StoreError>>()?;

    corpus.validate()?;

    Ok(corpus)
}

/// JSON file holding the corpus between invocations
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Load the persisted corpus, `None` if there is no file yet
    #[tracing::instrument(level = "debug", skip(self), fields(path = ?self.path))]
    pub fn load(&self) -> Result<Option<Corpus>, StoreError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                info!("No corpus found at {}, starting a new one", self.path.display());

                return Ok(None);
            }
            Err(error) => return Err(self.io_error(error)),
        };

        let corpus = from_json(&json)?;
        debug!(
            measures = corpus.len(),
            epochs = corpus.epochs(),
            "Loaded corpus"
        );

        Ok(Some(corpus))
    }

    /// Replace the persisted corpus
    ///
    /// Written to a sibling file first and renamed over the target.
    #[tracing::instrument(level = "debug", skip_all, fields(path = ?self.path))]
    pub fn save(&self, corpus: &Corpus) -> Result<(), StoreError> {
        let json = to_json(corpus)?;

        let mut tmp_name = OsString::from(".");
        tmp_name.push(self.path.file_name().unwrap_or_default());
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        fs::write(&tmp_path, json).map_err(|error| self.io_error(error))?;
        fs::rename(&tmp_path, &self.path).map_err(|error| self.io_error(error))?;

        info!(
            measures = corpus.len(),
            epochs = corpus.epochs(),
            "Saved corpus to {}",
            self.path.display()
        );

        Ok(())
    }
}
