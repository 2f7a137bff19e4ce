
use crate::identifier::Identifier;
use itertools::Itertools;
use std::collections::{btree_map, BTreeMap};
use thiserror::Error;

/// sentinel for "no measurement for this key at this epoch"
pub const MISSING: f64 = f64::NAN;

/// one value per invocation, in invocation order
pub type History = Vec<f64>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorpusError {
    #[error("History of {identifier} has {found} entries, expected {expected}")]
    NonRectangular {
        identifier: String,
        expected: usize,
        found: usize,
    },
}

/// Measurements of a single invocation, one value per identifier
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunMapping {
    values: BTreeMap<Identifier, f64>,
}

impl RunMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// record a value, replacing an earlier one for the same identifier
    pub fn insert(&mut self, identifier: Identifier, value: f64) -> Option<f64> {
        self.values.insert(identifier, value)
    }

    /// union with `other`, values of `other` win on collisions
    pub fn union(&mut self, other: RunMapping) {
        self.values.extend(other.values);
    }

    pub fn get(&self, identifier: &Identifier) -> Option<f64> {
        self.values.get(identifier).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Identifier, f64)> {
        self.values
            .iter()
            .map(|(identifier, value)| (identifier, *value))
    }
}

impl FromIterator<(Identifier, f64)> for RunMapping {
    fn from_iter<T: IntoIterator<Item = (Identifier, f64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Flat identifier -> history mapping persisted between invocations
///
/// A corpus produced by `merge`, `append` or `From<RunMapping>` is rectangular,
/// every history has the same length (the epoch count).
#[derive(Clone, Debug, Default)]
pub struct Corpus {
    histories: BTreeMap<Identifier, History>,
}

impl From<RunMapping> for Corpus {
    fn from(run: RunMapping) -> Self {
        Self {
            histories: run
                .values
                .into_iter()
                .map(|(identifier, value)| (identifier, vec![value]))
                .collect(),
        }
    }
}

impl FromIterator<(Identifier, History)> for Corpus {
    fn from_iter<T: IntoIterator<Item = (Identifier, History)>>(iter: T) -> Self {
        Self {
            histories: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Corpus {
    type Item = (Identifier, History);
    type IntoIter = btree_map::IntoIter<Identifier, History>;

    fn into_iter(self) -> Self::IntoIter {
        self.histories.into_iter()
    }
}

/// right pad `history` with the sentinel up to `length`
fn pad(mut history: History, length: usize) -> History {
    if history.len() < length {
        history.resize(length, MISSING);
    }

    history
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// longest history, taken as the number of epochs in this corpus
    pub fn epochs(&self) -> usize {
        self.histories.values().map(Vec::len).max().unwrap_or(0)
    }

    /// check that every history has the same length, returns that length
    pub fn validate(&self) -> Result<usize, CorpusError> {
        let expected = self.epochs();

        match self
            .histories
            .iter()
            .find(|(_, history)| history.len() != expected)
        {
            Some((identifier, history)) => Err(CorpusError::NonRectangular {
                identifier: identifier.encode(),
                expected,
                found: history.len(),
            }),
            None => Ok(expected),
        }
    }

    /// Epoch aligned concatenation of `self` (older) and `last` (newer)
    ///
    /// Each batch is padded to its own longest history before concatenating, so
    /// identifiers missing from one batch get sentinels in that batch's slots.
    #[tracing::instrument(level = "debug", skip_all, fields(first = self.len(), last = last.len()))]
    pub fn merge(self, last: Corpus) -> Corpus {
        let last_max = last.epochs();

        self.concat(last, last_max)
    }

    /// Append a single invocation as exactly one new epoch
    ///
    /// Unlike `merge`, an empty run still counts as an epoch and extends every
    /// history with one sentinel.
    #[tracing::instrument(level = "debug", skip_all, fields(first = self.len(), run = run.len()))]
    pub fn append(self, run: RunMapping) -> Corpus {
        self.concat(Corpus::from(run), 1)
    }

    fn concat(self, last: Corpus, last_max: usize) -> Corpus {
        let first_max = self.epochs();

        let mut first = self.histories;
        let mut last = last.histories;

        let keys = first
            .keys()
            .chain(last.keys())
            .cloned()
            .sorted()
            .dedup()
            .collect_vec();

        keys.into_iter()
            .map(|identifier| {
                let mut history = pad(first.remove(&identifier).unwrap_or_default(), first_max);
                history.extend(pad(last.remove(&identifier).unwrap_or_default(), last_max));

                (identifier, history)
            })
            .collect()
    }

    pub fn get(&self, identifier: &Identifier) -> Option<&[f64]> {
        self.histories.get(identifier).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Identifier, History> {
        self.histories.iter()
    }

    /// compare two corpora treating sentinels at the same position as equal
    pub fn same_as(&self, other: &Corpus) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|((left_id, left), (right_id, right))| {
                    left_id == right_id
                        && left.len() == right.len()
                        && left
                            .iter()
                            .zip(right.iter())
                            .all(|(a, b)| (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits())
                })
    }
}
