
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, num::ParseIntError, str::FromStr};
use thiserror::Error;

/// field separator of the encoded form, it is not escaped
pub const SEPARATOR: char = ':';

const FIELDS: [&str; 5] = ["benchmark", "tasklets", "bl", "dpus", "measure"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("{field} '{value}' contains the reserved separator ':'")]
    ReservedSeparator { field: &'static str, value: String },
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
    #[error("Identifier '{0}' does not have exactly 5 fields")]
    FieldCount(String),
    #[error("{field} '{value}' is not an unsigned integer: {source}")]
    InvalidInteger {
        field: &'static str,
        value: String,
        source: ParseIntError,
    },
    #[error("{field} '{value}' is not written in canonical form")]
    NonCanonical { field: &'static str, value: String },
}

/// Key of a single measurement series
///
/// Encoded as `benchmark:tasklets:bl:dpus:measure`, e.g. `BS:4:1:64:CPU time (ms)`
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier {
    pub benchmark: String,
    pub tasklets: u32,
    pub bl: u32,
    pub dpus: u32,
    pub measure: String,
}

fn check_text(field: &'static str, value: &str) -> Result<(), IdentifierError> {
    if value.is_empty() {
        Err(IdentifierError::EmptyField { field })
    } else if value.contains(SEPARATOR) {
        Err(IdentifierError::ReservedSeparator {
            field,
            value: value.to_string(),
        })
    } else {
        Ok(())
    }
}

impl Identifier {
    /// build an identifier, rejecting names the encoding can't represent
    pub fn new(
        benchmark: impl Into<String>,
        tasklets: u32,
        bl: u32,
        dpus: u32,
        measure: impl Into<String>,
    ) -> Result<Self, IdentifierError> {
        let benchmark = benchmark.into();
        let measure = measure.into();

        check_text(FIELDS[0], &benchmark)?;
        check_text(FIELDS[4], &measure)?;

        Ok(Self {
            benchmark,
            tasklets,
            bl,
            dpus,
            measure,
        })
    }

    /// check a benchmark name before it ends up inside an identifier
    pub fn check_benchmark(name: &str) -> Result<(), IdentifierError> {
        check_text(FIELDS[0], name)
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}",
            self.benchmark, self.tasklets, self.bl, self.dpus, self.measure
        )
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(encoded: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = encoded.split(SEPARATOR).collect();

        let [benchmark, tasklets, bl, dpus, measure] = fields[..] else {
            return Err(IdentifierError::FieldCount(encoded.to_string()));
        };

        // only the canonical spelling is accepted, so one identifier has one encoding
        let integer = |index: usize, value: &str| {
            let number = value
                .parse::<u32>()
                .map_err(|source| IdentifierError::InvalidInteger {
                    field: FIELDS[index],
                    value: value.to_string(),
                    source,
                })?;

            if number.to_string() == value {
                Ok(number)
            } else {
                Err(IdentifierError::NonCanonical {
                    field: FIELDS[index],
                    value: value.to_string(),
                })
            }
        };

        Self::new(
            benchmark,
            integer(1, tasklets)?,
            integer(2, bl)?,
            integer(3, dpus)?,
            measure,
        )
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;

        encoded.parse().map_err(de::Error::custom)
    }
}
