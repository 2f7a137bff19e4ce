#[cfg(test)]
mod parser_test;

use crate::{
    corpus::RunMapping,
    identifier::{Identifier, IdentifierError},
};
use std::{
    fs,
    num::{ParseFloatError, ParseIntError},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, trace};

/// only lines starting with this token carry measurements
pub const MEASUREMENT_PREFIX: &str = "CPU";
/// separates a measure name from its value inside a field
pub const VALUE_SEPARATOR: &str = ": ";

const FILE_PREFIX: &str = "out";

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("File name '{name}' must start with 'out_'")]
    NotAnOutput { name: String },
    #[error("File name '{name}' is missing the '{prefix}<N>' segment")]
    MissingSegment { name: String, prefix: &'static str },
    #[error("Segment '{segment}' of '{name}' is not an integer: {source}")]
    InvalidInteger {
        name: String,
        segment: String,
        source: ParseIntError,
    },
    #[error("Value of '{measure}' on line {line} is not a number: {source}")]
    InvalidValue {
        line: usize,
        measure: String,
        source: ParseFloatError,
    },
    #[error("Value of '{measure}' on line {line} is not finite")]
    NonFiniteValue { line: usize, measure: String },
    #[error("Invalid measure on line {line}: {source}")]
    InvalidMeasure {
        line: usize,
        source: IdentifierError,
    },
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// parameters of a run encoded in the output file name
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunParameters {
    pub tasklets: u32,
    pub bl: u32,
    pub dpus: u32,
}

/// Extract tasklets, bl and dpus from `out_tl<N>_bl<N>_dpus<N>[_...]`
pub fn parse_file_name(name: &str) -> Result<RunParameters, ParseError> {
    let mut segments = name.split('_');

    if segments.next() != Some(FILE_PREFIX) {
        return Err(ParseError::NotAnOutput {
            name: name.to_string(),
        });
    }

    let mut next_integer = |prefix: &'static str| {
        let segment = segments
            .next()
            .and_then(|segment| segment.strip_prefix(prefix).map(|value| (segment, value)));

        match segment {
            Some((segment, value)) => {
                value
                    .parse::<u32>()
                    .map_err(|source| ParseError::InvalidInteger {
                        name: name.to_string(),
                        segment: segment.to_string(),
                        source,
                    })
            }
            None => Err(ParseError::MissingSegment {
                name: name.to_string(),
                prefix,
            }),
        }
    };

    Ok(RunParameters {
        tasklets: next_integer("tl")?,
        bl: next_integer("bl")?,
        dpus: next_integer("dpus")?,
    })
}

/// Parse the content of a single output file
///
/// Within one file a later line overwrites an earlier value of the same measure.
pub fn parse_output(
    benchmark: &str,
    file_name: &str,
    content: &str,
) -> Result<RunMapping, ParseError> {
    let parameters = parse_file_name(file_name)?;
    let mut run = RunMapping::new();

    for (index, line) in content
        .lines()
        .enumerate()
        .filter(|(_, line)| line.starts_with(MEASUREMENT_PREFIX))
    {
        let line_number = index + 1;

        for field in line.split('\t') {
            let parts: Vec<&str> = field.split(VALUE_SEPARATOR).collect();

            let [measure, value] = parts[..] else {
                trace!(field = field, "Ignoring field without a single value");
                continue;
            };

            let value = value
                .trim()
                .parse::<f64>()
                .map_err(|source| ParseError::InvalidValue {
                    line: line_number,
                    measure: measure.to_string(),
                    source,
                })?;

            // NaN is reserved for missing entries in the history
            if !value.is_finite() {
                return Err(ParseError::NonFiniteValue {
                    line: line_number,
                    measure: measure.to_string(),
                });
            }

            let identifier = Identifier::new(
                benchmark,
                parameters.tasklets,
                parameters.bl,
                parameters.dpus,
                measure,
            )
            .map_err(|source| ParseError::InvalidMeasure {
                line: line_number,
                source,
            })?;

            run.insert(identifier, value);
        }
    }

    Ok(run)
}

/// Read and parse one output file of `benchmark`
#[tracing::instrument(level = "debug", skip(path), fields(path = ?path.as_ref()))]
pub fn parse_file(path: impl AsRef<Path>, benchmark: &str) -> Result<RunMapping, ParseError> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();

    let content = fs::read_to_string(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let run = parse_output(benchmark, &file_name, &content)?;
    debug!(measures = run.len(), "Parsed output file");

    Ok(run)
}
