use serde::Serialize;
use serde_json::{Map, Value};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum CanonicalizeError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("{program} rejected the document ({status}): {stderr}")]
    Rejected {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("Failed to run canonicalizer {program}: {source}")]
    Spawn { program: String, source: io::Error },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Turns a JSON document into a form where key order and whitespace no
/// longer matter.
pub trait Canonicalize {
    fn canonicalize(&self, json: &[u8]) -> Result<String, CanonicalizeError>;
}

/// In-process canonicalizer: sorted keys, two-space indentation.
///
/// Numbers keep their source text, so values that only agree after rounding
/// to `f64` stay distinct.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCanonicalizer;

impl Canonicalize for JsonCanonicalizer {
    fn canonicalize(&self, json: &[u8]) -> Result<String, CanonicalizeError> {
        let value: Value = serde_json::from_slice(json)?;
        Ok(serde_json::to_string_pretty(&sort_keys(value))?)
    }
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect::<Map<_, _>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Delegates to an external `<program> [args...] <path>` tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCanonicalizer {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessCanonicalizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Canonicalize for ProcessCanonicalizer {
    fn canonicalize(&self, json: &[u8]) -> Result<String, CanonicalizeError> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(json)?;
        file.flush()?;

        let program = self.program.display().to_string();
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(file.path())
            .output()
            .map_err(|source| CanonicalizeError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CanonicalizeError::Rejected {
                program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Match,
    Mismatch,
}

/// Which document failed to canonicalize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputSide {
    Expected,
    Actual,
}

#[derive(Debug, thiserror::Error)]
#[error("{side:?} output is malformed: {error}")]
pub struct Malformed {
    pub side: OutputSide,
    pub error: CanonicalizeError,
}

/// Compare two JSON documents by their canonical forms.
///
/// The result is binary; a document that cannot be canonicalized is reported
/// as `Malformed` rather than a mismatch.
pub fn compare(
    canonicalizer: &dyn Canonicalize,
    expected: &[u8],
    actual: &[u8],
) -> Result<Comparison, Malformed> {
    let actual = canonicalizer
        .canonicalize(actual)
        .map_err(|error| Malformed {
            side: OutputSide::Actual,
            error,
        })?;
    let expected = canonicalizer
        .canonicalize(expected)
        .map_err(|error| Malformed {
            side: OutputSide::Expected,
            error,
        })?;

    Ok(if expected == actual {
        Comparison::Match
    } else {
        Comparison::Mismatch
    })
}
