use crate::config::ConfigError;
use std::path::PathBuf;

/// How many records of an output file come from each source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitCounts {
    pub small: u64,
    pub big: u64,
}

impl SplitCounts {
    pub fn total(&self) -> u64 {
        self.small + self.big
    }
}

/// One output file of the synthesis run.
#[derive(Debug, Clone)]
pub struct PlanEntry {
    pub radius: f64,
    pub counts: SplitCounts,
    /// Records of the small circle, copied first.
    pub small_source: PathBuf,
    /// Records of the big circle, appended after the small ones.
    pub big_source: PathBuf,
    pub output: PathBuf,
}

/// The full, precomputed synthesis run.
#[derive(Debug, Clone)]
pub struct SynthesisPlan {
    pub record_size: u64,
    pub total_records: u64,
    pub entries: Vec<PlanEntry>,
}

impl SynthesisPlan {
    /// Exact byte length of every output file.
    pub fn output_len(&self) -> u64 {
        self.total_records * self.record_size
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(
        "{} holds {available_bytes} bytes, {required_records} records of {record_size} bytes are required",
        .path.display()
    )]
    ShortSource {
        path: PathBuf,
        required_records: u64,
        record_size: u64,
        available_bytes: u64,
    },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is {actual} bytes, expected {expected}", .path.display())]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },
}

impl SynthesisError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result of building one output file.
#[derive(Debug)]
pub struct SynthesisOutcome {
    pub radius: f64,
    pub output: PathBuf,
    /// Bytes written on success.
    pub result: Result<u64, SynthesisError>,
}
