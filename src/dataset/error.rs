use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while locating or parsing a benchmark split.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Reading a benchmark file or directory failed.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line could not be turned into a [`BenchmarkRecord`](super::BenchmarkRecord).
    #[error("invalid benchmark record on line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },

    /// No `*.jsonl` file in the data directory names both dataset and split.
    #[error("no '{split}' split file for dataset '{dataset}' in {dir}")]
    SplitFileNotFound {
        dataset: String,
        split: String,
        dir: PathBuf,
    },

    /// More than one file matched; the split to evaluate is ambiguous.
    #[error("expected one '{split}' split file for dataset '{dataset}', found {matches:?}")]
    AmbiguousSplitFile {
        dataset: String,
        split: String,
        matches: Vec<PathBuf>,
    },
}

pub type DatasetResult<T> = Result<T, DatasetError>;
