use std::path::PathBuf;

use thiserror::Error;

use crate::provenance::NormalizeError;

/// Errors returned while writing run artifacts.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize '{path}': {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A gold span could not be resolved while annotating the filtered gold file.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

pub type ReportResult<T> = Result<T, ReportError>;
