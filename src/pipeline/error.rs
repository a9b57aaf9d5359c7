use std::path::PathBuf;

use thiserror::Error;

use crate::evaluation::EvaluationError;
use crate::provenance::NormalizeError;
use crate::report::ReportError;
use crate::service::ServiceError;

/// Reasons an evaluation run aborts.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("output path error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A queried id has no gold record to attribute against.
    #[error("no gold record with id '{id}'")]
    MissingGoldRecord { id: String },
}

pub type PipelineResult<T> = Result<T, PipelineError>;
