use thiserror::Error;

/// Errors returned by a scoring backend.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// Transport-level failure talking to the scorer.
    #[error("scoring request to '{url}' failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The scorer answered with a non-success status.
    #[error("scorer at '{url}' returned HTTP {status}: {body}")]
    UnexpectedStatus { url: String, status: u16, body: String },

    /// The scorer answered 200 but the body was not `{"scores": {...}}`.
    #[error("malformed scorer response from '{url}': {reason}")]
    InvalidResponse { url: String, reason: String },

    /// The backend rejected the request for its own reasons.
    #[error("scoring backend failed: {0}")]
    Backend(String),

    /// A scoring run failed on every attempt.
    #[error("scoring run {run} failed after {attempts} attempts: {last}")]
    RunFailed {
        run: usize,
        attempts: u32,
        #[source]
        last: Box<EvaluationError>,
    },
}

pub type EvaluationResult<T> = Result<T, EvaluationError>;

/// Every attempt of a retried operation failed.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: E,
    },
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } => *attempts,
        }
    }

    /// The error of the final attempt.
    pub fn into_last(self) -> E {
        match self {
            RetryError::Exhausted { last, .. } => last,
        }
    }
}
