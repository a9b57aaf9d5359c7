use std::path::PathBuf;

use thiserror::Error;

use crate::knowledge::KnowledgeError;

/// Errors returned by search-service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Transport-level failure.
    #[error("{operation} request to '{url}' failed: {source}")]
    Request {
        operation: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{operation} at '{url}' returned HTTP {status}: {body}")]
    UnexpectedStatus {
        operation: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    /// The body did not have the expected shape.
    #[error("malformed {operation} response from '{url}': {reason}")]
    InvalidResponse {
        operation: &'static str,
        url: String,
        reason: String,
    },

    /// Upsert succeeded but did not report a positive token count.
    #[error("upsert of '{doc_name}' reported token count {data}, expected a positive integer")]
    InvalidTokenCount { doc_name: String, data: String },

    /// Writing the upload file failed.
    #[error("upload file error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),

    /// Canned failure from the mock client.
    #[error("mock service failure: {0}")]
    Mock(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
