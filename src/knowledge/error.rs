use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by knowledge-source lookups and loading.
pub enum KnowledgeError {
    /// No page is stored under the requested id.
    #[error("document not found in knowledge source: {document_id}")]
    DocumentNotFound { document_id: u64 },

    /// Reading the knowledge-source dump failed.
    #[error("failed to read knowledge source '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A dump line was not a valid page.
    #[error("invalid knowledge page on line {line}: {reason}")]
    InvalidPage { line: usize, reason: String },
}

pub type KnowledgeResult<T> = Result<T, KnowledgeError>;
