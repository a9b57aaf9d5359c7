use thiserror::Error;

use crate::knowledge::KnowledgeError;

/// Corrupt-input conditions found while normalizing a benchmark split.
///
/// All of these abort the run: they mean the benchmark file and the knowledge
/// source disagree, and nothing downstream can be trusted.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),

    /// The page returned for a lookup does not carry the requested identity.
    #[error(
        "document identity mismatch in record '{record_id}': requested {requested}, stored {stored_id}, recorded {document_id}"
    )]
    DocumentIdMismatch {
        record_id: String,
        requested: u64,
        stored_id: u64,
        document_id: u64,
    },

    /// Spans covering more than one paragraph are not supported.
    #[error(
        "record '{record_id}' has a multi-paragraph span in document {document_id}: paragraphs {start_paragraph_id}..{end_paragraph_id}"
    )]
    MultiParagraphSpan {
        record_id: String,
        document_id: u64,
        start_paragraph_id: usize,
        end_paragraph_id: usize,
    },

    /// The span points past the last paragraph of the document.
    #[error(
        "record '{record_id}' references paragraph {paragraph_id} of document {document_id}, which has {paragraph_count}"
    )]
    ParagraphOutOfRange {
        record_id: String,
        document_id: u64,
        paragraph_id: usize,
        paragraph_count: usize,
    },

    /// Parallel output lists drifted apart.
    #[error("normalized lists out of step: {left_name}={left} but {right_name}={right}")]
    CountInvariantViolated {
        left_name: &'static str,
        left: usize,
        right_name: &'static str,
        right: usize,
    },
}

pub type NormalizeResult<T> = Result<T, NormalizeError>;
