//! KILT-style benchmark records.
//!
//! Records are parsed into typed structures at load time, so a malformed line
//! (missing `id`, non-integer `wikipedia_id`, missing paragraph ids) fails
//! before any normalization or network work starts.

pub mod error;
pub mod loader;
pub mod model;

#[cfg(test)]
mod tests;

pub use error::{DatasetError, DatasetResult};
pub use loader::{
    RecordReader, find_split_file, parse_record, read_records, referenced_document_ids,
};
pub use model::{AnswerAnnotation, BenchmarkRecord, ProvenanceSpan};
