//! Indexing/Search Client for the retrieval service under evaluation.
//!
//! Every request carries a freshly built [`DbConfig`]; nothing is mutated
//! between calls. [`HttpSearchClient`] speaks the JSON HTTP API, and
//! `MockSearchService` (behind the `mock` feature) keeps uploads in memory.

pub mod client;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod model;
pub mod upload;


pub use client::{HttpSearchClient, SearchServiceClient, ServiceSettings};
pub use error::{ServiceError, ServiceResult};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockSearchService;
pub use model::{DbConfig, DeleteOutcome, SearchParam, SearchResponse};
pub use upload::{PassageUpload, upload_documents, upload_passages};
