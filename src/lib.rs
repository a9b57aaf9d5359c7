//! Parrot-eval library crate (used by the CLI binary and integration tests).
//!
//! Measures how well a RAG search service retrieves the passages a KILT-style
//! benchmark marks as gold. One run resets a collection, uploads gold text,
//! queries every question, traces retrieved chunks back to gold documents and
//! scores the result.
//!
//! # Public API Surface
//!
//! ## Inputs
//! - [`BenchmarkRecord`], [`ProvenanceSpan`] - Benchmark split records
//! - [`KnowledgeSource`], [`KnowledgePage`] - Paragraph text by document id
//! - [`normalize_passages`], [`normalize_documents`] - Gold context extraction
//!
//! ## Matching
//! - [`PassageMatcher`], [`CandidateSet`] - Longest-common-substring attribution
//!
//! ## Collaborators
//! - [`SearchServiceClient`], [`HttpSearchClient`] - Search service adapter
//! - [`ScoringBackend`], [`HttpScoringClient`] - Metric scoring backend
//!
//! ## Orchestration
//! - [`EvaluationPipeline`], [`RunOptions`], [`RunReport`] - One evaluation run
//! - [`Config`] - Environment-backed settings
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod dataset;
pub mod evaluation;
pub mod hashing;
pub mod knowledge;
pub mod matching;
pub mod pipeline;
pub mod progress;
pub mod provenance;
pub mod report;
pub mod service;

pub use config::{Config, ConfigError};
pub use dataset::{
    AnswerAnnotation, BenchmarkRecord, DatasetError, ProvenanceSpan, find_split_file,
    read_records, referenced_document_ids,
};
pub use evaluation::{
    EvaluationError, EvaluationRow, HttpScoringClient, MetricScores, MetricSummary, RetryPolicy,
    RunScores, RunsOutcome, ScoringBackend, aggregate_runs, evaluate_runs,
};
#[cfg(any(test, feature = "mock"))]
pub use evaluation::MockScoringBackend;
pub use hashing::{hash_text, hash_to_u64};
pub use knowledge::{
    InMemoryKnowledgeSource, KnowledgeError, KnowledgePage, KnowledgeSource,
    load_jsonl_knowledge_source,
};
pub use matching::{CandidateSet, PassageMatch, PassageMatcher, longest_common_substring};
pub use pipeline::{
    DocGenType, EvaluationPipeline, MetricType, PipelineError, RunOptions, RunReport,
};
pub use provenance::{
    GoldPassage, NormalizeError, NormalizedSplit, normalize_documents, normalize_passages,
};
pub use report::{GuessRecord, ReportError, results_to_md_table};
#[cfg(any(test, feature = "mock"))]
pub use service::MockSearchService;
pub use service::{
    DeleteOutcome, HttpSearchClient, SearchResponse, SearchServiceClient, ServiceError,
    ServiceSettings,
};
