//! Cross-cutting, shared constants.
//!
//! Defaults for the search-service request shape, the fuzzy matcher and the
//! scoring retry policy live here so the CLI, the driver and the tests agree.

use std::time::Duration;

/// Number of context chunks requested per query.
pub const DEFAULT_TOP_K: u32 = 10;

/// Minimum longest-common-substring length a chunk must exceed to be credited
/// to one of its own record's gold passages.
pub const DEFAULT_MATCH_THRESHOLD: usize = 30;

/// Scoring attempts before giving up.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Fixed pause between scoring attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(2 * 60);

/// Default cap on the number of benchmark questions issued.
pub const DEFAULT_PRE_QUERY_NUM: usize = 200;

/// Substituted for the answer and the contexts when a search call fails.
pub const FAILED_SEARCH_SENTINEL: &str = "failed. please retry.";

/// The search service does not generate answers in retrieval mode.
pub const PLACEHOLDER_ANSWER: &str = "no answer.";

/// Paragraphs containing this marker start a new section in a dumped document.
pub const SECTION_MARKER: &str = "::::";

/// Cut-offs passed to the retrieval scorer.
pub const RETRIEVAL_KS: [usize; 2] = [1, 5];

/// Provenance key the retrieval scorer ranks on.
pub const RETRIEVAL_RANK_KEY: &str = "wikipedia_id";

/// Retrieval metrics kept in `eval_result.json`.
pub const RETRIEVAL_METRIC_KEYS: [&str; 5] = [
    "Rprec",
    "precision@1",
    "precision@5",
    "recall@5",
    "success_rate@5",
];

/// Context metrics requested from the scoring backend in ragas mode.
pub const CONTEXT_METRICS: [&str; 2] = ["context_precision", "context_recall"];

/// Composite metric that is always rendered as the last table row.
pub const COMPOSITE_METRIC: &str = "ragas_score";
