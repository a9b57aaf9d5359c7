//! Run Aggregator, retry wrapper and the scoring-library seam.
//!
//! Metric computation itself is external: [`ScoringBackend`] is the contract,
//! [`HttpScoringClient`] talks to a scoring service, and `MockScoringBackend`
//! (behind the `mock` feature) stands in for it in tests.

pub mod aggregate;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod retry;
pub mod scorer;


pub use aggregate::{MetricScores, MetricSummary, RunScores, aggregate_runs};
pub use error::{EvaluationError, EvaluationResult, RetryError};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockScoringBackend;
pub use retry::{RetryPolicy, retry};
pub use scorer::{EvaluationRow, HttpScoringClient, RunsOutcome, ScoringBackend, evaluate_runs};
