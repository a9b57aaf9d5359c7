use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;

use super::aggregate::MetricScores;
use super::error::{EvaluationError, EvaluationResult};
use super::scorer::{EvaluationRow, ScoringBackend};

/// In-process scorer returning canned scores.
///
/// `fail_times(n)` makes the first `n` context-scoring calls fail, to exercise
/// the retry path.
#[derive(Debug, Default)]
pub struct MockScoringBackend {
    context_scores: MetricScores,
    retrieval_scores: MetricScores,
    failures_left: AtomicU32,
    context_calls: AtomicUsize,
    retrieval_calls: Mutex<Vec<(PathBuf, PathBuf)>>,
    last_rows: Mutex<Vec<EvaluationRow>>,
}

impl MockScoringBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context_scores<I, S>(mut self, scores: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        self.context_scores = scores.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self
    }

    pub fn with_retrieval_scores<I, S>(mut self, scores: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        self.retrieval_scores = scores.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self
    }

    pub fn fail_times(self, n: u32) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    pub fn context_calls(&self) -> usize {
        self.context_calls.load(Ordering::SeqCst)
    }

    /// `(gold, guess)` paths of every retrieval call so far.
    pub fn retrieval_calls(&self) -> Vec<(PathBuf, PathBuf)> {
        self.retrieval_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Rows of the most recent context-scoring call.
    pub fn last_rows(&self) -> Vec<EvaluationRow> {
        self.last_rows
            .lock()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ScoringBackend for MockScoringBackend {
    async fn evaluate_contexts(
        &self,
        rows: &[EvaluationRow],
        metrics: &[&str],
    ) -> EvaluationResult<MetricScores> {
        self.context_calls.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(EvaluationError::Backend("mock scorer unavailable".to_string()));
        }

        if let Ok(mut last) = self.last_rows.lock() {
            *last = rows.to_vec();
        }

        Ok(self
            .context_scores
            .iter()
            .filter(|(name, _)| {
                metrics.contains(&name.as_str()) || name.as_str() == crate::constants::COMPOSITE_METRIC
            })
            .map(|(name, score)| (name.clone(), *score))
            .collect())
    }

    async fn evaluate_retrieval(
        &self,
        gold: &Path,
        guess: &Path,
        _ks: &[usize],
        _rank_keys: &[&str],
    ) -> EvaluationResult<MetricScores> {
        if let Ok(mut calls) = self.retrieval_calls.lock() {
            calls.push((gold.to_path_buf(), guess.to_path_buf()));
        }
        Ok(self.retrieval_scores.clone())
    }
}
