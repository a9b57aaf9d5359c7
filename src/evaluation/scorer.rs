use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::aggregate::{MetricScores, MetricSummary, RunScores, aggregate_runs};
use super::error::{EvaluationError, EvaluationResult};
use super::retry::{RetryPolicy, retry};

const CONTEXTS_PATH: &str = "/evaluate/contexts";
const RETRIEVAL_PATH: &str = "/evaluate/retrieval";

/// One question as handed to context scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRow {
    pub question: String,
    pub contexts: Vec<String>,
    pub answer: String,
    pub ground_truths: Vec<String>,
}

#[derive(Serialize)]
struct ContextsRequest<'a> {
    rows: &'a [EvaluationRow],
    metrics: &'a [&'a str],
}

#[derive(Serialize)]
struct RetrievalRequest<'a> {
    gold: &'a Path,
    guess: &'a Path,
    ks: &'a [usize],
    rank_keys: &'a [&'a str],
}

#[derive(Deserialize)]
struct ScoresResponse {
    scores: MetricScores,
}

/// External scoring library. Metric internals live on the other side.
#[async_trait]
pub trait ScoringBackend: Send + Sync {
    /// Context precision/recall style scoring of answered questions.
    async fn evaluate_contexts(
        &self,
        rows: &[EvaluationRow],
        metrics: &[&str],
    ) -> EvaluationResult<MetricScores>;

    /// KILT retrieval scoring of a guess file against a gold file.
    async fn evaluate_retrieval(
        &self,
        gold: &Path,
        guess: &Path,
        ks: &[usize],
        rank_keys: &[&str],
    ) -> EvaluationResult<MetricScores>;
}

/// Scoring backend reached over JSON HTTP.
#[derive(Debug, Clone)]
pub struct HttpScoringClient {
    http: HttpClient,
    base_url: String,
}

impl HttpScoringClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: HttpClient::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| HttpClient::new()),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn post_scores<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> EvaluationResult<MetricScores> {
        let url = self.url(path);
        debug!(url = %url, "Posting scoring request");

        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| EvaluationError::Request {
                url: url.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EvaluationError::UnexpectedStatus {
                url,
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ScoresResponse =
            resp.json()
                .await
                .map_err(|e| EvaluationError::InvalidResponse {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;
        Ok(parsed.scores)
    }
}

#[async_trait]
impl ScoringBackend for HttpScoringClient {
    async fn evaluate_contexts(
        &self,
        rows: &[EvaluationRow],
        metrics: &[&str],
    ) -> EvaluationResult<MetricScores> {
        self.post_scores(CONTEXTS_PATH, &ContextsRequest { rows, metrics })
            .await
    }

    async fn evaluate_retrieval(
        &self,
        gold: &Path,
        guess: &Path,
        ks: &[usize],
        rank_keys: &[&str],
    ) -> EvaluationResult<MetricScores> {
        self.post_scores(
            RETRIEVAL_PATH,
            &RetrievalRequest {
                gold,
                guess,
                ks,
                rank_keys,
            },
        )
        .await
    }
}

/// Per-run scores plus their aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct RunsOutcome {
    pub runs: Vec<RunScores>,
    pub summary: BTreeMap<String, MetricSummary>,
}

/// Scores `rows` `run_count` times, retrying each run under `policy`, and
/// aggregates the results.
pub async fn evaluate_runs<B>(
    backend: &B,
    rows: &[EvaluationRow],
    metrics: &[&str],
    run_count: usize,
    policy: &RetryPolicy,
) -> EvaluationResult<RunsOutcome>
where
    B: ScoringBackend + ?Sized,
{
    let started = Instant::now();
    let mut runs = Vec::with_capacity(run_count);

    for run in 0..run_count {
        info!(run, rows = rows.len(), "Starting scoring run");

        let scores = retry(policy, "evaluate_contexts", |_| {
            backend.evaluate_contexts(rows, metrics)
        })
        .await
        .map_err(|e| {
            let attempts = e.attempts();
            EvaluationError::RunFailed {
                run,
                attempts,
                last: Box::new(e.into_last()),
            }
        })?;

        info!(run, ?scores, "Scoring run finished");
        runs.push(RunScores::new(scores));
    }

    let summary = aggregate_runs(&mut runs);
    info!(
        runs = runs.len(),
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Evaluation finished"
    );

    Ok(RunsOutcome { runs, summary })
}
