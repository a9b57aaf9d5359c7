use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::error::{PipelineError, PipelineResult};
use super::{DocGenType, MetricType, RunOptions};
use crate::constants::{CONTEXT_METRICS, RETRIEVAL_KS, RETRIEVAL_RANK_KEY};
use crate::dataset::BenchmarkRecord;
use crate::evaluation::{
    EvaluationError, EvaluationRow, MetricScores, RunsOutcome, ScoringBackend, evaluate_runs, retry,
};
use crate::knowledge::KnowledgeSource;
use crate::matching::{CandidateSet, PassageMatcher};
use crate::progress::progress_bar;
use crate::provenance::{NormalizedSplit, gold_candidates, normalize_documents, normalize_passages};
use crate::report::{
    GuessProvenance, GuessRecord, filter_retrieval_metrics, results_to_md_table, save_results,
    save_rows_with_timestamp, write_filtered_gold, write_json, write_jsonl,
};
use crate::service::{DeleteOutcome, SearchResponse, SearchServiceClient, upload_documents, upload_passages};

const DATASET_PREFIX: &str = "kilt_res";
const GUESS_FILE: &str = "guess_output.jsonl";
const FILTERED_GOLD_FILE: &str = "filtered_gold.jsonl";
const EVAL_RESULT_FILE: &str = "eval_result.json";

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RunReport {
    Contexts {
        dataset_path: PathBuf,
        result_dir: PathBuf,
        outcome: RunsOutcome,
        table: String,
        /// Retrieved chunks traced back to an indexed passage, when
        /// [`RunOptions::trace_chunks`] is set.
        indexed_hits: Option<usize>,
    },
    Retrieval {
        guess_path: PathBuf,
        gold_path: PathBuf,
        eval_result_path: PathBuf,
        scores: MetricScores,
        chunks: usize,
        attributed: usize,
    },
}

/// Drives one evaluation run against injected collaborators.
pub struct EvaluationPipeline<'a, C: ?Sized, K: ?Sized, S: ?Sized> {
    client: &'a C,
    knowledge: &'a K,
    scorer: &'a S,
    options: RunOptions,
}

impl<'a, C, K, S> EvaluationPipeline<'a, C, K, S>
where
    C: SearchServiceClient + ?Sized,
    K: KnowledgeSource + ?Sized,
    S: ScoringBackend + ?Sized,
{
    pub fn new(client: &'a C, knowledge: &'a K, scorer: &'a S, options: RunOptions) -> Self {
        Self {
            client,
            knowledge,
            scorer,
            options,
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Runs the whole flow over every record of the split.
    pub async fn run(&self, records: &[BenchmarkRecord]) -> PipelineResult<RunReport> {
        let opts = &self.options;
        info!(
            dataset = %opts.dataset,
            metric_type = %opts.metric_type,
            doc_gen_type = %opts.doc_gen_type,
            records = records.len(),
            "Starting evaluation run"
        );

        std::fs::create_dir_all(&opts.output_dir).map_err(|source| PipelineError::Io {
            path: opts.output_dir.clone(),
            source,
        })?;

        let (split, indexed) = self.prepare(records).await?;

        match opts.metric_type {
            MetricType::RagasScore => self.score_contexts(&split, indexed.as_ref()).await,
            MetricType::KiltScore => self.score_retrieval(records, &split).await,
        }
    }

    /// Normalizes, resets the collection and uploads. Single mode with
    /// chunk tracing also returns the indexed passages.
    async fn prepare(
        &self,
        records: &[BenchmarkRecord],
    ) -> PipelineResult<(NormalizedSplit<()>, Option<CandidateSet>)> {
        let opts = &self.options;
        let collection = opts.collection();

        match opts.doc_gen_type {
            DocGenType::Single => {
                let mut split = normalize_passages(records, self.knowledge)?;
                self.apply_query_limit(&mut split);
                self.reset_collection().await?;

                let upload = upload_passages(
                    self.client,
                    collection,
                    &opts.dataset,
                    &split.corpus,
                    &opts.scratch_dir,
                )
                .await?;
                let indexed = opts.trace_chunks.then_some(upload.candidates);
                Ok((split.map_corpus(|_| ()), indexed))
            }
            DocGenType::Multi => {
                let subset = match opts.query_limit() {
                    Some(n) => &records[..n.min(records.len())],
                    None => records,
                };
                let mut split = normalize_documents(subset, self.knowledge)?;
                self.apply_query_limit(&mut split);
                self.reset_collection().await?;

                upload_documents(
                    self.client,
                    collection,
                    &split.corpus,
                    self.knowledge,
                    &opts.scratch_dir,
                )
                .await?;
                Ok((split.map_corpus(|_| ()), None))
            }
        }
    }

    fn apply_query_limit<T>(&self, split: &mut NormalizedSplit<T>) {
        match self.options.query_limit() {
            Some(n) => {
                info!(limit = n, "Querying only the first questions");
                split.truncate(n);
            }
            None => info!("Querying every question"),
        }
    }

    async fn reset_collection(&self) -> PipelineResult<()> {
        let collection = self.options.collection();
        match self.client.delete_collection(collection).await? {
            DeleteOutcome::Deleted => debug!(collection, "Dropped previous collection"),
            DeleteOutcome::NotFound => debug!(collection, "No previous collection"),
        }
        self.client.create_collection(collection).await?;
        Ok(())
    }

    /// Searches once; a failed search becomes the sentinel response.
    async fn query(&self, text: &str) -> SearchResponse {
        match self
            .client
            .search(self.options.collection(), text, self.options.top_k)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(query = text, error = %e, "Search failed, recording sentinel");
                SearchResponse::failed()
            }
        }
    }

    async fn score_contexts(
        &self,
        split: &NormalizedSplit<()>,
        indexed: Option<&CandidateSet>,
    ) -> PipelineResult<RunReport> {
        let opts = &self.options;
        let matcher = PassageMatcher::unthresholded();
        let pb = progress_bar(split.questions.len(), "Queries");

        let mut rows = Vec::with_capacity(split.questions.len());
        let mut chunks = 0usize;
        let mut hits = 0usize;

        for (question, ground_truths) in split.questions.iter().zip(&split.gold_context_sets) {
            let response = self.query(question).await;

            if let Some(candidates) = indexed {
                chunks += response.contexts.len();
                hits += response
                    .contexts
                    .iter()
                    .filter(|chunk| matcher.attribute(chunk.trim(), candidates).is_some())
                    .count();
            }

            rows.push(EvaluationRow {
                question: question.clone(),
                contexts: response.contexts,
                answer: response.answer,
                ground_truths: ground_truths.clone(),
            });
            pb.inc(1);
        }
        pb.finish();

        let indexed_hits = indexed.map(|_| hits);
        if let Some(indexed_hits) = indexed_hits {
            info!(chunks, indexed_hits, "Retrieved chunks traced to indexed passages");
        }

        let dataset_path = save_rows_with_timestamp(&opts.output_dir, DATASET_PREFIX, &rows)?;

        let outcome = evaluate_runs(
            self.scorer,
            &rows,
            &CONTEXT_METRICS,
            opts.runs,
            &opts.retry_policy,
        )
        .await?;

        let result_dir = save_results(
            &opts.output_dir,
            &opts.result_name,
            &outcome.runs,
            &outcome.summary,
        )?;
        let table = results_to_md_table(&outcome.summary, &opts.result_name);

        Ok(RunReport::Contexts {
            dataset_path,
            result_dir,
            outcome,
            table,
            indexed_hits,
        })
    }

    async fn score_retrieval(
        &self,
        records: &[BenchmarkRecord],
        split: &NormalizedSplit<()>,
    ) -> PipelineResult<RunReport> {
        let opts = &self.options;
        let gold_by_id: HashMap<&str, &BenchmarkRecord> =
            records.iter().map(|r| (r.id.as_str(), r)).collect();
        let matcher = PassageMatcher::default();
        let pb = progress_bar(split.inputs.len(), "Queries");

        let mut guesses = Vec::with_capacity(split.inputs.len());
        let mut chunks = 0usize;
        let mut attributed = 0usize;

        for (input, id) in split.inputs.iter().zip(&split.ids) {
            let response = self.query(input).await;

            let gold = gold_by_id
                .get(id.as_str())
                .ok_or_else(|| PipelineError::MissingGoldRecord { id: id.clone() })?;
            let candidates = gold_candidates(gold, self.knowledge)?;

            let provenance: Vec<GuessProvenance> = response
                .contexts
                .iter()
                .map(|chunk| {
                    let found = matcher.find(chunk.trim(), &candidates);
                    GuessProvenance::new(
                        found.map(|m| m.document_id),
                        found.map(|m| m.text.to_string()),
                        chunk.as_str(),
                    )
                })
                .collect();

            chunks += provenance.len();
            attributed += provenance.iter().filter(|p| p.is_attributed()).count();
            guesses.push(GuessRecord::new(id, input, response.answer, provenance));
            pb.inc(1);
        }
        pb.finish();

        info!(chunks, attributed, "Attributed retrieved chunks to gold documents");

        let guess_path = opts.output_dir.join(GUESS_FILE);
        write_jsonl(&guess_path, &guesses)?;

        let gold_path = opts.output_dir.join(FILTERED_GOLD_FILE);
        let queried: HashSet<&str> = split.ids.iter().map(String::as_str).collect();
        write_filtered_gold(records, &queried, self.knowledge, &gold_path)?;

        let gold_abs = absolute(&gold_path)?;
        let guess_abs = absolute(&guess_path)?;
        let rank_keys = [RETRIEVAL_RANK_KEY];
        let scores = retry(&opts.retry_policy, "evaluate_retrieval", |_| {
            self.scorer
                .evaluate_retrieval(&gold_abs, &guess_abs, &RETRIEVAL_KS, &rank_keys)
        })
        .await
        .map_err(|e| {
            let attempts = e.attempts();
            EvaluationError::RunFailed {
                run: 0,
                attempts,
                last: Box::new(e.into_last()),
            }
        })?;

        let scores = filter_retrieval_metrics(&scores);
        let eval_result_path = opts.output_dir.join(EVAL_RESULT_FILE);
        write_json(&eval_result_path, &scores, 4)?;
        info!(path = %eval_result_path.display(), ?scores, "Saved retrieval metrics");

        Ok(RunReport::Retrieval {
            guess_path,
            gold_path,
            eval_result_path,
            scores,
            chunks,
            attributed,
        })
    }
}

fn absolute(path: &Path) -> PipelineResult<PathBuf> {
    std::path::absolute(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}
