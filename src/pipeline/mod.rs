//! Orchestration Driver.
//!
//! One run: normalize the split, reset the collection, upload gold text,
//! query every question, then score either retrieved contexts (ragas mode) or
//! attributed provenance (KILT mode) and write the artifacts.

pub mod driver;
pub mod error;


pub use driver::{EvaluationPipeline, RunReport};
pub use error::{PipelineError, PipelineResult};

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;

use crate::constants::{DEFAULT_PRE_QUERY_NUM, DEFAULT_TOP_K};
use crate::evaluation::RetryPolicy;

/// How retrieval quality is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MetricType {
    /// Context precision/recall over `(question, contexts, ground_truths)` rows.
    RagasScore,
    /// KILT retrieval metrics over attributed provenance.
    KiltScore,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::RagasScore => "ragas-score",
            MetricType::KiltScore => "kilt-score",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How gold text is packaged for indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DocGenType {
    /// All gold paragraphs in one uploaded document.
    Single,
    /// Every referenced page uploaded as its own document.
    Multi,
}

impl DocGenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocGenType::Single => "single",
            DocGenType::Multi => "multi",
        }
    }
}

impl fmt::Display for DocGenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-run choices, usually taken from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Benchmark name; also the document name in single mode.
    pub dataset: String,
    /// Names the collection and the result files.
    pub result_name: String,
    pub top_k: u32,
    pub rerank: Option<bool>,
    /// Question cap; `0` means every question.
    pub pre_query_num: usize,
    pub metric_type: MetricType,
    pub doc_gen_type: DocGenType,
    /// Scoring passes in ragas mode.
    pub runs: usize,
    /// Where this run's artifacts go.
    pub output_dir: PathBuf,
    /// Where upload files are staged.
    pub scratch_dir: PathBuf,
    pub retry_policy: RetryPolicy,
    /// Trace every retrieved chunk back to the indexed passages in single
    /// mode. Each chunk is matched against the whole upload, so this is
    /// quadratic in split size and off by default.
    pub trace_chunks: bool,
}

pub const DEFAULT_DATASET: &str = "hotpotqa";
pub const DEFAULT_SPLIT: &str = "dev";
pub const DEFAULT_RESULT_NAME: &str = "kilt_parrot_evaluation_res";

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dataset: DEFAULT_DATASET.to_string(),
            result_name: DEFAULT_RESULT_NAME.to_string(),
            top_k: DEFAULT_TOP_K,
            rerank: None,
            pre_query_num: DEFAULT_PRE_QUERY_NUM,
            metric_type: MetricType::KiltScore,
            doc_gen_type: DocGenType::Multi,
            runs: 1,
            output_dir: PathBuf::from("./outputs/kilt").join(DEFAULT_RESULT_NAME),
            scratch_dir: PathBuf::from("./datasets/kilt_data"),
            retry_policy: RetryPolicy::default(),
            trace_chunks: false,
        }
    }
}

impl RunOptions {
    /// `Some(n)` when questions are capped.
    pub fn query_limit(&self) -> Option<usize> {
        (self.pre_query_num > 0).then_some(self.pre_query_num)
    }

    /// Records that need loading from the split file. Multi mode only
    /// touches the first `pre_query_num`; single mode indexes gold passages
    /// of the whole split.
    pub fn record_limit(&self) -> Option<usize> {
        match self.doc_gen_type {
            DocGenType::Multi => self.query_limit(),
            DocGenType::Single => None,
        }
    }

    /// The collection queried and rebuilt by this run.
    pub fn collection(&self) -> &str {
        &self.result_name
    }
}
