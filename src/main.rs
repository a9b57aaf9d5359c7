//! Parrot-eval CLI entrypoint.
//!
//! ```bash
//! PARROT_EVAL_KNOWLEDGE_SOURCE=./datasets/kilt_knowledgesource.json \
//!     parrot-eval --dataset hotpotqa --metric-type kilt-score --doc-gen-type multi
//! ```

use std::path::PathBuf;

use clap::Parser;
use mimalloc::MiMalloc;

use parrot_eval::config::Config;
use parrot_eval::dataset::{find_split_file, read_records, referenced_document_ids};
use parrot_eval::evaluation::HttpScoringClient;
use parrot_eval::knowledge::load_jsonl_knowledge_source;
use parrot_eval::pipeline::{
    DEFAULT_DATASET, DEFAULT_RESULT_NAME, DEFAULT_SPLIT, DocGenType, EvaluationPipeline,
    MetricType, RunOptions, RunReport,
};
use parrot_eval::service::HttpSearchClient;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser, Debug)]
#[command(name = "parrot-eval")]
#[command(about = "Evaluate retrieval quality of a RAG search service on KILT benchmarks")]
struct Args {
    /// Benchmark name, matched against split file names
    #[arg(long, default_value = DEFAULT_DATASET)]
    dataset: String,

    /// Split name, matched against split file names
    #[arg(long, default_value = DEFAULT_SPLIT)]
    split: String,

    /// Collection name and result file prefix
    #[arg(long, default_value = DEFAULT_RESULT_NAME)]
    result_name: String,

    /// Chunks retrieved per query
    #[arg(long, default_value_t = parrot_eval::constants::DEFAULT_TOP_K)]
    top_k: u32,

    /// Ask the service to rerank retrieved chunks
    #[arg(long)]
    rerank: bool,

    /// Questions to issue (0 = all)
    #[arg(long, default_value_t = parrot_eval::constants::DEFAULT_PRE_QUERY_NUM)]
    pre_query_num: usize,

    #[arg(long, value_enum, default_value_t = MetricType::KiltScore)]
    metric_type: MetricType,

    #[arg(long, value_enum, default_value_t = DocGenType::Multi)]
    doc_gen_type: DocGenType,

    /// Trace retrieved chunks back to indexed passages (single mode, slow)
    #[arg(long)]
    trace_chunks: bool,

    /// Scoring passes (ragas-score only)
    #[arg(long, default_value_t = 1)]
    runs: usize,

    /// Overrides PARROT_EVAL_SERVICE_URL
    #[arg(long)]
    service_url: Option<String>,

    /// Overrides PARROT_EVAL_STORE_DOMAIN
    #[arg(long)]
    store_domain: Option<String>,

    /// Overrides PARROT_EVAL_KNOWLEDGE_SOURCE
    #[arg(long)]
    knowledge_source: Option<PathBuf>,
}

impl Args {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.service_url {
            config.service_url = url.clone();
        }
        if let Some(domain) = &self.store_domain {
            config.store_domain = domain.clone();
        }
        if let Some(path) = &self.knowledge_source {
            config.knowledge_source_path = Some(path.clone());
        }
    }

    fn run_options(&self, config: &Config) -> RunOptions {
        RunOptions {
            dataset: self.dataset.clone(),
            result_name: self.result_name.clone(),
            top_k: self.top_k,
            rerank: self.rerank.then_some(true),
            pre_query_num: self.pre_query_num,
            metric_type: self.metric_type,
            doc_gen_type: self.doc_gen_type,
            runs: self.runs,
            output_dir: config.output_root.join(&self.result_name),
            scratch_dir: config.data_dir.clone(),
            retry_policy: config.retry_policy(),
            trace_chunks: self.trace_chunks,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = run(Args::parse()).await {
        tracing::error!(error = %e, "Evaluation run aborted");
        return Err(e);
    }
    Ok(())
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;
    args.apply_overrides(&mut config);
    config.validate()?;
    let knowledge_path = config.require_knowledge_source()?.to_path_buf();

    let options = args.run_options(&config);
    tracing::info!(
        service_url = %config.service_url,
        scorer_url = %config.scorer_url,
        collection = options.collection(),
        output_dir = %options.output_dir.display(),
        "Parrot-eval starting"
    );

    let split_path = find_split_file(&args.dataset, &args.split, &config.data_dir)?;
    let records = read_records(&split_path, options.record_limit())?;

    let referenced = referenced_document_ids(&records);
    tracing::info!(documents = referenced.len(), "Loading knowledge source");
    let knowledge = load_jsonl_knowledge_source(&knowledge_path, Some(&referenced))?;

    let client = HttpSearchClient::new(config.service_settings(options.rerank));
    let scorer = HttpScoringClient::new(config.scorer_url.clone(), config.request_timeout);

    let pipeline = EvaluationPipeline::new(&client, &knowledge, &scorer, options);
    match pipeline.run(&records).await? {
        RunReport::Contexts {
            result_dir,
            table,
            indexed_hits,
            ..
        } => {
            println!("{}", table);
            tracing::info!(result_dir = %result_dir.display(), ?indexed_hits, "Evaluation complete");
        }
        RunReport::Retrieval {
            eval_result_path,
            scores,
            chunks,
            attributed,
            ..
        } => {
            println!("{}", serde_json::to_string_pretty(&scores)?);
            tracing::info!(
                path = %eval_result_path.display(),
                chunks,
                attributed,
                "Evaluation complete"
            );
        }
    }

    Ok(())
}
