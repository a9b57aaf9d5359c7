//! Run artifacts: per-question datasets, KILT guess/gold files, per-run and
//! total results, and the markdown summary table.

pub mod error;
pub mod guess;
pub mod writer;


pub use error::{ReportError, ReportResult};
pub use guess::{GuessMeta, GuessOutput, GuessProvenance, GuessRecord, UNATTRIBUTED_ID};
pub use writer::{
    filter_retrieval_metrics, results_to_md_table, save_results, save_rows_with_timestamp,
    timestamp, write_filtered_gold, write_json, write_jsonl,
};
