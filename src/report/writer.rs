use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::info;

use super::error::{ReportError, ReportResult};
use crate::constants::{COMPOSITE_METRIC, RETRIEVAL_METRIC_KEYS};
use crate::dataset::BenchmarkRecord;
use crate::evaluation::{MetricScores, MetricSummary, RunScores};
use crate::knowledge::KnowledgeSource;
use crate::provenance::source_paragraph;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Local wall-clock time, as used in artifact names.
pub fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ReportError + '_ {
    move |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn create(path: &Path) -> ReportResult<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    File::create(path)
        .map(BufWriter::new)
        .map_err(io_error(path))
}

/// Writes one JSON document per line.
pub fn write_jsonl<'a, T, I>(path: &Path, rows: I) -> ReportResult<usize>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut writer = create(path)?;
    let mut count = 0;
    for row in rows {
        serde_json::to_writer(&mut writer, row).map_err(|source| ReportError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
        writer.write_all(b"\n").map_err(io_error(path))?;
        count += 1;
    }
    writer.flush().map_err(io_error(path))?;
    Ok(count)
}

/// Writes `value` as JSON indented by `indent` spaces.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, indent: usize) -> ReportResult<()> {
    let mut writer = create(path)?;
    let spaces = vec![b' '; indent];
    let mut ser = serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(&spaces));
    value
        .serialize(&mut ser)
        .map_err(|source| ReportError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
    writer.flush().map_err(io_error(path))
}

/// Saves the per-question rows as `<prefix>_<timestamp>.jsonl`.
pub fn save_rows_with_timestamp<T: Serialize>(
    output_dir: &Path,
    prefix: &str,
    rows: &[T],
) -> ReportResult<PathBuf> {
    let path = output_dir.join(format!("{}_{}.jsonl", prefix, timestamp()));
    let count = write_jsonl(&path, rows)?;
    info!(path = %path.display(), rows = count, "Saved evaluation dataset");
    Ok(path)
}

#[derive(Serialize)]
struct TotalResult<'a> {
    each_run_results: &'a [RunScores],
    total_result: &'a BTreeMap<String, MetricSummary>,
}

/// Writes `<output_dir>/<result_name>/<result_name>_<i>.json` per run and
/// `<result_name>_total_result.json` with every run plus the aggregate.
///
/// Returns the result directory.
pub fn save_results(
    output_dir: &Path,
    result_name: &str,
    runs: &[RunScores],
    summary: &BTreeMap<String, MetricSummary>,
) -> ReportResult<PathBuf> {
    let result_dir = output_dir.join(result_name);
    fs::create_dir_all(&result_dir).map_err(io_error(&result_dir))?;

    for (index, run) in runs.iter().enumerate() {
        let path = result_dir.join(format!("{}_{}.json", result_name, index));
        write_json(&path, run, 2)?;
    }

    let total_path = result_dir.join(format!("{}_total_result.json", result_name));
    write_json(
        &total_path,
        &TotalResult {
            each_run_results: runs,
            total_result: summary,
        },
        2,
    )?;

    info!(dir = %result_dir.display(), runs = runs.len(), "Saved all results");
    Ok(result_dir)
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Markdown table of `mean(var)` per metric; the composite score goes last.
///
/// Mean is rounded to 2 places and variance to 4, printed in shortest form
/// (`0.6`, not `0.60`).
pub fn results_to_md_table(summary: &BTreeMap<String, MetricSummary>, method_name: &str) -> String {
    let mut table = format!(
        "\n| Metric              | {}  |\n|---------------------|----------------|\n",
        method_name
    );
    let mut last_line = String::new();

    for (name, s) in summary {
        let line = format!(
            "|{} | {:?}({:?}) |\n",
            name,
            round_to(s.mean, 2),
            round_to(s.var, 4)
        );
        if name == COMPOSITE_METRIC {
            last_line = line;
        } else {
            table.push_str(&line);
        }
    }

    table.push_str(&last_line);
    table
}

/// Keeps only the retrieval metrics worth reporting.
pub fn filter_retrieval_metrics(scores: &MetricScores) -> MetricScores {
    scores
        .iter()
        .filter(|(name, _)| RETRIEVAL_METRIC_KEYS.contains(&name.as_str()))
        .map(|(name, value)| (name.clone(), *value))
        .collect()
}

/// Writes the gold records whose id was queried, with each span annotated
/// with its full source paragraph under `meta.src_context`.
///
/// Records keep their order in `records`. Returns the number written.
pub fn write_filtered_gold<K>(
    records: &[BenchmarkRecord],
    queried_ids: &HashSet<&str>,
    knowledge: &K,
    path: &Path,
) -> ReportResult<usize>
where
    K: KnowledgeSource + ?Sized,
{
    let mut kept = Vec::new();
    for record in records.iter().filter(|r| queried_ids.contains(r.id.as_str())) {
        let mut annotated = record.clone();
        for annotation in &mut annotated.outputs {
            for span in annotation.provenance.iter_mut().flatten() {
                let src_context = source_paragraph(&record.id, span, knowledge)?;
                span.annotate_source(&src_context);
            }
        }
        kept.push(annotated);
    }

    let count = write_jsonl(path, &kept)?;
    info!(path = %path.display(), records = count, "Saved filtered gold");
    Ok(count)
}
