use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::error::{DatasetError, DatasetResult};
use super::model::BenchmarkRecord;

/// Lazily parses one [`BenchmarkRecord`] per non-blank line.
pub struct RecordReader<R> {
    lines: Lines<R>,
    path: PathBuf,
    line: usize,
}

impl RecordReader<BufReader<File>> {
    /// Opens a JSONL benchmark file.
    pub fn open(path: impl AsRef<Path>) -> DatasetResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| DatasetError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file), path))
    }
}

impl<R: BufRead> RecordReader<R> {
    /// Wraps any buffered reader; `path` is only used in error messages.
    pub fn new(reader: R, path: PathBuf) -> Self {
        Self {
            lines: reader.lines(),
            path,
            line: 0,
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = DatasetResult<BenchmarkRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let raw = match self.lines.next()? {
                Ok(raw) => raw,
                Err(source) => {
                    return Some(Err(DatasetError::Io {
                        path: self.path.clone(),
                        source,
                    }));
                }
            };
            self.line += 1;

            if raw.trim().is_empty() {
                continue;
            }

            return Some(parse_record(&raw, self.line));
        }
    }
}

/// Parses and validates a single benchmark line.
pub fn parse_record(raw: &str, line: usize) -> DatasetResult<BenchmarkRecord> {
    let record: BenchmarkRecord =
        serde_json::from_str(raw).map_err(|e| DatasetError::InvalidRecord {
            line,
            reason: e.to_string(),
        })?;

    if record.id.trim().is_empty() {
        return Err(DatasetError::InvalidRecord {
            line,
            reason: "empty id".to_string(),
        });
    }

    Ok(record)
}

/// Reads a whole split, keeping at most `limit` records when given.
pub fn read_records(
    path: impl AsRef<Path>,
    limit: Option<usize>,
) -> DatasetResult<Vec<BenchmarkRecord>> {
    let path = path.as_ref();
    let reader = RecordReader::open(path)?;
    let records = match limit {
        Some(n) => reader.take(n).collect::<DatasetResult<Vec<_>>>()?,
        None => reader.collect::<DatasetResult<Vec<_>>>()?,
    };

    info!(path = %path.display(), records = records.len(), "Loaded benchmark split");
    Ok(records)
}

/// Finds the single `*.jsonl` file in `dir` whose name contains both `dataset` and `split`.
pub fn find_split_file(dataset: &str, split: &str, dir: &Path) -> DatasetResult<PathBuf> {
    let entries = std::fs::read_dir(dir).map_err(|source| DatasetError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut matches = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| DatasetError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.contains(dataset) && name.contains(split) && name.ends_with(".jsonl") {
            matches.push(entry.path());
        }
    }
    matches.sort();

    debug!(dataset, split, matches = matches.len(), "Scanned data directory");

    match matches.len() {
        0 => Err(DatasetError::SplitFileNotFound {
            dataset: dataset.to_string(),
            split: split.to_string(),
            dir: dir.to_path_buf(),
        }),
        1 => Ok(matches.remove(0)),
        _ => Err(DatasetError::AmbiguousSplitFile {
            dataset: dataset.to_string(),
            split: split.to_string(),
            matches,
        }),
    }
}

/// Every document id referenced by a provenance span of `records`.
pub fn referenced_document_ids(records: &[BenchmarkRecord]) -> BTreeSet<u64> {
    records
        .iter()
        .flat_map(|record| record.spans())
        .map(|span| span.document_id)
        .collect()
}
