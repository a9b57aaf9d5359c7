use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use super::error::{KnowledgeError, KnowledgeResult};
use super::{InMemoryKnowledgeSource, KnowledgePage};

/// Just the key; the rest of the line is skipped without allocating.
#[derive(Deserialize)]
struct PageKey<'a> {
    #[serde(rename = "_id", borrow)]
    stored_id: Cow<'a, str>,
}

#[derive(Deserialize)]
struct RawPage {
    wikipedia_id: String,
    #[serde(default)]
    wikipedia_title: Option<String>,
    text: Vec<String>,
}

fn parse_id(raw: &str, field: &str, line: usize) -> KnowledgeResult<u64> {
    raw.trim().parse().map_err(|_| KnowledgeError::InvalidPage {
        line,
        reason: format!("{} '{}' is not an integer", field, raw),
    })
}

/// Loads a KILT knowledge-source dump (one page per line).
///
/// When `wanted` is given only those pages are kept; the full dump holds
/// millions of pages and an evaluation run touches a few thousand. Missing
/// wanted pages are logged, and surface later as
/// [`KnowledgeError::DocumentNotFound`] at lookup time.
pub fn load_jsonl_knowledge_source(
    path: &Path,
    wanted: Option<&BTreeSet<u64>>,
) -> KnowledgeResult<InMemoryKnowledgeSource> {
    let file = File::open(path).map_err(|source| KnowledgeError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut source = InMemoryKnowledgeSource::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line_no = index + 1;
        let raw = line.map_err(|source| KnowledgeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if raw.trim().is_empty() {
            continue;
        }

        let invalid = |e: serde_json::Error| KnowledgeError::InvalidPage {
            line: line_no,
            reason: e.to_string(),
        };
        let key: PageKey<'_> = serde_json::from_str(&raw).map_err(invalid)?;
        let stored_id = parse_id(&key.stored_id, "_id", line_no)?;

        if let Some(wanted) = wanted
            && !wanted.contains(&stored_id)
        {
            continue;
        }

        let page: RawPage = serde_json::from_str(&raw).map_err(invalid)?;

        source.insert(KnowledgePage {
            stored_id,
            document_id: parse_id(&page.wikipedia_id, "wikipedia_id", line_no)?,
            title: page.wikipedia_title,
            paragraphs: page.text,
        });
    }

    if let Some(wanted) = wanted {
        let missing = wanted.iter().filter(|id| !source.contains(**id)).count();
        if missing > 0 {
            warn!(missing, "Referenced documents absent from knowledge source");
        }
    }

    info!(path = %path.display(), pages = source.len(), "Loaded knowledge source");
    Ok(source)
}
