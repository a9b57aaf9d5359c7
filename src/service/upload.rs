use std::collections::BTreeSet;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::client::SearchServiceClient;
use super::error::{ServiceError, ServiceResult};
use crate::hashing::hash_text;
use crate::knowledge::KnowledgeSource;
use crate::matching::CandidateSet;
use crate::progress::progress_bar;
use crate::provenance::GoldPassage;

/// What a single-document upload leaves behind for attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassageUpload {
    /// Stripped passage text -> document id.
    pub candidates: CandidateSet,
    pub tokens: u64,
}

fn scratch_file(scratch_dir: &Path) -> ServiceResult<NamedTempFile> {
    tempfile::Builder::new()
        .prefix("parrot-eval-")
        .suffix(".txt")
        .tempfile_in(scratch_dir)
        .map_err(|source| ServiceError::Io {
            path: scratch_dir.to_path_buf(),
            source,
        })
}

fn absolute(path: &Path) -> ServiceResult<PathBuf> {
    std::path::absolute(path).map_err(|source| ServiceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(file: &mut NamedTempFile, chunks: &[&str]) -> ServiceResult<()> {
    let path = file.path().to_path_buf();
    let io_err = |source| ServiceError::Io {
        path: path.clone(),
        source,
    };

    let mut writer = BufWriter::new(file.as_file_mut());
    for chunk in chunks {
        writer.write_all(chunk.as_bytes()).map_err(io_err)?;
    }
    writer.flush().map_err(io_err)
}

/// Writes every passage, in order, to one file and indexes it as `doc_name`.
pub async fn upload_passages<C>(
    client: &C,
    collection: &str,
    doc_name: &str,
    passages: &[GoldPassage],
    scratch_dir: &Path,
) -> ServiceResult<PassageUpload>
where
    C: SearchServiceClient + ?Sized,
{
    let mut candidates = CandidateSet::new();
    for passage in passages {
        candidates.insert(passage.text.trim(), passage.document_id);
    }

    let mut file = scratch_file(scratch_dir)?;
    let texts: Vec<&str> = passages.iter().map(|p| p.text.as_str()).collect();
    write_file(&mut file, &texts)?;

    let source = absolute(file.path())?;
    let tokens = client.upsert_document(collection, doc_name, &source).await?;

    info!(
        collection,
        doc_name,
        passages = passages.len(),
        tokens,
        "Uploaded gold passages"
    );
    Ok(PassageUpload { candidates, tokens })
}

/// Uploads each referenced document as its own file, ascending by id.
/// Returns the summed token count.
pub async fn upload_documents<C, K>(
    client: &C,
    collection: &str,
    document_ids: &BTreeSet<u64>,
    knowledge: &K,
    scratch_dir: &Path,
) -> ServiceResult<u64>
where
    C: SearchServiceClient + ?Sized,
    K: KnowledgeSource + ?Sized,
{
    let pb = progress_bar(document_ids.len(), "Documents");
    let mut total_tokens = 0u64;

    for &document_id in document_ids {
        let page = knowledge.get_page(document_id)?;
        let text = page.dump_text();

        let mut file = scratch_file(scratch_dir)?;
        write_file(&mut file, &[&text])?;
        let source = absolute(file.path())?;

        let doc_name = document_id.to_string();
        let tokens = client.upsert_document(collection, &doc_name, &source).await?;
        total_tokens += tokens;

        debug!(
            document_id,
            content_hash = %format!("{:016x}", hash_text(&text)),
            tokens,
            "Uploaded document"
        );
        pb.inc(1);
    }
    pb.finish();

    info!(
        collection,
        documents = document_ids.len(),
        tokens = total_tokens,
        "Uploaded documents"
    );
    Ok(total_tokens)
}
