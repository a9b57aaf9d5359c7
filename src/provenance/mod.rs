//! Provenance Normalizer.
//!
//! Walks every record of a benchmark split and turns its nested provenance
//! spans into:
//!
//! - one question per annotation that carries a `provenance` list, paired with
//!   the exact gold snippets (`paragraph[start_character..end_character]`) of
//!   its spans, in span order and without deduplication;
//! - one `(input, id)` pair per record, regardless of annotation count;
//! - either the deduplicated, sorted [`GoldPassage`]s to index
//!   ([`normalize_passages`]) or just the referenced document ids
//!   ([`normalize_documents`]).
//!
//! Passages are deduplicated on `(document_id, start_paragraph_id,
//! end_paragraph_id)`; character offsets do not take part in identity.
//!
//! Every corrupt-input condition is returned as a [`NormalizeError`] and is
//! expected to abort the run.

pub mod error;


pub use error::{NormalizeError, NormalizeResult};

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, info};

use crate::dataset::{BenchmarkRecord, ProvenanceSpan};
use crate::knowledge::{KnowledgePage, KnowledgeSource};
use crate::matching::CandidateSet;

/// A deduplicated unit of indexable paragraph text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoldPassage {
    pub document_id: u64,
    pub paragraph_id: usize,
    /// Full paragraph text, not the annotated span.
    pub text: String,
}

/// Output of a normalization pass.
///
/// `questions[i]` pairs with `gold_context_sets[i]`; `inputs[j]` pairs with
/// `ids[j]`. The two pairs of lists have independent lengths.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSplit<C> {
    pub questions: Vec<String>,
    pub gold_context_sets: Vec<Vec<String>>,
    /// What gets indexed: passages or document ids.
    pub corpus: C,
    pub inputs: Vec<String>,
    pub ids: Vec<String>,
}

/// Single-document variant: paragraphs are uploaded as one batch.
pub type PassageSplit = NormalizedSplit<Vec<GoldPassage>>;

/// Multi-document variant: whole documents are fetched and uploaded by id.
pub type DocumentSplit = NormalizedSplit<BTreeSet<u64>>;

impl<C> NormalizedSplit<C> {
    /// Fails if the parallel lists are out of step.
    pub fn check_invariants(&self) -> NormalizeResult<()> {
        if self.questions.len() != self.gold_context_sets.len() {
            return Err(NormalizeError::CountInvariantViolated {
                left_name: "questions",
                left: self.questions.len(),
                right_name: "gold_context_sets",
                right: self.gold_context_sets.len(),
            });
        }
        if self.inputs.len() != self.ids.len() {
            return Err(NormalizeError::CountInvariantViolated {
                left_name: "inputs",
                left: self.inputs.len(),
                right_name: "ids",
                right: self.ids.len(),
            });
        }
        Ok(())
    }

    /// Keeps the first `n` question/context pairs and the first `n` input/id pairs.
    pub fn truncate(&mut self, n: usize) {
        self.questions.truncate(n);
        self.gold_context_sets.truncate(n);
        self.inputs.truncate(n);
        self.ids.truncate(n);
    }

    pub fn map_corpus<D>(self, f: impl FnOnce(C) -> D) -> NormalizedSplit<D> {
        NormalizedSplit {
            questions: self.questions,
            gold_context_sets: self.gold_context_sets,
            corpus: f(self.corpus),
            inputs: self.inputs,
            ids: self.ids,
        }
    }
}

#[derive(Default)]
struct SplitLists {
    questions: Vec<String>,
    gold_context_sets: Vec<Vec<String>>,
    inputs: Vec<String>,
    ids: Vec<String>,
}

impl SplitLists {
    fn into_split<C>(self, corpus: C) -> NormalizedSplit<C> {
        NormalizedSplit {
            questions: self.questions,
            gold_context_sets: self.gold_context_sets,
            corpus,
            inputs: self.inputs,
            ids: self.ids,
        }
    }
}

/// Builds question/context pairs plus the deduplicated gold passages, sorted by
/// `(document_id, paragraph_id)`.
pub fn normalize_passages<K>(
    records: &[BenchmarkRecord],
    knowledge: &K,
) -> NormalizeResult<PassageSplit>
where
    K: KnowledgeSource + ?Sized,
{
    let mut seen = HashSet::new();
    let mut passages = Vec::new();

    let lists = walk_records(records, knowledge, |span, paragraph| {
        let key = (
            span.document_id,
            span.start_paragraph_id,
            span.end_paragraph_id,
        );
        if seen.insert(key) {
            passages.push(GoldPassage {
                document_id: span.document_id,
                paragraph_id: span.start_paragraph_id,
                text: paragraph.to_string(),
            });
        }
    })?;

    passages.sort_by_key(|p| (p.document_id, p.paragraph_id));

    let split = lists.into_split(passages);
    split.check_invariants()?;

    info!(
        questions = split.questions.len(),
        inputs = split.inputs.len(),
        passages = split.corpus.len(),
        "Normalized benchmark split"
    );
    Ok(split)
}

/// Builds question/context pairs plus the set of referenced document ids.
pub fn normalize_documents<K>(
    records: &[BenchmarkRecord],
    knowledge: &K,
) -> NormalizeResult<DocumentSplit>
where
    K: KnowledgeSource + ?Sized,
{
    let mut document_ids = BTreeSet::new();

    let lists = walk_records(records, knowledge, |span, _| {
        document_ids.insert(span.document_id);
    })?;

    let split = lists.into_split(document_ids);
    split.check_invariants()?;

    info!(
        questions = split.questions.len(),
        inputs = split.inputs.len(),
        documents = split.corpus.len(),
        "Normalized benchmark split"
    );
    Ok(split)
}

fn walk_records<K, F>(
    records: &[BenchmarkRecord],
    knowledge: &K,
    mut visit: F,
) -> NormalizeResult<SplitLists>
where
    K: KnowledgeSource + ?Sized,
    F: FnMut(&ProvenanceSpan, &str),
{
    let mut lists = SplitLists::default();

    for record in records {
        lists.ids.push(record.id.clone());
        lists.inputs.push(record.input.clone());

        for spans in record.annotated_spans() {
            lists.questions.push(record.input.clone());

            let mut gold_context_set = Vec::with_capacity(spans.len());
            for span in spans {
                let page = knowledge.get_page(span.document_id)?;
                let paragraph = resolve_paragraph(&record.id, span, &page)?;
                gold_context_set.push(
                    char_slice(paragraph, span.start_character, span.end_character).to_string(),
                );
                visit(span, paragraph);
            }

            debug!(
                record_id = %record.id,
                spans = gold_context_set.len(),
                "Collected gold context set"
            );
            lists.gold_context_sets.push(gold_context_set);
        }
    }

    Ok(lists)
}

fn resolve_paragraph<'p>(
    record_id: &str,
    span: &ProvenanceSpan,
    page: &'p KnowledgePage,
) -> NormalizeResult<&'p str> {
    if !page.is_consistent() || page.stored_id != span.document_id {
        return Err(NormalizeError::DocumentIdMismatch {
            record_id: record_id.to_string(),
            requested: span.document_id,
            stored_id: page.stored_id,
            document_id: page.document_id,
        });
    }

    if span.start_paragraph_id != span.end_paragraph_id {
        return Err(NormalizeError::MultiParagraphSpan {
            record_id: record_id.to_string(),
            document_id: span.document_id,
            start_paragraph_id: span.start_paragraph_id,
            end_paragraph_id: span.end_paragraph_id,
        });
    }

    lookup_paragraph(record_id, span, page)
}

fn lookup_paragraph<'p>(
    record_id: &str,
    span: &ProvenanceSpan,
    page: &'p KnowledgePage,
) -> NormalizeResult<&'p str> {
    page.paragraph(span.start_paragraph_id)
        .ok_or_else(|| NormalizeError::ParagraphOutOfRange {
            record_id: record_id.to_string(),
            document_id: span.document_id,
            paragraph_id: span.start_paragraph_id,
            paragraph_count: page.paragraphs.len(),
        })
}

/// Full text of the paragraph a span starts in.
pub fn source_paragraph<K>(
    record_id: &str,
    span: &ProvenanceSpan,
    knowledge: &K,
) -> NormalizeResult<String>
where
    K: KnowledgeSource + ?Sized,
{
    let page = knowledge.get_page(span.document_id)?;
    lookup_paragraph(record_id, span, &page).map(str::to_string)
}

/// One record's gold paragraphs as matcher candidates (paragraph text -> document id).
pub fn gold_candidates<K>(record: &BenchmarkRecord, knowledge: &K) -> NormalizeResult<CandidateSet>
where
    K: KnowledgeSource + ?Sized,
{
    let mut candidates = CandidateSet::new();
    for span in record.spans() {
        let paragraph = source_paragraph(&record.id, span, knowledge)?;
        candidates.insert(paragraph, span.document_id);
    }
    Ok(candidates)
}

/// Slices `text` by character (not byte) offsets, clamping out-of-range bounds.
///
/// `None` bounds mean "from the start" and "to the end"; an empty range yields `""`.
pub fn char_slice(text: &str, start: Option<usize>, end: Option<usize>) -> &str {
    let byte_offset = |chars: usize| {
        text.char_indices()
            .nth(chars)
            .map(|(i, _)| i)
            .unwrap_or(text.len())
    };

    let from = start.map_or(0, byte_offset);
    let to = end.map_or(text.len(), byte_offset);

    if from >= to { "" } else { &text[from..to] }
}
