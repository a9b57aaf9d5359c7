use serde::{Deserialize, Serialize};

/// Written in place of a document id when no gold passage matched.
pub const UNATTRIBUTED_ID: &str = "None";

/// One line of `guess_output.jsonl`, in KILT prediction format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessRecord {
    pub id: String,
    pub input: String,
    pub output: Vec<GuessOutput>,
}

impl GuessRecord {
    pub fn new(
        id: impl Into<String>,
        input: impl Into<String>,
        answer: impl Into<String>,
        provenance: Vec<GuessProvenance>,
    ) -> Self {
        Self {
            id: id.into(),
            input: input.into(),
            output: vec![GuessOutput {
                answer: answer.into(),
                provenance,
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessOutput {
    pub answer: String,
    pub provenance: Vec<GuessProvenance>,
}

/// A retrieved chunk, credited to a gold document when one matched.
///
/// Positional fields are always `null`: attribution is per document only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessProvenance {
    pub wikipedia_id: String,
    pub title: Option<String>,
    pub section: Option<String>,
    pub start_paragraph_id: Option<usize>,
    pub start_character: Option<usize>,
    pub end_paragraph_id: Option<usize>,
    pub end_character: Option<usize>,
    pub bleu_score: Option<f64>,
    pub meta: GuessMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessMeta {
    /// Gold passage the chunk was matched to.
    pub src_context: Option<String>,
    /// The chunk exactly as the service returned it.
    pub chunk_context: String,
}

impl GuessProvenance {
    pub fn new(
        document_id: Option<u64>,
        src_context: Option<String>,
        chunk_context: impl Into<String>,
    ) -> Self {
        Self {
            wikipedia_id: document_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| UNATTRIBUTED_ID.to_string()),
            title: None,
            section: None,
            start_paragraph_id: None,
            start_character: None,
            end_paragraph_id: None,
            end_character: None,
            bleu_score: None,
            meta: GuessMeta {
                src_context,
                chunk_context: chunk_context.into(),
            },
        }
    }

    pub fn is_attributed(&self) -> bool {
        self.wikipedia_id != UNATTRIBUTED_ID
    }
}
