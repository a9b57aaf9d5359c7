use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// One question unit of a KILT-style benchmark split.
///
/// Fields the harness does not interpret are kept in `extra` so a record can be
/// written back out unchanged (see the filtered gold file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub id: String,
    pub input: String,
    #[serde(rename = "output")]
    pub outputs: Vec<AnswerAnnotation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BenchmarkRecord {
    /// Annotations that carry a `provenance` list, with their spans.
    pub fn annotated_spans(&self) -> impl Iterator<Item = &[ProvenanceSpan]> {
        self.outputs
            .iter()
            .filter_map(|annotation| annotation.provenance.as_deref())
    }

    /// Every provenance span of the record, in annotation order.
    pub fn spans(&self) -> impl Iterator<Item = &ProvenanceSpan> {
        self.annotated_spans().flatten()
    }
}

/// One human annotation of a record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnswerAnnotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// `None` when the key is absent; such annotations are skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Vec<ProvenanceSpan>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A pointer into the knowledge corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceSpan {
    #[serde(
        rename = "wikipedia_id",
        serialize_with = "serialize_document_id",
        deserialize_with = "deserialize_document_id"
    )]
    pub document_id: u64,
    pub start_paragraph_id: usize,
    pub end_paragraph_id: usize,
    /// Character offset into the paragraph; `None` means "from the start".
    #[serde(default)]
    pub start_character: Option<usize>,
    /// Character offset into the paragraph; `None` means "to the end".
    #[serde(default)]
    pub end_character: Option<usize>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProvenanceSpan {
    pub fn new(document_id: u64, paragraph_id: usize) -> Self {
        Self {
            document_id,
            start_paragraph_id: paragraph_id,
            end_paragraph_id: paragraph_id,
            start_character: None,
            end_character: None,
            extra: Map::new(),
        }
    }

    pub fn with_characters(mut self, start: usize, end: usize) -> Self {
        self.start_character = Some(start);
        self.end_character = Some(end);
        self
    }

    /// Records the full source paragraph under `meta.src_context`.
    pub fn annotate_source(&mut self, src_context: &str) {
        let meta = self
            .extra
            .entry("meta")
            .or_insert_with(|| Value::Object(Map::new()));
        if !meta.is_object() {
            *meta = Value::Object(Map::new());
        }
        if let Value::Object(fields) = meta {
            fields.insert(
                "src_context".to_string(),
                Value::String(src_context.to_string()),
            );
        }
    }
}

// KILT stores document ids as decimal strings; some tools emit bare integers.
fn deserialize_document_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Ok(n),
        RawId::Text(s) => s.trim().parse().map_err(|_| {
            serde::de::Error::custom(format!("wikipedia_id '{}' is not an integer", s))
        }),
    }
}

fn serialize_document_id<S>(document_id: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&document_id.to_string())
}
