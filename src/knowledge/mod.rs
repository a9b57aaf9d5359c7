//! Knowledge Source Adapter: document id -> ordered paragraphs.
//!
//! The adapter is always passed explicitly to the code that needs it; there is
//! no process-wide default instance. [`InMemoryKnowledgeSource`] backs both the
//! tests and the JSONL dump loader in [`jsonl`].

pub mod error;
pub mod jsonl;


pub use error::{KnowledgeError, KnowledgeResult};
pub use jsonl::load_jsonl_knowledge_source;

use std::collections::HashMap;
use std::sync::Arc;

use crate::constants::SECTION_MARKER;

/// One corpus document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgePage {
    /// Key the page is stored under (`_id` in the KILT dump).
    pub stored_id: u64,
    /// Document identity recorded in the page (`wikipedia_id`).
    pub document_id: u64,
    pub title: Option<String>,
    pub paragraphs: Vec<String>,
}

impl KnowledgePage {
    /// A page whose stored id and document id agree.
    pub fn new(document_id: u64, paragraphs: Vec<String>) -> Self {
        Self {
            stored_id: document_id,
            document_id,
            title: None,
            paragraphs,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn paragraph(&self, paragraph_id: usize) -> Option<&str> {
        self.paragraphs.get(paragraph_id).map(String::as_str)
    }

    /// `true` if the stored key and the recorded identity agree.
    pub fn is_consistent(&self) -> bool {
        self.stored_id == self.document_id
    }

    /// Whole-document text for upload: paragraphs concatenated, with a line
    /// break before every section heading paragraph.
    pub fn dump_text(&self) -> String {
        let mut out = String::with_capacity(self.paragraphs.iter().map(String::len).sum());
        for paragraph in &self.paragraphs {
            if paragraph.contains(SECTION_MARKER) {
                out.push('\n');
            }
            out.push_str(paragraph);
        }
        out
    }
}

/// Capability required by the normalizer, the matcher and the uploader.
pub trait KnowledgeSource: Send + Sync {
    /// Returns the page stored under `document_id`.
    fn get_page(&self, document_id: u64) -> KnowledgeResult<Arc<KnowledgePage>>;
}

impl<T: KnowledgeSource + ?Sized> KnowledgeSource for Arc<T> {
    fn get_page(&self, document_id: u64) -> KnowledgeResult<Arc<KnowledgePage>> {
        (**self).get_page(document_id)
    }
}

/// Pages held in a hash map, keyed by stored id.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKnowledgeSource {
    pages: HashMap<u64, Arc<KnowledgePage>>,
}

impl InMemoryKnowledgeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `page` under its `stored_id`, replacing any previous page.
    pub fn insert(&mut self, page: KnowledgePage) {
        self.pages.insert(page.stored_id, Arc::new(page));
    }

    pub fn with_page(mut self, page: KnowledgePage) -> Self {
        self.insert(page);
        self
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn contains(&self, document_id: u64) -> bool {
        self.pages.contains_key(&document_id)
    }
}

impl FromIterator<KnowledgePage> for InMemoryKnowledgeSource {
    fn from_iter<I: IntoIterator<Item = KnowledgePage>>(iter: I) -> Self {
        let mut source = Self::new();
        for page in iter {
            source.insert(page);
        }
        source
    }
}

impl KnowledgeSource for InMemoryKnowledgeSource {
    fn get_page(&self, document_id: u64) -> KnowledgeResult<Arc<KnowledgePage>> {
        self.pages
            .get(&document_id)
            .cloned()
            .ok_or(KnowledgeError::DocumentNotFound { document_id })
    }
}
