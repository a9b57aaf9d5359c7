use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::RwLock;

use super::client::SearchServiceClient;
use super::error::{ServiceError, ServiceResult};
use super::model::{DeleteOutcome, SearchResponse};

/// In-memory search service.
///
/// Uploaded files are read eagerly and kept per collection, so tests can
/// assert on what was indexed. Search answers come from canned responses
/// keyed by query text, falling back to the first `top_k` uploaded documents.
#[derive(Default)]
pub struct MockSearchService {
    state: RwLock<MockState>,
    canned: HashMap<String, Vec<String>>,
    failing_queries: HashSet<String>,
}

#[derive(Default)]
struct MockState {
    collections: HashMap<String, BTreeMap<String, String>>,
    deletes: usize,
    searches: Vec<String>,
}

impl MockSearchService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` with these chunks.
    pub fn with_response<I, S>(mut self, query: impl Into<String>, chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.canned
            .insert(query.into(), chunks.into_iter().map(Into::into).collect());
        self
    }

    /// Fail every search for `query`.
    pub fn failing_on(mut self, query: impl Into<String>) -> Self {
        self.failing_queries.insert(query.into());
        self
    }

    pub fn has_collection(&self, collection: &str) -> bool {
        self.state
            .read()
            .map(|s| s.collections.contains_key(collection))
            .unwrap_or(false)
    }

    /// `doc_name -> uploaded text` for `collection`.
    pub fn documents(&self, collection: &str) -> Option<BTreeMap<String, String>> {
        self.state.read().ok()?.collections.get(collection).cloned()
    }

    pub fn delete_count(&self) -> usize {
        self.state.read().map(|s| s.deletes).unwrap_or(0)
    }

    /// Queries in the order they were searched.
    pub fn searched_queries(&self) -> Vec<String> {
        self.state
            .read()
            .map(|s| s.searches.clone())
            .unwrap_or_default()
    }

    fn poisoned() -> ServiceError {
        ServiceError::Mock("lock poisoned".to_string())
    }
}

impl SearchServiceClient for MockSearchService {
    async fn delete_collection(&self, collection: &str) -> ServiceResult<DeleteOutcome> {
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;
        state.deletes += 1;
        Ok(match state.collections.remove(collection) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }

    async fn create_collection(&self, collection: &str) -> ServiceResult<()> {
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;
        state.collections.entry(collection.to_string()).or_default();
        Ok(())
    }

    async fn upsert_document(
        &self,
        collection: &str,
        doc_name: &str,
        source: &Path,
    ) -> ServiceResult<u64> {
        let text = std::fs::read_to_string(source).map_err(|e| ServiceError::Io {
            path: source.to_path_buf(),
            source: e,
        })?;
        let tokens = text.split_whitespace().count().max(1) as u64;

        let mut state = self.state.write().map_err(|_| Self::poisoned())?;
        let docs = state
            .collections
            .get_mut(collection)
            .ok_or_else(|| ServiceError::Mock(format!("collection '{}' not found", collection)))?;
        docs.insert(doc_name.to_string(), text);
        Ok(tokens)
    }

    async fn search(
        &self,
        collection: &str,
        query: &str,
        top_k: u32,
    ) -> ServiceResult<SearchResponse> {
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;
        state.searches.push(query.to_string());

        if self.failing_queries.contains(query) {
            return Err(ServiceError::Mock(format!("search failed for '{}'", query)));
        }

        if let Some(chunks) = self.canned.get(query) {
            return Ok(SearchResponse::retrieved(
                chunks.iter().take(top_k as usize).cloned().collect(),
            ));
        }

        let docs = state
            .collections
            .get(collection)
            .ok_or_else(|| ServiceError::Mock(format!("collection '{}' not found", collection)))?;
        Ok(SearchResponse::retrieved(
            docs.values().take(top_k as usize).cloned().collect(),
        ))
    }
}
