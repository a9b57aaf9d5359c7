use serde::{Deserialize, Serialize};

use crate::constants::{FAILED_SEARCH_SENTINEL, PLACEHOLDER_ANSWER};

pub const DEFAULT_DB_ID: &str = "test-001";
pub const DEFAULT_LANG: &str = "en";
pub const DEFAULT_EMBEDDING: &str = "bge-base";
/// `-1` lets the service pick its own chunking limit.
pub const UNLIMITED_CHUNKS: i64 = -1;
pub const MILVUS_PORT: u16 = 19530;
pub const SEARCH_OUTPUT_FIELDS: [&str; 3] = ["doc_name", "chunk_id", "chunk_text"];

/// Collection descriptor sent with every request. Built fresh per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbConfig {
    pub db_id: String,
    pub lang: String,
    pub chunk_limit: i64,
    pub embedding: String,
    pub rerank: Option<bool>,
    pub kb_id: String,
    pub milvus: MilvusConfig,
}

impl DbConfig {
    pub fn new(kb_id: &str, store_domain: &str, rerank: Option<bool>) -> Self {
        Self {
            db_id: DEFAULT_DB_ID.to_string(),
            lang: DEFAULT_LANG.to_string(),
            chunk_limit: UNLIMITED_CHUNKS,
            embedding: DEFAULT_EMBEDDING.to_string(),
            rerank,
            kb_id: kb_id.to_string(),
            milvus: MilvusConfig {
                uri: format!("http://{}:{}", store_domain, MILVUS_PORT),
                token: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilvusConfig {
    pub uri: String,
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParam {
    pub top_k: u32,
    pub offset: u32,
    pub output_fields: Vec<String>,
    pub expr: Option<String>,
}

impl SearchParam {
    pub fn top_k(top_k: u32) -> Self {
        Self {
            top_k,
            offset: 0,
            output_fields: SEARCH_OUTPUT_FIELDS.iter().map(|f| f.to_string()).collect(),
            expr: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub db_config: DbConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertRequest {
    pub doc_name: String,
    /// Absolute path readable by the service.
    pub source: String,
    pub db_config: DbConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub db_config: DbConfig,
    pub search_param: SearchParam,
}

/// One retrieved chunk. Only `chunk_text` is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_name: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<serde_json::Value>,
}

/// Envelope of every service response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEnvelope<T> {
    pub data: T,
}

/// Answer and retrieved contexts for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub answer: String,
    pub contexts: Vec<String>,
}

impl SearchResponse {
    /// Retrieval-only search: the service does not generate an answer.
    pub fn retrieved(contexts: Vec<String>) -> Self {
        Self {
            answer: PLACEHOLDER_ANSWER.to_string(),
            contexts,
        }
    }

    /// Stand-in recorded when a query fails, so the run can continue.
    pub fn failed() -> Self {
        Self {
            answer: FAILED_SEARCH_SENTINEL.to_string(),
            contexts: vec![FAILED_SEARCH_SENTINEL.to_string()],
        }
    }

    pub fn is_failed(&self) -> bool {
        self.answer == FAILED_SEARCH_SENTINEL
    }
}

/// Result of deleting a collection. A missing collection is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}
