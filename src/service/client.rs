use std::future::Future;
use std::path::Path;
use std::time::Duration;

use reqwest::{Client as HttpClient, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::error::{ServiceError, ServiceResult};
use super::model::{
    CreateRequest, DbConfig, DeleteOutcome, SearchHit, SearchParam, SearchRequest, SearchResponse,
    ServiceEnvelope, UpsertRequest,
};

const DELETE_PATH: &str = "/api/v1/db/delete";
const CREATE_PATH: &str = "/api/v1/db/create";
const UPSERT_PATH: &str = "/api/v1/document/upsert";
const SEARCH_PATH: &str = "/api/v1/search";

/// Minimal async interface to the indexing/search service.
pub trait SearchServiceClient: Send + Sync {
    /// Drops `collection`. A missing collection yields [`DeleteOutcome::NotFound`].
    fn delete_collection(
        &self,
        collection: &str,
    ) -> impl Future<Output = ServiceResult<DeleteOutcome>> + Send;

    fn create_collection(&self, collection: &str) -> impl Future<Output = ServiceResult<()>> + Send;

    /// Indexes the file at `source` under `doc_name`; returns the tokens used.
    fn upsert_document(
        &self,
        collection: &str,
        doc_name: &str,
        source: &Path,
    ) -> impl Future<Output = ServiceResult<u64>> + Send;

    fn search(
        &self,
        collection: &str,
        query: &str,
        top_k: u32,
    ) -> impl Future<Output = ServiceResult<SearchResponse>> + Send;
}

/// Connection settings for [`HttpSearchClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    pub service_url: String,
    /// Host of the vector store the service writes to.
    pub store_domain: String,
    /// `None` leaves reranking to the service default.
    pub rerank: Option<bool>,
    pub timeout: Duration,
}

/// JSON-over-HTTP search service client.
#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    http: HttpClient,
    settings: ServiceSettings,
}

impl HttpSearchClient {
    pub fn new(settings: ServiceSettings) -> Self {
        Self {
            http: HttpClient::builder()
                .timeout(settings.timeout)
                .build()
                .unwrap_or_else(|_| HttpClient::new()),
            settings,
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Fresh collection descriptor for one request.
    pub fn db_config(&self, collection: &str) -> DbConfig {
        DbConfig::new(collection, &self.settings.store_domain, self.settings.rerank)
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.settings.service_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn post<B: Serialize + Sync>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
    ) -> ServiceResult<(String, reqwest::Response)> {
        let url = self.url(path);
        debug!(operation, url = %url, "Posting service request");

        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| ServiceError::Request {
                operation,
                url: url.clone(),
                source,
            })?;
        Ok((url, resp))
    }

    async fn expect_success(
        operation: &'static str,
        url: String,
        resp: reqwest::Response,
    ) -> ServiceResult<(String, reqwest::Response)> {
        let status = resp.status();
        if status.is_success() {
            return Ok((url, resp));
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ServiceError::UnexpectedStatus {
            operation,
            url,
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(
        operation: &'static str,
        url: String,
        resp: reqwest::Response,
    ) -> ServiceResult<T> {
        resp.json()
            .await
            .map_err(|e| ServiceError::InvalidResponse {
                operation,
                url,
                reason: e.to_string(),
            })
    }

    pub async fn delete_collection(&self, collection: &str) -> ServiceResult<DeleteOutcome> {
        let (url, resp) = self
            .post("delete", DELETE_PATH, &self.db_config(collection))
            .await?;

        let status = resp.status();
        if status.is_success() {
            info!(collection, "Deleted collection");
            return Ok(DeleteOutcome::Deleted);
        }

        let body = resp.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND || is_not_found_message(&body) {
            debug!(collection, "Collection did not exist");
            return Ok(DeleteOutcome::NotFound);
        }

        Err(ServiceError::UnexpectedStatus {
            operation: "delete",
            url,
            status: status.as_u16(),
            body,
        })
    }

    pub async fn create_collection(&self, collection: &str) -> ServiceResult<()> {
        let request = CreateRequest {
            db_config: self.db_config(collection),
        };
        let (url, resp) = self.post("create", CREATE_PATH, &request).await?;
        Self::expect_success("create", url, resp).await?;
        info!(collection, "Created collection");
        Ok(())
    }

    pub async fn upsert_document(
        &self,
        collection: &str,
        doc_name: &str,
        source: &Path,
    ) -> ServiceResult<u64> {
        let request = UpsertRequest {
            doc_name: doc_name.to_string(),
            source: source.to_string_lossy().into_owned(),
            db_config: self.db_config(collection),
        };
        let (url, resp) = self.post("upsert", UPSERT_PATH, &request).await?;
        let (url, resp) = Self::expect_success("upsert", url, resp).await?;
        let envelope: ServiceEnvelope<serde_json::Value> =
            Self::decode("upsert", url, resp).await?;

        let tokens = positive_token_count(&envelope.data).ok_or_else(|| {
            ServiceError::InvalidTokenCount {
                doc_name: doc_name.to_string(),
                data: envelope.data.to_string(),
            }
        })?;
        debug!(collection, doc_name, tokens, "Upserted document");
        Ok(tokens)
    }

    pub async fn search(
        &self,
        collection: &str,
        query: &str,
        top_k: u32,
    ) -> ServiceResult<SearchResponse> {
        let request = SearchRequest {
            query: query.to_string(),
            db_config: self.db_config(collection),
            search_param: SearchParam::top_k(top_k),
        };
        let (url, resp) = self.post("search", SEARCH_PATH, &request).await?;
        let (url, resp) = Self::expect_success("search", url, resp).await?;
        let envelope: ServiceEnvelope<Vec<SearchHit>> = Self::decode("search", url, resp).await?;

        let contexts: Vec<String> = envelope.data.into_iter().map(|hit| hit.chunk_text).collect();
        debug!(collection, chunks = contexts.len(), "Search returned");
        Ok(SearchResponse::retrieved(contexts))
    }
}

impl SearchServiceClient for HttpSearchClient {
    async fn delete_collection(&self, collection: &str) -> ServiceResult<DeleteOutcome> {
        self.delete_collection(collection).await
    }

    async fn create_collection(&self, collection: &str) -> ServiceResult<()> {
        self.create_collection(collection).await
    }

    async fn upsert_document(
        &self,
        collection: &str,
        doc_name: &str,
        source: &Path,
    ) -> ServiceResult<u64> {
        self.upsert_document(collection, doc_name, source).await
    }

    async fn search(
        &self,
        collection: &str,
        query: &str,
        top_k: u32,
    ) -> ServiceResult<SearchResponse> {
        self.search(collection, query, top_k).await
    }
}

/// Service error bodies that mean "nothing to delete".
pub(crate) fn is_not_found_message(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    lower.contains("not found") || lower.contains("not exist") || lower.contains("notfound")
}

/// Token counts must be JSON integers greater than zero.
pub(crate) fn positive_token_count(data: &serde_json::Value) -> Option<u64> {
    data.as_u64().filter(|&n| n > 0)
}
