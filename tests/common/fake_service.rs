//! In-process fake of the search service and the scoring backend.
//!
//! Uploaded files are read from the `source` path like the real service does;
//! search returns the non-empty lines of the collection's documents as chunks.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use parrot_eval::service::model::{CreateRequest, DbConfig, SearchRequest, UpsertRequest};

#[derive(Debug, Default)]
struct FakeState {
    collections: HashMap<String, BTreeMap<String, String>>,
    requests: Vec<(String, Value)>,
    failing_queries: HashSet<String>,
    zero_tokens: bool,
}

type Shared = Arc<Mutex<FakeState>>;

/// Knobs for [`spawn_fake_service`].
#[derive(Debug, Clone, Default)]
pub struct FakeServiceConfig {
    /// Queries answered with a 500.
    pub failing_queries: Vec<String>,
    /// Report zero tokens for every upsert.
    pub zero_tokens: bool,
}

pub struct FakeService {
    pub addr: SocketAddr,
    state: Shared,
    shutdown_tx: Option<oneshot::Sender<()>>,
    _handle: JoinHandle<()>,
}

impl FakeService {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Request bodies received on `path`, in arrival order.
    pub fn requests(&self, path: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, body)| body.clone())
            .collect()
    }

    pub fn documents(&self, collection: &str) -> Option<BTreeMap<String, String>> {
        self.state.lock().unwrap().collections.get(collection).cloned()
    }
}

impl Drop for FakeService {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

pub async fn find_available_port() -> std::io::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    Ok(listener.local_addr()?.port())
}

pub async fn spawn_fake_service(config: FakeServiceConfig) -> std::io::Result<FakeService> {
    let state: Shared = Arc::new(Mutex::new(FakeState {
        failing_queries: config.failing_queries.into_iter().collect(),
        zero_tokens: config.zero_tokens,
        ..Default::default()
    }));

    let app = Router::new()
        .route("/api/v1/db/delete", post(delete_collection))
        .route("/api/v1/db/create", post(create_collection))
        .route("/api/v1/document/upsert", post(upsert_document))
        .route("/api/v1/search", post(search))
        .route("/evaluate/contexts", post(evaluate_contexts))
        .route("/evaluate/retrieval", post(evaluate_retrieval))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;
    });

    Ok(FakeService {
        addr,
        state,
        shutdown_tx: Some(shutdown_tx),
        _handle: handle,
    })
}

fn record(state: &Shared, path: &str, body: &Value) {
    state
        .lock()
        .unwrap()
        .requests
        .push((path.to_string(), body.clone()));
}

fn bad_request(e: serde_json::Error) -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "msg": e.to_string() })),
    )
}

async fn delete_collection(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record(&state, "/api/v1/db/delete", &body);
    let config: DbConfig = match serde_json::from_value(body) {
        Ok(c) => c,
        Err(e) => return bad_request(e),
    };

    match state.lock().unwrap().collections.remove(&config.kb_id) {
        Some(_) => (StatusCode::OK, Json(json!({ "data": null }))),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "msg": format!("collection {} not exist", config.kb_id) })),
        ),
    }
}

async fn create_collection(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record(&state, "/api/v1/db/create", &body);
    let request: CreateRequest = match serde_json::from_value(body) {
        Ok(r) => r,
        Err(e) => return bad_request(e),
    };

    state
        .lock()
        .unwrap()
        .collections
        .entry(request.db_config.kb_id)
        .or_default();
    (StatusCode::OK, Json(json!({ "data": null })))
}

async fn upsert_document(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record(&state, "/api/v1/document/upsert", &body);
    let request: UpsertRequest = match serde_json::from_value(body) {
        Ok(r) => r,
        Err(e) => return bad_request(e),
    };

    let text = match std::fs::read_to_string(&request.source) {
        Ok(t) => t,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "msg": format!("cannot read {}: {}", request.source, e) })),
            );
        }
    };
    let tokens = text.split_whitespace().count();

    let mut guard = state.lock().unwrap();
    let zero_tokens = guard.zero_tokens;
    match guard.collections.get_mut(&request.db_config.kb_id) {
        Some(docs) => {
            docs.insert(request.doc_name, text);
            let data = if zero_tokens { 0 } else { tokens };
            (StatusCode::OK, Json(json!({ "data": data })))
        }
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "msg": "collection not exist" })),
        ),
    }
}

async fn search(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record(&state, "/api/v1/search", &body);
    let request: SearchRequest = match serde_json::from_value(body) {
        Ok(r) => r,
        Err(e) => return bad_request(e),
    };

    let guard = state.lock().unwrap();
    if guard.failing_queries.contains(&request.query) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "msg": "search backend unavailable" })),
        );
    }

    let Some(docs) = guard.collections.get(&request.db_config.kb_id) else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "msg": "collection not exist" })),
        );
    };

    let hits: Vec<Value> = docs
        .iter()
        .flat_map(|(doc_name, text)| {
            text.lines()
                .filter(|line| !line.trim().is_empty())
                .map(move |line| (doc_name, line))
        })
        .take(request.search_param.top_k as usize)
        .enumerate()
        .map(|(chunk_id, (doc_name, line))| {
            json!({ "doc_name": doc_name, "chunk_id": chunk_id, "chunk_text": line })
        })
        .collect();

    (StatusCode::OK, Json(json!({ "data": hits })))
}

async fn evaluate_contexts(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record(&state, "/evaluate/contexts", &body);
    (
        StatusCode::OK,
        Json(json!({
            "scores": {
                "context_precision": 0.8,
                "context_recall": 0.6,
                "ragas_score": 0.7
            }
        })),
    )
}

async fn evaluate_retrieval(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record(&state, "/evaluate/retrieval", &body);

    let readable = ["gold", "guess"].iter().all(|key| {
        body.get(key)
            .and_then(Value::as_str)
            .is_some_and(|p| std::path::Path::new(p).is_file())
    });
    if !readable {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "msg": "gold or guess file missing" })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "scores": {
                "Rprec": 1.0,
                "precision@1": 1.0,
                "precision@5": 0.25,
                "recall@5": 1.0,
                "success_rate@5": 1.0,
                "entity_recall": 0.3
            }
        })),
    )
}
