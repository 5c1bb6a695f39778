//! HTTP and WebSocket routes of the document server.
//!
//! - `GET /health`: health check (no auth required)
//! - `GET /collections/{collection}`: collection snapshot
//! - `PUT /collections/{collection}/{id}`: overwrite a document
//! - `PATCH /collections/{collection}/{id}`: merge fields into a document
//! - `DELETE /collections/{collection}/{id}`: remove a document
//! - `GET /collections/{collection}/subscribe`: WebSocket stream of snapshots

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, put},
    Extension, Json, Router,
};
use futures::{SinkExt, StreamExt};
use oxytrack_core::{Collection, RemoteDocument, SnapshotMessage};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tower_http::trace::TraceLayer;

use super::auth::{auth_middleware, ApiKeyStore, AuthUser};
use super::hub::CollectionHub;
use super::storage::{DocumentStorage, Fields, StorageError};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<RwLock<DocumentStorage>>,
    pub hub: Arc<CollectionHub>,
    pub api_keys: Arc<ApiKeyStore>,
}

impl AppState {
    pub fn new(storage: DocumentStorage, api_keys: ApiKeyStore) -> Self {
        Self {
            storage: Arc::new(RwLock::new(storage)),
            hub: Arc::new(CollectionHub::new()),
            api_keys: Arc::new(api_keys),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(health));

    let protected_routes = Router::new()
        .route("/collections/{collection}", get(list_documents))
        .route("/collections/{collection}/subscribe", get(subscribe))
        .route(
            "/collections/{collection}/{id}",
            put(set_document).patch(merge_document).delete(delete_document),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug)]
pub enum ApiError {
    UnknownCollection(String),
    Storage(StorageError),
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        ApiError::Storage(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            ApiError::UnknownCollection(_) => (StatusCode::NOT_FOUND, "unknown_collection"),
            ApiError::Storage(StorageError::InvalidId(_)) => (StatusCode::BAD_REQUEST, "invalid_id"),
            ApiError::Storage(e) => {
                tracing::error!("Storage error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error")
            }
        };
        let message = match self {
            ApiError::UnknownCollection(name) => format!("Unknown collection: {}", name),
            ApiError::Storage(e) => e.to_string(),
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

fn parse_collection(name: &str) -> Result<Collection, ApiError> {
    Collection::parse(name).ok_or_else(|| ApiError::UnknownCollection(name.to_string()))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn list_documents(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<Json<SnapshotMessage>, ApiError> {
    let collection = parse_collection(&collection)?;
    let documents = state.storage.read().await.list(collection)?;
    Ok(Json(SnapshotMessage {
        collection,
        documents,
    }))
}

#[derive(Clone, Copy)]
enum Change {
    Set,
    Merge,
}

async fn write_document(
    state: &AppState,
    user: &AuthUser,
    collection: &str,
    id: &str,
    data: Fields,
    change: Change,
) -> Result<StatusCode, ApiError> {
    let collection = parse_collection(collection)?;

    // Held through the broadcast so snapshots go out in write order
    let storage = state.storage.write().await;
    match change {
        Change::Set => storage.set(collection, id, data)?,
        Change::Merge => storage.merge(collection, id, data)?,
    }
    let snapshot = storage.list(collection)?;
    state.hub.broadcast(collection, snapshot).await;
    drop(storage);

    tracing::debug!(user = %user.user_id, %collection, id, "Document written");
    Ok(StatusCode::NO_CONTENT)
}

async fn set_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((collection, id)): Path<(String, String)>,
    Json(data): Json<Fields>,
) -> Result<StatusCode, ApiError> {
    write_document(&state, &user, &collection, &id, data, Change::Set).await
}

async fn merge_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((collection, id)): Path<(String, String)>,
    Json(data): Json<Fields>,
) -> Result<StatusCode, ApiError> {
    write_document(&state, &user, &collection, &id, data, Change::Merge).await
}

/// Deleting a missing document succeeds; only real removals are broadcast.
async fn delete_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let collection = parse_collection(&collection)?;

    let storage = state.storage.write().await;
    if storage.delete(collection, &id)? {
        let snapshot = storage.list(collection)?;
        state.hub.broadcast(collection, snapshot).await;
        tracing::debug!(user = %user.user_id, %collection, id, "Document deleted");
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn subscribe(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(collection): Path<String>,
) -> Result<Response, ApiError> {
    let collection = parse_collection(&collection)?;
    tracing::info!(user = %user.user_id, %collection, "Subscriber connected");
    Ok(ws.on_upgrade(move |socket| stream_snapshots(socket, state, collection)))
}

async fn current_snapshot(state: &AppState, collection: Collection) -> Option<Vec<RemoteDocument>> {
    match state.storage.read().await.list(collection) {
        Ok(documents) => Some(documents),
        Err(e) => {
            tracing::error!(%collection, "Failed to read collection: {}", e);
            None
        }
    }
}

async fn send_snapshot(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    collection: Collection,
    documents: Vec<RemoteDocument>,
) -> bool {
    let message = SnapshotMessage {
        collection,
        documents,
    };
    let json = match serde_json::to_string(&message) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to encode snapshot: {}", e);
            return false;
        }
    };
    sender.send(Message::Text(json.into())).await.is_ok()
}

/// Sends the collection on connect, then again after every change, until
/// the client goes away.
async fn stream_snapshots(socket: WebSocket, state: AppState, collection: Collection) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe first so a write between the read and the loop is not missed
    let mut updates = state.hub.subscribe(collection).await;

    let Some(initial) = current_snapshot(&state, collection).await else {
        return;
    };
    if !send_snapshot(&mut sender, collection, initial).await {
        return;
    }

    loop {
        tokio::select! {
            update = updates.recv() => {
                let documents = match update {
                    Ok(documents) => documents,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(%collection, skipped, "Subscriber lagged, resending");
                        match current_snapshot(&state, collection).await {
                            Some(documents) => documents,
                            None => break,
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if !send_snapshot(&mut sender, collection, documents).await {
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // Subscribers only listen
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::info!(%collection, "Subscriber disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::auth::ApiKeyEntry;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const KEY: &str = "test-key";

    fn setup() -> (AppState, TempDir) {
        let temp = TempDir::new().unwrap();
        let api_keys = ApiKeyStore::from_entries([ApiKeyEntry {
            key: KEY.to_string(),
            user_id: "station1".to_string(),
        }]);
        let state = AppState::new(DocumentStorage::new(temp.path()), api_keys);
        (state, temp)
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", KEY));
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (state, _temp) = setup();
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_collections_require_auth() {
        let (state, _temp) = setup();

        let missing = Request::builder()
            .uri("/collections/sales")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&state, missing).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing_auth");

        let wrong = Request::builder()
            .uri("/collections/sales")
            .header(header::AUTHORIZATION, "Bearer nope")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&state, wrong).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid_key");

        let basic = Request::builder()
            .uri("/collections/sales")
            .header(header::AUTHORIZATION, "Basic abc")
            .body(Body::empty())
            .unwrap();
        let (_, body) = send(&state, basic).await;
        assert_eq!(body["error"], "invalid_auth");
    }

    #[tokio::test]
    async fn test_query_key_is_accepted() {
        let (state, _temp) = setup();
        let request = Request::builder()
            .uri(format!("/collections/sales?key={}", KEY))
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["collection"], "sales");
    }

    #[tokio::test]
    async fn test_put_then_list() {
        let (state, _temp) = setup();

        let (status, _) = send(
            &state,
            request(
                "PUT",
                "/collections/sales/s1",
                Some(json!({"clientName": "Clinique A", "status": "pending"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&state, request("GET", "/collections/sales", None)).await;
        assert_eq!(status, StatusCode::OK);
        let snapshot: SnapshotMessage = serde_json::from_value(body).unwrap();
        assert_eq!(snapshot.collection, Collection::Sales);
        assert_eq!(snapshot.documents.len(), 1);
        assert_eq!(snapshot.documents[0].id, "s1");
        assert_eq!(snapshot.documents[0].data["clientName"], "Clinique A");
    }

    #[tokio::test]
    async fn test_patch_merges_fields() {
        let (state, _temp) = setup();
        send(
            &state,
            request(
                "PUT",
                "/collections/settings/global",
                Some(json!({"companyName": "OxyTrack", "defaultProducer": "Ali"})),
            ),
        )
        .await;
        send(
            &state,
            request(
                "PATCH",
                "/collections/settings/global",
                Some(json!({"defaultProducer": "Sara"})),
            ),
        )
        .await;

        let (_, body) = send(&state, request("GET", "/collections/settings", None)).await;
        let data = &body["documents"][0]["data"];
        assert_eq!(data["companyName"], "OxyTrack");
        assert_eq!(data["defaultProducer"], "Sara");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (state, _temp) = setup();
        send(
            &state,
            request("PUT", "/collections/productions/p1", Some(json!({}))),
        )
        .await;

        let (status, _) = send(&state, request("DELETE", "/collections/productions/p1", None)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&state, request("DELETE", "/collections/productions/p1", None)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = send(&state, request("GET", "/collections/productions", None)).await;
        assert_eq!(body["documents"], json!([]));
    }

    #[tokio::test]
    async fn test_unknown_collection() {
        let (state, _temp) = setup();
        let (status, body) = send(&state, request("GET", "/collections/users", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "unknown_collection");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_broadcast_in_order() {
        let (state, _temp) = setup();
        let mut updates = state.hub.subscribe(Collection::Sales).await;

        let mut writes = tokio::task::JoinSet::new();
        for i in 0..16 {
            let state = state.clone();
            writes.spawn(async move {
                let uri = format!("/collections/sales/s{:02}", i);
                send(&state, request("PUT", &uri, Some(json!({"n": i})))).await
            });
        }
        while let Some(result) = writes.join_next().await {
            assert_eq!(result.unwrap().0, StatusCode::NO_CONTENT);
        }

        let mut sizes = Vec::new();
        while let Ok(snapshot) = updates.try_recv() {
            sizes.push(snapshot.len());
        }
        assert_eq!(sizes, (1..=16).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_writes_are_broadcast() {
        let (state, _temp) = setup();
        let mut updates = state.hub.subscribe(Collection::Sales).await;

        send(
            &state,
            request("PUT", "/collections/sales/s1", Some(json!({"clientName": "A"}))),
        )
        .await;
        let snapshot = updates.try_recv().unwrap();
        assert_eq!(snapshot.len(), 1);

        send(&state, request("DELETE", "/collections/sales/s1", None)).await;
        assert!(updates.try_recv().unwrap().is_empty());

        // Deleting again changes nothing, so nothing is sent
        send(&state, request("DELETE", "/collections/sales/s1", None)).await;
        assert!(updates.try_recv().is_err());
    }
}
