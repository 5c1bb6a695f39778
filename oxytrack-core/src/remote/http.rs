//! Client for `oxytrack-server`: document writes over HTTP, collection
//! subscriptions over WebSocket.

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{Map, Value};
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::{RemoteError, RemoteStore, SnapshotStream};
use crate::protocol::{Collection, RemoteDocument, SnapshotMessage};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(3);

/// Returns true if the server answers its health check.
pub async fn check_server(server_url: &str) -> bool {
    let client = match reqwest::Client::builder().timeout(HEALTH_TIMEOUT).build() {
        Ok(client) => client,
        Err(_) => return false,
    };
    let url = format!("{}/health", http_base(server_url));
    match client.get(&url).send().await {
        Ok(response) => response.status().is_success(),
        Err(e) => {
            tracing::debug!("Health check against {} failed: {}", url, e);
            false
        }
    }
}

fn http_base(server_url: &str) -> String {
    let base_url = if server_url.starts_with("ws://") {
        server_url.replacen("ws://", "http://", 1)
    } else if server_url.starts_with("wss://") {
        server_url.replacen("wss://", "https://", 1)
    } else if !server_url.starts_with("http://") && !server_url.starts_with("https://") {
        format!("http://{}", server_url)
    } else {
        server_url.to_string()
    };
    base_url.trim_end_matches('/').to_string()
}

fn ws_base(server_url: &str) -> String {
    let base_url = if server_url.starts_with("http://") {
        server_url.replacen("http://", "ws://", 1)
    } else if server_url.starts_with("https://") {
        server_url.replacen("https://", "wss://", 1)
    } else if !server_url.starts_with("ws://") && !server_url.starts_with("wss://") {
        format!("ws://{}", server_url)
    } else {
        server_url.to_string()
    };
    base_url.trim_end_matches('/').to_string()
}

/// Remote store backed by an `oxytrack-server` instance.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    server_url: String,
    api_key: String,
}

impl HttpRemote {
    pub fn new(server_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            server_url: server_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub async fn check_server(&self) -> bool {
        check_server(&self.server_url).await
    }

    fn collection_url(&self, collection: Collection) -> String {
        format!(
            "{}/collections/{}",
            http_base(&self.server_url),
            collection.name()
        )
    }

    fn document_url(&self, collection: Collection, id: &str) -> String {
        format!(
            "{}/collections/{}/{}",
            http_base(&self.server_url),
            collection.name(),
            urlencoding::encode(id)
        )
    }

    fn subscribe_url(&self, collection: Collection) -> String {
        format!(
            "{}/collections/{}/subscribe?key={}",
            ws_base(&self.server_url),
            collection.name(),
            urlencoding::encode(&self.api_key)
        )
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn set_document(
        &self,
        collection: Collection,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<(), RemoteError> {
        let response = self
            .client
            .put(self.document_url(collection, id))
            .bearer_auth(&self.api_key)
            .json(&data)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn merge_document(
        &self,
        collection: Collection,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<(), RemoteError> {
        let response = self
            .client
            .patch(self.document_url(collection, id))
            .bearer_auth(&self.api_key)
            .json(&data)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn delete_document(&self, collection: Collection, id: &str) -> Result<(), RemoteError> {
        let response = self
            .client
            .delete(self.document_url(collection, id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn fetch_collection(
        &self,
        collection: Collection,
    ) -> Result<Vec<RemoteDocument>, RemoteError> {
        let response = self
            .client
            .get(self.collection_url(collection))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let response = check_status(response).await?;
        let snapshot: SnapshotMessage = response.json().await?;
        Ok(snapshot.documents)
    }

    async fn subscribe(&self, collection: Collection) -> Result<SnapshotStream, RemoteError> {
        let url = self.subscribe_url(collection);
        let (ws_stream, _) = connect_async(&url)
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;

        tracing::debug!("Subscribed to {}", collection);

        let snapshots = ws_stream.filter_map(|message| async move {
            match message {
                Ok(Message::Text(text)) => Some(
                    serde_json::from_str::<SnapshotMessage>(text.as_str())
                        .map(|snapshot| snapshot.documents)
                        .map_err(|e| RemoteError::Codec(e.to_string())),
                ),
                Ok(_) => None,
                Err(e) => Some(Err(RemoteError::WebSocket(e.to_string()))),
            }
        });

        Ok(snapshots.boxed())
    }
}
