//! Remote document store access.
//!
//! The store only talks to the remote through [`RemoteStore`], so the
//! network client and the in-process implementation are interchangeable.

mod codec;
mod http;
mod memory;

pub use codec::{decode_entity, decode_fields, encode_entity, encode_fields};
pub use http::{check_server, HttpRemote};
pub use memory::MemoryRemote;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::protocol::{Collection, RemoteDocument};

/// Stream of full collection snapshots, newest last.
pub type SnapshotStream = BoxStream<'static, Result<Vec<RemoteDocument>, RemoteError>>;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Invalid document: {0}")]
    Codec(String),

    #[error("Remote store unavailable")]
    Unavailable,
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        RemoteError::Connection(e.to_string())
    }
}

/// A schema-less document database with live collection subscriptions.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Overwrites a document.
    async fn set_document(
        &self,
        collection: Collection,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<(), RemoteError>;

    /// Merges fields into a document, creating it if needed.
    async fn merge_document(
        &self,
        collection: Collection,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<(), RemoteError>;

    async fn delete_document(&self, collection: Collection, id: &str) -> Result<(), RemoteError>;

    /// Current contents of a collection, read once.
    async fn fetch_collection(&self, collection: Collection)
        -> Result<Vec<RemoteDocument>, RemoteError>;

    /// Streams the collection: the current contents first, then the full
    /// contents again after every change.
    async fn subscribe(&self, collection: Collection) -> Result<SnapshotStream, RemoteError>;
}
