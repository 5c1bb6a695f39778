//! In-process remote store.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::broadcast;

use super::{RemoteError, RemoteStore, SnapshotStream};
use crate::protocol::{Collection, RemoteDocument};

type Documents = BTreeMap<String, Map<String, Value>>;

/// Remote store kept in memory. Behaves like the document server: writes
/// replace or merge documents and every change pushes a full snapshot to
/// subscribers.
pub struct MemoryRemote {
    collections: Mutex<HashMap<Collection, Documents>>,
    channels: HashMap<Collection, broadcast::Sender<Vec<RemoteDocument>>>,
    failing: AtomicBool,
}

impl MemoryRemote {
    pub fn new() -> Self {
        let channels = Collection::ALL
            .into_iter()
            .map(|collection| (collection, broadcast::channel(16).0))
            .collect();
        Self {
            collections: Mutex::new(HashMap::new()),
            channels,
            failing: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent operation fail with [`RemoteError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Current contents of a collection.
    pub fn snapshot(&self, collection: Collection) -> Vec<RemoteDocument> {
        let collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        to_documents(collections.get(&collection))
    }

    pub fn get(&self, collection: Collection, id: &str) -> Option<Map<String, Value>> {
        let collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        collections.get(&collection).and_then(|docs| docs.get(id).cloned())
    }

    fn check_available(&self) -> Result<(), RemoteError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable);
        }
        Ok(())
    }

    /// Applies a change and publishes the result. The lock is held until
    /// the snapshot is sent, so subscribers see snapshots in write order.
    fn update<F>(&self, collection: Collection, f: F)
    where
        F: FnOnce(&mut Documents),
    {
        let mut collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        let documents = collections.entry(collection).or_default();
        f(documents);
        if let Some(sender) = self.channels.get(&collection) {
            let _ = sender.send(to_documents(Some(documents)));
        }
    }
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

fn to_documents(documents: Option<&Documents>) -> Vec<RemoteDocument> {
    documents
        .map(|docs| {
            docs.iter()
                .map(|(id, data)| RemoteDocument {
                    id: id.clone(),
                    data: data.clone(),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn set_document(
        &self,
        collection: Collection,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<(), RemoteError> {
        self.check_available()?;
        self.update(collection, |docs| {
            docs.insert(id.to_string(), data);
        });
        Ok(())
    }

    async fn merge_document(
        &self,
        collection: Collection,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<(), RemoteError> {
        self.check_available()?;
        self.update(collection, |docs| {
            docs.entry(id.to_string()).or_default().extend(data);
        });
        Ok(())
    }

    async fn delete_document(&self, collection: Collection, id: &str) -> Result<(), RemoteError> {
        self.check_available()?;
        self.update(collection, |docs| {
            docs.remove(id);
        });
        Ok(())
    }

    async fn fetch_collection(
        &self,
        collection: Collection,
    ) -> Result<Vec<RemoteDocument>, RemoteError> {
        self.check_available()?;
        Ok(self.snapshot(collection))
    }

    async fn subscribe(&self, collection: Collection) -> Result<SnapshotStream, RemoteError> {
        self.check_available()?;
        let sender = self
            .channels
            .get(&collection)
            .ok_or(RemoteError::Unavailable)?;
        // Under the lock, so no change lands between the initial read and
        // the first update
        let (receiver, initial) = {
            let collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
            (sender.subscribe(), to_documents(collections.get(&collection)))
        };

        let updates = stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(snapshot) => return Some((Ok(snapshot), receiver)),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });

        Ok(stream::once(async move { Ok(initial) }).chain(updates).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_set_and_delete() {
        let remote = MemoryRemote::new();
        remote
            .set_document(Collection::Sales, "s1", fields(json!({"clientName": "HGR"})))
            .await
            .unwrap();
        assert_eq!(remote.snapshot(Collection::Sales).len(), 1);

        remote.delete_document(Collection::Sales, "s1").await.unwrap();
        assert!(remote.snapshot(Collection::Sales).is_empty());
    }

    #[tokio::test]
    async fn test_merge_keeps_other_fields() {
        let remote = MemoryRemote::new();
        remote
            .merge_document(
                Collection::Settings,
                "global",
                fields(json!({"companyName": "OxyTrack", "defaultProducer": "A"})),
            )
            .await
            .unwrap();
        remote
            .merge_document(Collection::Settings, "global", fields(json!({"defaultProducer": "B"})))
            .await
            .unwrap();

        let doc = remote.get(Collection::Settings, "global").unwrap();
        assert_eq!(doc["companyName"], "OxyTrack");
        assert_eq!(doc["defaultProducer"], "B");
    }

    #[tokio::test]
    async fn test_subscribe_yields_initial_then_changes() {
        let remote = MemoryRemote::new();
        remote
            .set_document(Collection::Productions, "p1", fields(json!({"producer": "A"})))
            .await
            .unwrap();

        let mut stream = remote.subscribe(Collection::Productions).await.unwrap();
        let initial = stream.next().await.unwrap().unwrap();
        assert_eq!(initial.len(), 1);

        remote
            .set_document(Collection::Productions, "p2", fields(json!({"producer": "B"})))
            .await
            .unwrap();
        let updated = stream.next().await.unwrap().unwrap();
        assert_eq!(updated.len(), 2);
    }

    #[tokio::test]
    async fn test_failing_remote() {
        let remote = MemoryRemote::new();
        remote.set_failing(true);
        assert!(matches!(
            remote.delete_document(Collection::Sales, "s1").await,
            Err(RemoteError::Unavailable)
        ));
        assert!(remote.subscribe(Collection::Sales).await.is_err());
    }
}
