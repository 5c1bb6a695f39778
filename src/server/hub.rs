//! Fan-out of collection snapshots to WebSocket subscribers.

use oxytrack_core::{Collection, RemoteDocument};
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};

/// Tracks subscribers per collection.
pub struct CollectionHub {
    channels: RwLock<HashMap<Collection, broadcast::Sender<Vec<RemoteDocument>>>>,
}

impl CollectionHub {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    pub async fn subscribe(&self, collection: Collection) -> broadcast::Receiver<Vec<RemoteDocument>> {
        let mut channels = self.channels.write().await;

        if let Some(sender) = channels.get(&collection) {
            sender.subscribe()
        } else {
            let (sender, receiver) = broadcast::channel(16);
            channels.insert(collection, sender);
            receiver
        }
    }

    /// Sends the new contents of a collection to its subscribers.
    pub async fn broadcast(&self, collection: Collection, snapshot: Vec<RemoteDocument>) {
        let channels = self.channels.read().await;

        if let Some(sender) = channels.get(&collection) {
            // No subscribers is fine
            let _ = sender.send(snapshot);
        }
    }
}

impl Default for CollectionHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn doc(id: &str) -> RemoteDocument {
        RemoteDocument {
            id: id.to_string(),
            data: Map::new(),
        }
    }

    #[tokio::test]
    async fn test_subscribe_and_broadcast() {
        let hub = CollectionHub::new();
        let mut rx = hub.subscribe(Collection::Sales).await;

        hub.broadcast(Collection::Sales, vec![doc("s1")]).await;

        let snapshot = rx.try_recv().unwrap();
        assert_eq!(snapshot, vec![doc("s1")]);
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let hub = CollectionHub::new();
        let mut sales = hub.subscribe(Collection::Sales).await;
        let mut productions = hub.subscribe(Collection::Productions).await;

        hub.broadcast(Collection::Sales, vec![doc("s1")]).await;

        assert!(sales.try_recv().is_ok());
        assert!(productions.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers() {
        let hub = CollectionHub::new();
        hub.broadcast(Collection::Settings, Vec::new()).await;
    }
}
