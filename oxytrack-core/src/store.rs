//! The Sync Store: local-first state for production entries, sales and
//! settings.
//!
//! Every mutation is applied to memory and to the local cache before the
//! call returns. Remote writes are spawned in the background and never
//! awaited by the caller; [`SyncStore::drain`] waits for them when a process
//! is about to exit.
//!
//! Inbound snapshots are merged by revision: remote documents win, except
//! for local writes the remote has not acknowledged yet.

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::{JoinHandle, JoinSet};

use crate::cache::{
    CacheError, LocalCache, PENDING_KEY, PRODUCTIONS_KEY, SALES_KEY, SETTINGS_KEY,
};
use crate::models::{AppSettings, ProductionEntry, SaleEntry, SettingsPatch};
use crate::protocol::{Collection, RemoteDocument, SETTINGS_DOC_ID};
use crate::remote::{decode_entity, decode_fields, encode_entity, encode_fields, RemoteError, RemoteStore};
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to persist local state: {0}")]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Production entry not found: {0}")]
    ProductionNotFound(String),

    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    #[error("No remote store configured")]
    NoRemote,
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Kind of a remote write that has not been acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingKind {
    Upsert,
    Delete,
}

impl fmt::Display for PendingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingKind::Upsert => write!(f, "write"),
            PendingKind::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct PendingWrite {
    kind: PendingKind,
    /// Only the most recent write for an id clears the entry.
    #[serde(skip)]
    seq: u64,
}

type PendingSet = HashMap<Collection, HashMap<String, PendingWrite>>;

/// A synced entity collection.
pub(crate) trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: Collection;
    const CACHE_KEY: &'static str;

    fn id(&self) -> &str;
    fn revision(&self) -> DateTime<Utc>;
    fn state(inner: &Inner) -> &watch::Sender<Vec<Self>>;
    fn sort(entries: &mut [Self]);

    fn normalize(self) -> Self {
        self
    }
}

impl Entity for ProductionEntry {
    const COLLECTION: Collection = Collection::Productions;
    const CACHE_KEY: &'static str = PRODUCTIONS_KEY;

    fn id(&self) -> &str {
        &self.id
    }

    fn revision(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn state(inner: &Inner) -> &watch::Sender<Vec<Self>> {
        &inner.productions
    }

    fn sort(entries: &mut [Self]) {
        entries.sort_by(|a, b| {
            b.production_date
                .cmp(&a.production_date)
                .then(b.start_time.cmp(&a.start_time))
        });
    }

    fn normalize(self) -> Self {
        self.normalized()
    }
}

impl Entity for SaleEntry {
    const COLLECTION: Collection = Collection::Sales;
    const CACHE_KEY: &'static str = SALES_KEY;

    fn id(&self) -> &str {
        &self.id
    }

    fn revision(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn state(inner: &Inner) -> &watch::Sender<Vec<Self>> {
        &inner.sales
    }

    fn sort(entries: &mut [Self]) {
        entries.sort_by(|a, b| b.sale_date.cmp(&a.sale_date));
    }
}

/// Merges a remote snapshot with the local copy.
///
/// Remote documents win unless the id has an unacknowledged local write:
/// a pending upsert keeps the local version when it is newer or absent
/// remotely, a pending delete keeps the document out.
fn reconcile<T: Entity>(
    local: &[T],
    remote: Vec<T>,
    pending: &HashMap<String, PendingWrite>,
) -> Vec<T> {
    let local_by_id: HashMap<&str, &T> = local.iter().map(|e| (e.id(), e)).collect();
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(remote.len());

    for remote_entry in remote {
        seen.insert(remote_entry.id().to_string());
        match pending.get(remote_entry.id()).map(|p| p.kind) {
            Some(PendingKind::Delete) => {}
            Some(PendingKind::Upsert) => match local_by_id.get(remote_entry.id()) {
                Some(local_entry) if local_entry.revision() > remote_entry.revision() => {
                    merged.push((*local_entry).clone())
                }
                _ => merged.push(remote_entry),
            },
            None => merged.push(remote_entry),
        }
    }

    for entry in local {
        let unacknowledged = matches!(
            pending.get(entry.id()).map(|p| p.kind),
            Some(PendingKind::Upsert)
        );
        if unacknowledged && !seen.contains(entry.id()) {
            merged.push(entry.clone());
        }
    }

    merged
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

pub(crate) struct Inner {
    cache: LocalCache,
    remote: Option<Arc<dyn RemoteStore>>,
    productions: watch::Sender<Vec<ProductionEntry>>,
    sales: watch::Sender<Vec<SaleEntry>>,
    settings: watch::Sender<AppSettings>,
    online: AtomicBool,
    syncing: AtomicBool,
    pending: Mutex<PendingSet>,
    next_seq: AtomicU64,
    /// Serializes read-modify-write cycles on the snapshots.
    write_lock: Mutex<()>,
    tasks: Mutex<JoinSet<()>>,
    notifications: broadcast::Sender<Notification>,
}

impl Inner {
    fn notify(&self, notification: Notification) {
        let _ = self.notifications.send(notification);
    }

    fn mark_pending(&self, collection: Collection, id: &str, kind: PendingKind) -> u64 {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let mut pending = lock(&self.pending);
        pending
            .entry(collection)
            .or_default()
            .insert(id.to_string(), PendingWrite { kind, seq });
        self.persist_pending(&pending);
        seq
    }

    fn clear_pending(&self, collection: Collection, id: &str, seq: u64) {
        let mut pending = lock(&self.pending);
        let Some(writes) = pending.get_mut(&collection) else {
            return;
        };
        if writes.get(id).map(|w| w.seq) == Some(seq) {
            writes.remove(id);
            self.persist_pending(&pending);
        }
    }

    fn pending_for(&self, collection: Collection) -> HashMap<String, PendingWrite> {
        lock(&self.pending)
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    fn persist_pending(&self, pending: &PendingSet) {
        if let Err(e) = self.cache.save(PENDING_KEY, pending) {
            tracing::warn!("Failed to persist pending writes: {}", e);
        }
    }
}

/// Handle on the live remote subscriptions. Dropping it stops them.
pub struct Subscriptions {
    handles: Vec<JoinHandle<()>>,
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

/// Local-first store shared by every consumer. Cheap to clone.
#[derive(Clone)]
pub struct SyncStore {
    inner: Arc<Inner>,
}

impl SyncStore {
    /// Loads the local cache and attaches an optional remote.
    ///
    /// Missing or unreadable cache files start empty (settings start at
    /// their defaults).
    pub fn open(cache: LocalCache, remote: Option<Arc<dyn RemoteStore>>) -> Self {
        let productions = load_entities::<ProductionEntry>(&cache);
        let sales = load_entities::<SaleEntry>(&cache);
        let settings: AppSettings = cache.load_or_default(SETTINGS_KEY);
        let pending: PendingSet = cache.load_or_default(PENDING_KEY);

        tracing::debug!(
            "Opened store at {}: {} productions, {} sales",
            cache.data_dir().display(),
            productions.len(),
            sales.len()
        );

        Self {
            inner: Arc::new(Inner {
                cache,
                remote,
                productions: watch::channel(productions).0,
                sales: watch::channel(sales).0,
                settings: watch::channel(settings).0,
                online: AtomicBool::new(true),
                syncing: AtomicBool::new(false),
                pending: Mutex::new(pending),
                next_seq: AtomicU64::new(0),
                write_lock: Mutex::new(()),
                tasks: Mutex::new(JoinSet::new()),
                notifications: broadcast::channel(32).0,
            }),
        }
    }

    pub fn has_remote(&self) -> bool {
        self.inner.remote.is_some()
    }

    pub fn cache(&self) -> &LocalCache {
        &self.inner.cache
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Production entries, newest first.
    pub fn production_entries(&self) -> Vec<ProductionEntry> {
        self.snapshot()
    }

    /// Sales, newest first.
    pub fn sale_entries(&self) -> Vec<SaleEntry> {
        self.snapshot()
    }

    pub fn settings(&self) -> AppSettings {
        self.inner.settings.borrow().clone()
    }

    pub fn production_entry(&self, id: &str) -> Option<ProductionEntry> {
        self.inner
            .productions
            .borrow()
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }

    pub fn sale_entry(&self, id: &str) -> Option<SaleEntry> {
        self.inner.sales.borrow().iter().find(|e| e.id == id).cloned()
    }

    pub fn watch_production_entries(&self) -> watch::Receiver<Vec<ProductionEntry>> {
        self.inner.productions.subscribe()
    }

    pub fn watch_sale_entries(&self) -> watch::Receiver<Vec<SaleEntry>> {
        self.inner.sales.subscribe()
    }

    pub fn watch_settings(&self) -> watch::Receiver<AppSettings> {
        self.inner.settings.subscribe()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Replaces every production entry, persists, and writes each entry to
    /// the remote.
    pub fn replace_production_entries(&self, entries: Vec<ProductionEntry>) -> StoreResult<()> {
        self.try_modify(|current: &mut Vec<ProductionEntry>| {
            *current = entries;
            Ok(())
        })
    }

    pub fn replace_sale_entries(&self, entries: Vec<SaleEntry>) -> StoreResult<()> {
        self.try_modify(|current: &mut Vec<SaleEntry>| {
            *current = entries;
            Ok(())
        })
    }

    /// Computes the new list from the previous one, then replaces it.
    pub fn modify_production_entries<F>(&self, f: F) -> StoreResult<()>
    where
        F: FnOnce(Vec<ProductionEntry>) -> Vec<ProductionEntry>,
    {
        self.try_modify(|current: &mut Vec<ProductionEntry>| {
            *current = f(std::mem::take(current));
            Ok(())
        })
    }

    pub fn modify_sale_entries<F>(&self, f: F) -> StoreResult<()>
    where
        F: FnOnce(Vec<SaleEntry>) -> Vec<SaleEntry>,
    {
        self.try_modify(|current: &mut Vec<SaleEntry>| {
            *current = f(std::mem::take(current));
            Ok(())
        })
    }

    /// Removes an entry locally and deletes it remotely. Returns false if
    /// no entry had this id.
    pub fn delete_production_entry(&self, id: &str) -> StoreResult<bool> {
        self.delete::<ProductionEntry>(id)
    }

    pub fn delete_sale_entry(&self, id: &str) -> StoreResult<bool> {
        self.delete::<SaleEntry>(id)
    }

    /// Merges `patch` into the settings, persists, and sends a single
    /// merge-write to the remote.
    pub fn update_settings(&self, patch: SettingsPatch) -> StoreResult<AppSettings> {
        let _guard = lock(&self.inner.write_lock);

        let mut settings = self.settings();
        settings.merge(&patch);
        let saved = self.inner.cache.save(SETTINGS_KEY, &settings);
        self.inner.settings.send_replace(settings.clone());

        if !patch.is_empty() {
            self.push_settings(&patch);
        }

        saved?;
        Ok(settings)
    }

    /// Applies `f` to the current list under the write lock and commits
    /// the result if `f` succeeds.
    pub(crate) fn try_modify<T, R, F>(&self, f: F) -> StoreResult<R>
    where
        T: Entity,
        F: FnOnce(&mut Vec<T>) -> StoreResult<R>,
    {
        let _guard = lock(&self.inner.write_lock);
        let mut entries = self.snapshot::<T>();
        let result = f(&mut entries)?;
        self.commit(entries, true)?;
        Ok(result)
    }

    fn snapshot<T: Entity>(&self) -> Vec<T> {
        T::state(&self.inner).borrow().clone()
    }

    /// Sorts, persists and publishes a list; optionally writes every entry
    /// to the remote. Must be called with the write lock held.
    fn commit<T: Entity>(&self, mut entries: Vec<T>, push: bool) -> StoreResult<()> {
        T::sort(&mut entries);
        let saved = self.inner.cache.save(T::CACHE_KEY, &entries);

        if push {
            for entry in &entries {
                self.push_upsert(entry);
            }
        }

        T::state(&self.inner).send_replace(entries);
        saved.map_err(StoreError::from)
    }

    fn delete<T: Entity>(&self, id: &str) -> StoreResult<bool> {
        let _guard = lock(&self.inner.write_lock);

        let mut entries = self.snapshot::<T>();
        let before = entries.len();
        entries.retain(|e| e.id() != id);
        if entries.len() == before {
            return Ok(false);
        }

        let saved = self.inner.cache.save(T::CACHE_KEY, &entries);
        T::state(&self.inner).send_replace(entries);
        self.push_delete(T::COLLECTION, id);

        saved?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Outbound
    // ------------------------------------------------------------------

    fn push_upsert<T: Entity>(&self, entry: &T) {
        let Some(remote) = self.inner.remote.clone() else {
            return;
        };
        let RemoteDocument { id, data } = match encode_entity(entry) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Cannot encode {} {}: {}", T::COLLECTION, entry.id(), e);
                return;
            }
        };
        let doc_id = id.clone();
        self.spawn_remote(T::COLLECTION, id, PendingKind::Upsert, async move {
            remote.set_document(T::COLLECTION, &doc_id, data).await
        });
    }

    fn push_delete(&self, collection: Collection, id: &str) {
        let Some(remote) = self.inner.remote.clone() else {
            return;
        };
        let doc_id = id.to_string();
        self.spawn_remote(collection, id.to_string(), PendingKind::Delete, async move {
            remote.delete_document(collection, &doc_id).await
        });
    }

    fn push_settings(&self, patch: &SettingsPatch) {
        let Some(remote) = self.inner.remote.clone() else {
            return;
        };
        let data = match encode_fields(patch) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Cannot encode settings: {}", e);
                return;
            }
        };
        self.spawn_remote(
            Collection::Settings,
            SETTINGS_DOC_ID.to_string(),
            PendingKind::Upsert,
            async move {
                remote
                    .merge_document(Collection::Settings, SETTINGS_DOC_ID, data)
                    .await
            },
        );
    }

    /// Spawns a remote write, tracking it as pending until it succeeds.
    /// Failures are logged and reported as a notification. Without a
    /// runtime the write is only recorded as pending, for `push_pending`.
    fn spawn_remote<F>(&self, collection: Collection, id: String, kind: PendingKind, write: F)
    where
        F: Future<Output = Result<(), RemoteError>> + Send + 'static,
    {
        let seq = self.inner.mark_pending(collection, &id, kind);

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!(
                    "No async runtime, remote {} of {}/{} left pending",
                    kind,
                    collection,
                    id
                );
                return;
            }
        };

        let inner = Arc::clone(&self.inner);

        let mut tasks = lock(&self.inner.tasks);
        while tasks.try_join_next().is_some() {}
        tasks.spawn_on(
            async move {
                match write.await {
                    Ok(()) => {
                        tracing::debug!("Remote {} of {}/{} acknowledged", kind, collection, id);
                        inner.clear_pending(collection, &id, seq);
                    }
                    Err(e) => {
                        tracing::warn!("Remote {} of {}/{} failed: {}", kind, collection, id, e);
                        inner.notify(Notification::error(
                            "Sync error",
                            format!("Could not {} {} on the server: {}", kind, collection, e),
                        ));
                    }
                }
            },
            &handle,
        );
    }

    /// Waits for every remote write spawned so far.
    pub async fn drain(&self) {
        let mut tasks = std::mem::take(&mut *lock(&self.inner.tasks));
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                tracing::warn!("Remote write task failed: {}", e);
            }
        }
    }

    /// Number of local writes the remote has not acknowledged.
    pub fn pending_writes(&self) -> usize {
        lock(&self.inner.pending).values().map(|w| w.len()).sum()
    }

    /// Issues again every write the remote has not acknowledged. Returns
    /// how many writes were sent.
    pub fn push_pending(&self) -> usize {
        let _guard = lock(&self.inner.write_lock);
        let pending = lock(&self.inner.pending).clone();
        let mut sent = 0;

        for (collection, writes) in pending {
            for (id, write) in writes {
                match (collection, write.kind) {
                    (_, PendingKind::Delete) => self.push_delete(collection, &id),
                    (Collection::Productions, PendingKind::Upsert) => {
                        match self.production_entry(&id) {
                            Some(entry) => self.push_upsert(&entry),
                            None => continue,
                        }
                    }
                    (Collection::Sales, PendingKind::Upsert) => match self.sale_entry(&id) {
                        Some(entry) => self.push_upsert(&entry),
                        None => continue,
                    },
                    (Collection::Settings, PendingKind::Upsert) => {
                        let settings = self.settings();
                        self.push_settings(&SettingsPatch {
                            default_producer: Some(settings.default_producer),
                            company_name: Some(settings.company_name),
                        });
                    }
                }
                sent += 1;
            }
        }

        sent
    }

    // ------------------------------------------------------------------
    // Inbound
    // ------------------------------------------------------------------

    /// Reconciles the local copy of a collection with a remote snapshot.
    /// Nothing is written back to the remote.
    pub fn apply_remote_snapshot(&self, collection: Collection, documents: Vec<RemoteDocument>) {
        let result = match collection {
            Collection::Productions => self.apply_entities::<ProductionEntry>(documents),
            Collection::Sales => self.apply_entities::<SaleEntry>(documents),
            Collection::Settings => self.apply_settings(documents),
        };
        if let Err(e) = result {
            tracing::warn!("Failed to cache {} snapshot: {}", collection, e);
        }
        self.inner.syncing.store(false, Ordering::SeqCst);
    }

    fn apply_entities<T: Entity>(&self, documents: Vec<RemoteDocument>) -> StoreResult<()> {
        let remote: Vec<T> = documents
            .into_iter()
            .filter_map(|document| {
                let id = document.id.clone();
                match decode_entity::<T>(document) {
                    Ok(entry) => Some(entry.normalize()),
                    Err(e) => {
                        tracing::warn!("Skipping {} document {}: {}", T::COLLECTION, id, e);
                        None
                    }
                }
            })
            .collect();

        let _guard = lock(&self.inner.write_lock);
        let local = self.snapshot::<T>();
        let pending = self.inner.pending_for(T::COLLECTION);
        let merged = reconcile(&local, remote, &pending);
        tracing::debug!("Applied {} snapshot: {} entries", T::COLLECTION, merged.len());
        self.commit(merged, false)
    }

    fn apply_settings(&self, documents: Vec<RemoteDocument>) -> StoreResult<()> {
        let Some(document) = documents.into_iter().find(|d| d.id == SETTINGS_DOC_ID) else {
            return Ok(());
        };
        if self
            .inner
            .pending_for(Collection::Settings)
            .contains_key(SETTINGS_DOC_ID)
        {
            return Ok(());
        }
        let patch: SettingsPatch = decode_fields(document.data)?;

        let _guard = lock(&self.inner.write_lock);
        let mut settings = self.settings();
        settings.merge(&patch);
        let saved = self.inner.cache.save(SETTINGS_KEY, &settings);
        self.inner.settings.send_replace(settings);
        saved?;
        Ok(())
    }

    /// Fetches one snapshot of every collection and applies it.
    pub async fn sync_once(&self) -> StoreResult<()> {
        let remote = self.inner.remote.clone().ok_or(StoreError::NoRemote)?;
        self.inner.syncing.store(true, Ordering::SeqCst);

        let result: StoreResult<()> = async {
            for collection in Collection::ALL {
                let documents = remote.fetch_collection(collection).await?;
                self.apply_remote_snapshot(collection, documents);
            }
            Ok(())
        }
        .await;

        self.inner.syncing.store(false, Ordering::SeqCst);
        result
    }

    /// Follows every remote collection and applies each snapshot as it
    /// arrives. Must be called from within a tokio runtime.
    ///
    /// A failed subscription is reported and not retried.
    pub fn subscribe_remote(&self) -> StoreResult<Subscriptions> {
        let remote = self.inner.remote.clone().ok_or(StoreError::NoRemote)?;
        self.inner.syncing.store(true, Ordering::SeqCst);

        let handles = Collection::ALL
            .into_iter()
            .map(|collection| {
                let store = self.clone();
                let remote = Arc::clone(&remote);
                tokio::spawn(async move { store.follow(remote, collection).await })
            })
            .collect();

        Ok(Subscriptions { handles })
    }

    async fn follow(&self, remote: Arc<dyn RemoteStore>, collection: Collection) {
        let mut snapshots = match remote.subscribe(collection).await {
            Ok(snapshots) => snapshots,
            Err(e) => return self.subscription_failed(collection, e),
        };

        while let Some(snapshot) = snapshots.next().await {
            match snapshot {
                Ok(documents) => self.apply_remote_snapshot(collection, documents),
                Err(e) => return self.subscription_failed(collection, e),
            }
        }

        tracing::info!("Subscription to {} closed", collection);
    }

    fn subscription_failed(&self, collection: Collection, error: RemoteError) {
        tracing::warn!("Subscription to {} failed: {}", collection, error);
        self.inner.syncing.store(false, Ordering::SeqCst);
        self.inner.notify(Notification::error(
            "Sync error",
            format!("Lost the {} feed: {}", collection, error),
        ));
    }

    // ------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------

    /// Records connectivity. Informational only: writes are attempted
    /// regardless.
    pub fn set_online(&self, online: bool) {
        let was_online = self.inner.online.swap(online, Ordering::SeqCst);
        if was_online == online {
            return;
        }
        if online {
            tracing::info!("Back online");
            self.inner
                .notify(Notification::info("Online", "Connection restored"));
        } else {
            tracing::info!("Offline");
            self.inner.notify(Notification::info(
                "Offline",
                "Changes are saved locally",
            ));
        }
    }

    pub fn is_online(&self) -> bool {
        self.inner.online.load(Ordering::SeqCst)
    }

    pub fn is_syncing(&self) -> bool {
        self.inner.syncing.load(Ordering::SeqCst)
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.inner.notifications.subscribe()
    }
}

fn load_entities<T: Entity>(cache: &LocalCache) -> Vec<T> {
    let mut entries: Vec<T> = cache
        .load_or_default::<Vec<T>>(T::CACHE_KEY)
        .into_iter()
        .map(Entity::normalize)
        .collect();
    T::sort(&mut entries);
    entries
}
