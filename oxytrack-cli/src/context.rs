//! Store setup shared by every command.
//!
//! Opens the local cache, attaches the remote document server when one is
//! configured and, on the way out, waits for outstanding remote writes.

use std::future::Future;
use std::sync::Arc;

use oxytrack_core::{
    HttpRemote, LocalCache, Notification, NotificationLevel, RemoteStore, SyncStore,
};
use tokio::runtime::Runtime;
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::config::Config;

pub struct AppContext<'a> {
    pub config: &'a Config,
    pub store: SyncStore,
    runtime: &'a Runtime,
    remote: Option<Arc<HttpRemote>>,
    notifications: broadcast::Receiver<Notification>,
}

impl<'a> AppContext<'a> {
    /// Must be called with `runtime` entered.
    pub fn open(config: &'a Config, runtime: &'a Runtime) -> Self {
        let cache = LocalCache::new(config.data_dir.value.clone());
        let remote = config
            .remote_credentials()
            .map(|(url, key)| Arc::new(HttpRemote::new(url, key)));

        let store = SyncStore::open(
            cache,
            remote.clone().map(|r| r as Arc<dyn RemoteStore>),
        );
        let notifications = store.notifications();

        Self {
            config,
            store,
            runtime,
            remote,
            notifications,
        }
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn remote(&self) -> Option<&HttpRemote> {
        self.remote.as_deref()
    }

    /// Checks the server and pulls one snapshot of every collection.
    /// Failures leave the local copy untouched.
    pub fn refresh(&self) {
        let Some(remote) = &self.remote else {
            return;
        };

        let online = self.block_on(remote.check_server());
        self.store.set_online(online);
        if !online {
            tracing::info!("Server {} unreachable, using local data", remote.server_url());
            return;
        }

        if let Err(e) = self.block_on(self.store.sync_once()) {
            tracing::warn!("Sync failed: {}", e);
            eprintln!("Sync: {}", e);
        }
    }

    /// Waits for remote writes, then prints what the store reported.
    pub fn finish(mut self) {
        if self.store.has_remote() {
            self.block_on(self.store.drain());
        }

        loop {
            match self.notifications.try_recv() {
                Ok(notification) => print_notification(&notification),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    }
}

pub fn print_notification(notification: &Notification) {
    match notification.level {
        NotificationLevel::Info => eprintln!("{}", notification),
        NotificationLevel::Error => eprintln!("✗ {}", notification),
    }
}
