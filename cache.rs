//! Directory cache: the last-known snapshots of identity, local files and
//! search results.
//!
//! Writes replace a whole value; readers get an `Arc` snapshot that never
//! changes underneath them. Each write is announced on a broadcast channel
//! so views can re-render.

use crate::model::{FileRecord, PeerIdentity};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;
use tracing::debug;

/// Which part of the cache changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheUpdate {
    Identity,
    LocalFiles,
    SearchResults,
}

/// Read-many, single-writer-per-field snapshot store
#[derive(Debug)]
pub struct DirectoryCache {
    identity: RwLock<Option<Arc<PeerIdentity>>>,
    local_files: RwLock<Arc<Vec<FileRecord>>>,
    search_results: RwLock<Arc<Vec<FileRecord>>>,
    updates: broadcast::Sender<CacheUpdate>,
}

impl Default for DirectoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryCache {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(64);
        Self {
            identity: RwLock::new(None),
            local_files: RwLock::new(Arc::new(Vec::new())),
            search_results: RwLock::new(Arc::new(Vec::new())),
            updates,
        }
    }

    /// Receive a notification after every replacement
    pub fn subscribe(&self) -> broadcast::Receiver<CacheUpdate> {
        self.updates.subscribe()
    }

    pub fn identity(&self) -> Option<Arc<PeerIdentity>> {
        read(&self.identity)
    }

    pub fn local_files(&self) -> Arc<Vec<FileRecord>> {
        read(&self.local_files)
    }

    pub fn search_results(&self) -> Arc<Vec<FileRecord>> {
        read(&self.search_results)
    }

    /// Online indicator; unknown identity counts as offline
    pub fn is_online(&self) -> bool {
        self.identity().map(|i| i.is_online()).unwrap_or(false)
    }

    pub fn replace_identity(&self, identity: PeerIdentity) {
        write(&self.identity, Some(Arc::new(identity)));
        self.publish(CacheUpdate::Identity);
    }

    /// Force the online indicator off, keeping the last-known counters.
    pub fn mark_offline(&self) {
        let current = self.identity();
        let offline = current.map(|identity| {
            let mut identity = (*identity).clone();
            identity.is_registered = false;
            Arc::new(identity)
        });
        write(&self.identity, offline);
        self.publish(CacheUpdate::Identity);
    }

    pub fn replace_local_files(&self, files: Vec<FileRecord>) {
        debug!("Replacing local files ({} records)", files.len());
        write(&self.local_files, Arc::new(files));
        self.publish(CacheUpdate::LocalFiles);
    }

    pub fn replace_search_results(&self, files: Vec<FileRecord>) {
        debug!("Replacing search results ({} records)", files.len());
        write(&self.search_results, Arc::new(files));
        self.publish(CacheUpdate::SearchResults);
    }

    pub fn find_local(&self, file_id: &str) -> Option<FileRecord> {
        self.local_files().iter().find(|f| f.id == file_id).cloned()
    }

    pub fn find_search_result(&self, file_id: &str) -> Option<FileRecord> {
        self.search_results().iter().find(|f| f.id == file_id).cloned()
    }

    fn publish(&self, update: CacheUpdate) {
        // no subscribers is fine
        let _ = self.updates.send(update);
    }
}

fn read<T: Clone>(lock: &RwLock<T>) -> T {
    lock.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn write<T>(lock: &RwLock<T>, value: T) {
    *lock.write().unwrap_or_else(PoisonError::into_inner) = value;
}
