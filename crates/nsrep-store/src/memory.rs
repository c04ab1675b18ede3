use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;

use nsrep_types::{Id, Item, Status, StoreError, StoreResult};

use crate::traits::{HistoryStore, Store};

/// In-memory primary store keeping every version of every item.
///
/// Each id maps to an append-only log of [`Status`] entries, oldest first.
/// A write appends an `ALIVE` version, a delete appends a `DELETED`
/// tombstone, and a read returns the newest entry when it is alive.
pub struct InMemoryStore {
    versions: RwLock<HashMap<String, Vec<Status>>>,
    closed: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            versions: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Number of ids whose newest version is alive.
    pub fn len(&self) -> usize {
        self.versions
            .read()
            .expect("lock poisoned")
            .values()
            .filter(|log| log.last().is_some_and(Status::is_alive))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted string forms of every live id.
    pub fn live_ids(&self) -> Vec<String> {
        let map = self.versions.read().expect("lock poisoned");
        let mut ids: Vec<String> = map
            .iter()
            .filter(|(_, log)| log.last().is_some_and(Status::is_alive))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    fn check_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn read(&self, id: &Id) -> StoreResult<Item> {
        self.check_open()?;
        let map = self.versions.read().expect("lock poisoned");
        Ok(map
            .get(&id.to_string())
            .and_then(|log| log.last())
            .filter(|status| status.is_alive())
            .map(|status| status.item.clone())
            .unwrap_or_default())
    }

    async fn write(&self, item: &Item) -> StoreResult<()> {
        if item.is_empty() {
            return Err(StoreError::EmptyItem);
        }
        self.check_open()?;
        let mut map = self.versions.write().expect("lock poisoned");
        map.entry(item.id.to_string())
            .or_default()
            .push(Status::alive(item.clone()));
        debug!(id = %item.id, "item version written");
        Ok(())
    }

    async fn delete(&self, id: &Id) -> StoreResult<()> {
        self.check_open()?;
        let mut map = self.versions.write().expect("lock poisoned");
        // Only a live item gets a tombstone; deleting twice changes nothing.
        if let Some(log) = map.get_mut(&id.to_string()) {
            if log.last().is_some_and(Status::is_alive) {
                log.push(Status::deleted(id.clone()));
                debug!(%id, "item deleted");
            }
        }
        Ok(())
    }

    async fn close(&self) -> StoreResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.versions.write().expect("lock poisoned").clear();
        Ok(())
    }

    fn as_history(self: Arc<Self>) -> Option<Arc<dyn HistoryStore>> {
        Some(self)
    }
}

#[async_trait]
impl HistoryStore for InMemoryStore {
    async fn history(&self, id: &Id, limit: usize) -> StoreResult<Vec<Status>> {
        self.check_open()?;
        let map = self.versions.read().expect("lock poisoned");
        Ok(map
            .get(&id.to_string())
            .map(|log| log.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("live_items", &self.len())
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}
