use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use nsrep_types::{Id, Item, Query, Score, SearchResult, Status, StoreResult};

/// Durable item storage.
///
/// All implementations must satisfy these invariants:
/// - `read` of an absent id returns the empty item, not an error.
/// - `write` of the empty item fails with `EMPTY_ITEM`.
/// - `delete` is idempotent: deleting an absent id succeeds.
/// - Every method is safe to call concurrently.
#[async_trait]
pub trait Store: Send + Sync {
    /// Read the latest live version of an item.
    async fn read(&self, id: &Id) -> StoreResult<Item>;

    /// Create or replace an item.
    async fn write(&self, item: &Item) -> StoreResult<()>;

    /// Delete an item.
    async fn delete(&self, id: &Id) -> StoreResult<()>;

    /// Release backend resources. Later calls fail with `STORE_CLOSED`.
    async fn close(&self) -> StoreResult<()>;

    /// This store's history capability, if it has one.
    fn as_history(self: Arc<Self>) -> Option<Arc<dyn HistoryStore>> {
        None
    }

    /// This store's search capability, if it has one.
    fn as_search(self: Arc<Self>) -> Option<Arc<dyn SearchStore>> {
        None
    }
}

/// Access to every stored version of an item.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Versions of `id`, newest first, at most `limit` of them.
    async fn history(&self, id: &Id, limit: usize) -> StoreResult<Vec<Status>>;
}

/// Full-text search over stored items.
#[async_trait]
pub trait SearchStore: Send + Sync {
    /// One page of scored items, best first, plus the requested facets.
    async fn search(&self, query: &Query) -> StoreResult<SearchResult>;

    /// Stream every match of a raw, already escaped query string.
    ///
    /// The stream ends when this returns, which drops `sink`. Each send
    /// must give up with `SCAN_CANCELLED` if `cancel` fires or the receiver
    /// is gone, rather than block.
    async fn scroll(
        &self,
        query: &str,
        sink: mpsc::Sender<Score>,
        cancel: CancellationToken,
    ) -> StoreResult<()>;
}
