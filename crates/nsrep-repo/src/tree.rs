use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use nsrep_store::query_string::quote;
use nsrep_store::{SearchStore, Store};
use nsrep_types::{escape_query, Id, StoreError, StoreResult, FIELD_ID};

/// Delete `id` and every item below it from all `stores`.
///
/// Descendants are found by scanning `search` for ids prefixed by `id/`.
/// Errors from any store are collected rather than aborting, and reported
/// together as one `ITEM_MULTIPLE` error.
pub async fn delete_tree(
    id: &Id,
    stores: &[Arc<dyn Store>],
    search: Arc<dyn SearchStore>,
) -> StoreResult<()> {
    delete_tree_with_cancel(id, stores, search, CancellationToken::new()).await
}

/// [`delete_tree`] with a caller-provided cancellation token.
///
/// Cancelling the token stops the scan; items not yet deleted stay. The
/// scan is also cancelled when the returned future is dropped.
pub async fn delete_tree_with_cancel(
    id: &Id,
    stores: &[Arc<dyn Store>],
    search: Arc<dyn SearchStore>,
    cancel: CancellationToken,
) -> StoreResult<()> {
    let mut errors = Vec::new();
    delete_everywhere(id, stores, &mut errors).await;

    let query = subtree_query(id);
    let (tx, mut rx) = mpsc::channel(1);
    let _guard = cancel.clone().drop_guard();
    let producer = tokio::spawn(async move { search.scroll(&query, tx, cancel).await });

    let mut descendants = 0usize;
    while let Some(score) = rx.recv().await {
        delete_everywhere(&score.item.id, stores, &mut errors).await;
        descendants += 1;
    }

    match producer.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => errors.push(e.to_string()),
        Err(e) => errors.push(StoreError::Internal(format!("scan task failed: {e}")).to_string()),
    }

    debug!(%id, descendants, errors = errors.len(), "tree deleted");
    StoreError::multiple(errors)
}

/// Scan query matching every id strictly below `id`. The id is quoted so
/// keys holding spaces, quotes or `*` stay one literal prefix.
fn subtree_query(id: &Id) -> String {
    escape_query(&format!("{FIELD_ID}:{}*", quote(&format!("{id}/"))))
}

async fn delete_everywhere(id: &Id, stores: &[Arc<dyn Store>], errors: &mut Vec<String>) {
    for store in stores {
        if let Err(e) = store.delete(id).await {
            warn!(%id, error = %e, "delete failed");
            errors.push(e.to_string());
        }
    }
}
