use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use nsrep_types::{
    Id, Item, Query, Score, SearchResult, StoreError, StoreResult, Value, FIELD_ID, FIELD_NAME,
    FIELD_TYPE,
};

use crate::query_string::{self, Fields, ParsedQuery};
use crate::traits::{SearchStore, Store};

/// Indexed field holding every ancestor namespace of an item.
pub const FIELD_NAMESPACE: &str = "item.ns";
/// Indexed field holding the segment count of an item id.
pub const FIELD_ID_LENGTH: &str = "item.idlength";

/// Number of matches handed out per scroll page.
const SCROLL_PAGE: usize = 100;

/// An item and the field values it is searchable by.
#[derive(Clone, Debug)]
struct Document {
    item: Item,
    fields: Fields,
}

impl Document {
    fn index(item: &Item) -> Self {
        let mut fields = Fields::new();
        fields.insert(FIELD_ID.into(), vec![item.id.to_string()]);
        fields.insert(FIELD_TYPE.into(), vec![item.item_type.clone()]);
        fields.insert(FIELD_NAME.into(), vec![item.name.clone()]);
        fields.insert(FIELD_NAMESPACE.into(), item.id.namespaces());
        fields.insert(FIELD_ID_LENGTH.into(), vec![item.id.len().to_string()]);
        for (attribute, value) in &item.contents {
            if let Some(text) = searchable_text(value) {
                fields.insert(attribute.clone(), vec![text]);
            }
        }
        Self {
            item: item.clone(),
            fields,
        }
    }
}

fn searchable_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Other(_) => None,
    }
}

/// In-memory search index, the secondary store.
///
/// Documents are keyed by the string form of their id. Queries use the
/// grammar of [`query_string`]; results are ordered by descending score,
/// ties by id.
pub struct InMemorySearchStore {
    documents: RwLock<BTreeMap<String, Document>>,
    closed: AtomicBool,
}

impl InMemorySearchStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    /// Every match of `query`, best first.
    fn matches(&self, query: &ParsedQuery) -> Vec<(f64, Document)> {
        let docs = self.documents.read().expect("lock poisoned");
        let mut hits: Vec<(f64, Document)> = docs
            .values()
            .filter_map(|doc| query.score(&doc.fields).map(|s| (s, doc.clone())))
            .collect();
        // Stable sort keeps the id order of the BTreeMap for equal scores.
        hits.sort_by(|a, b| b.0.total_cmp(&a.0));
        hits
    }

    /// Up to [`SCROLL_PAGE`] matches with ids after `after`, in id order.
    ///
    /// The lock is held for one page only, so stores may be written
    /// between pages.
    fn scroll_page(&self, query: &ParsedQuery, after: Option<&str>) -> Vec<(String, Score)> {
        let start = match after {
            Some(id) => Bound::Excluded(id),
            None => Bound::Unbounded,
        };
        let docs = self.documents.read().expect("lock poisoned");
        let page = docs
            .range::<str, _>((start, Bound::Unbounded))
            .filter_map(|(key, doc)| {
                query.score(&doc.fields).map(|score| {
                    let hit = Score {
                        item: doc.item.clone(),
                        score,
                    };
                    (key.clone(), hit)
                })
            })
            .take(SCROLL_PAGE)
            .collect();
        page
    }
}

impl Default for InMemorySearchStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemorySearchStore {
    async fn read(&self, id: &Id) -> StoreResult<Item> {
        self.check_open()?;
        let docs = self.documents.read().expect("lock poisoned");
        Ok(docs
            .get(&id.to_string())
            .map(|doc| doc.item.clone())
            .unwrap_or_default())
    }

    async fn write(&self, item: &Item) -> StoreResult<()> {
        if item.is_empty() {
            return Err(StoreError::EmptyItem);
        }
        self.check_open()?;
        let doc = Document::index(item);
        self.documents
            .write()
            .expect("lock poisoned")
            .insert(item.id.to_string(), doc);
        debug!(id = %item.id, "item indexed");
        Ok(())
    }

    async fn delete(&self, id: &Id) -> StoreResult<()> {
        self.check_open()?;
        self.documents
            .write()
            .expect("lock poisoned")
            .remove(&id.to_string());
        Ok(())
    }

    async fn close(&self) -> StoreResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.documents.write().expect("lock poisoned").clear();
        Ok(())
    }

    fn as_search(self: Arc<Self>) -> Option<Arc<dyn SearchStore>> {
        Some(self)
    }
}

#[async_trait]
impl SearchStore for InMemorySearchStore {
    async fn search(&self, query: &Query) -> StoreResult<SearchResult> {
        self.check_open()?;
        let parsed = query_string::parse(&query.query_string)?;
        let hits = self.matches(&parsed);

        let mut facets = BTreeMap::new();
        for facet in &query.facets {
            let mut buckets: BTreeMap<String, u64> = BTreeMap::new();
            for (_, doc) in &hits {
                for value in doc.fields.get(facet.field()).into_iter().flatten() {
                    *buckets.entry(value.clone()).or_default() += 1;
                }
            }
            facets.insert(facet.field().to_string(), buckets);
        }

        let scores = hits
            .into_iter()
            .skip(query.from)
            .take(query.length)
            .map(|(score, doc)| Score {
                item: doc.item,
                score,
            })
            .collect();
        Ok(SearchResult { scores, facets })
    }

    async fn scroll(
        &self,
        query: &str,
        sink: mpsc::Sender<Score>,
        cancel: CancellationToken,
    ) -> StoreResult<()> {
        let parsed = query_string::parse(query)?;
        let mut cursor: Option<String> = None;
        let mut sent_total = 0usize;
        loop {
            self.check_open()?;
            let page = self.scroll_page(&parsed, cursor.as_deref());
            let full = page.len() == SCROLL_PAGE;
            cursor = page.last().map(|(key, _)| key.clone());
            for (_, next) in page {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(StoreError::Cancelled),
                    sent = sink.send(next) => {
                        if sent.is_err() {
                            return Err(StoreError::Cancelled);
                        }
                    }
                }
                sent_total += 1;
            }
            if !full {
                break;
            }
        }
        debug!(query, hits = sent_total, "scroll finished");
        Ok(())
    }
}

impl std::fmt::Debug for InMemorySearchStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySearchStore")
            .field("documents", &self.len())
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nsrep_types::{escape_query, Facet};

    async fn seeded() -> InMemorySearchStore {
        let store = InMemorySearchStore::new();
        for (id, ty, name) in [
            ("DataSource/DS1", "DataSource", "Sales"),
            ("DataSource/DS1/Table/T1", "Table", "Orders"),
            ("DataSource/DS1/Table/T2", "Table", "Customers"),
            ("DataSource/DS2", "DataSource", "HR"),
            ("DataSource/DS2/Table/T1", "Table", "Employees"),
        ] {
            let item = Item::new(Id::parse(id), ty, name).with("owner", "alice");
            store.write(&item).await.unwrap();
        }
        store
    }

    fn ids(result: &SearchResult) -> Vec<String> {
        result.items().map(|i| i.id.to_string()).collect()
    }

    #[tokio::test]
    async fn field_queries() {
        let store = seeded().await;
        let result = store
            .search(&Query::new(escape_query(
                "item.idlength:4 and item.type:Table and item.id:DataSource/DS1/*",
            )))
            .await
            .unwrap();
        assert_eq!(
            ids(&result),
            vec!["DataSource/DS1/Table/T1", "DataSource/DS1/Table/T2"]
        );
    }

    #[tokio::test]
    async fn paging_and_facets() {
        let store = seeded().await;
        let query = Query::new("owner:alice").page(1, 2).add_all_facets();
        let result = store.search(&query).await.unwrap();
        assert_eq!(result.scores.len(), 2);
        assert_eq!(result.facets["item.type"]["Table"], 3);
        assert_eq!(result.facets["item.type"]["DataSource"], 2);
        assert_eq!(result.facets["item.ns"]["DataSource/DS1"], 2);
        assert_eq!(result.facets["item.name"]["HR"], 1);
        assert_eq!(result.facets.len(), Facet::ALL.len());
    }

    #[tokio::test]
    async fn terms_rank_better_matches_first() {
        let store = seeded().await;
        let result = store.search(&Query::new("orders alice")).await.unwrap();
        assert_eq!(ids(&result)[0], "DataSource/DS1/Table/T1");
        assert!(result.scores[0].score > result.scores[1].score);
    }

    #[tokio::test]
    async fn scroll_streams_every_match() {
        let store = seeded().await;
        let (tx, mut rx) = mpsc::channel(1);
        let query = escape_query("item.id:DataSource/DS1/*");
        let producer = tokio::spawn(async move {
            store.scroll(&query, tx, CancellationToken::new()).await
        });
        let mut seen = Vec::new();
        while let Some(score) = rx.recv().await {
            seen.push(score.item.id.to_string());
        }
        producer.await.unwrap().unwrap();
        assert_eq!(seen, vec!["DataSource/DS1/Table/T1", "DataSource/DS1/Table/T2"]);
    }

    #[tokio::test]
    async fn scroll_spans_pages_while_consumer_deletes() {
        let store = Arc::new(InMemorySearchStore::new());
        for i in 0..250 {
            let id = Id::parse(&format!("DataSource/DS1/Table/T{i:03}"));
            store.write(&Item::new(id, "Table", "t")).await.unwrap();
        }
        store
            .write(&Item::new(Id::parse("DataSource/DS2"), "DataSource", "other"))
            .await
            .unwrap();

        let (tx, mut rx) = mpsc::channel(1);
        let query = escape_query("item.id:DataSource/DS1/*");
        let producer = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.scroll(&query, tx, CancellationToken::new()).await })
        };
        let mut seen = Vec::new();
        while let Some(score) = rx.recv().await {
            store.delete(&score.item.id).await.unwrap();
            seen.push(score.item.id.to_string());
        }
        producer.await.unwrap().unwrap();

        assert_eq!(seen.len(), 250);
        let mut unique = seen.clone();
        unique.dedup();
        assert_eq!(unique, seen);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn scroll_observes_dropped_consumer() {
        let store = seeded().await;
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let err = store
            .scroll("owner:alice", tx, CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Cancelled);
    }

    #[tokio::test]
    async fn scroll_observes_cancellation() {
        let store = seeded().await;
        let (tx, _rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = store.scroll("owner:alice", tx, cancel).await.unwrap_err();
        assert_eq!(err, StoreError::Cancelled);
    }

    #[tokio::test]
    async fn delete_and_read() {
        let store = seeded().await;
        let id = Id::parse("DataSource/DS2");
        assert_eq!(store.read(&id).await.unwrap().name, "HR");
        store.delete(&id).await.unwrap();
        store.delete(&id).await.unwrap();
        assert!(store.read(&id).await.unwrap().is_empty());
        assert_eq!(store.len(), 4);
    }

    #[tokio::test]
    async fn bad_query_is_an_error() {
        let store = seeded().await;
        let err = store.search(&Query::new(":broken")).await.unwrap_err();
        assert_eq!(err.code(), "STORE_INTERNAL");
    }
}
