use std::sync::Arc;

use tracing::{debug, info, warn};

use nsrep_model::Model;
use nsrep_store::{HistoryStore, SearchStore, Store};
use nsrep_types::{Id, Item, Query, SearchResult, Status, StoreError};

use crate::error::{RepoError, RepoResult};
use crate::tree::delete_tree;

/// A primary store, an optional secondary store and the live data model.
pub struct Repository {
    primary: Arc<dyn Store>,
    secondary: Option<Arc<dyn Store>>,
    model: Arc<Model>,
    search: Option<Arc<dyn SearchStore>>,
    history: Option<Arc<dyn HistoryStore>>,
}

impl Repository {
    /// Wire the stores together and load the persisted model.
    ///
    /// History and search are taken from the primary store when it offers
    /// them, otherwise from the secondary.
    pub async fn open(
        primary: Arc<dyn Store>,
        secondary: Option<Arc<dyn Store>>,
    ) -> RepoResult<Self> {
        let search = Arc::clone(&primary)
            .as_search()
            .or_else(|| secondary.clone().and_then(|s| s.as_search()));
        let history = Arc::clone(&primary)
            .as_history()
            .or_else(|| secondary.clone().and_then(|s| s.as_history()));

        let model = Model::from_item(&primary.read(&Id::model()).await?);
        info!(
            types = model.types().len(),
            search = search.is_some(),
            history = history.is_some(),
            secondary = secondary.is_some(),
            "repository opened"
        );

        Ok(Self {
            primary,
            secondary,
            model: Arc::new(model),
            search,
            history,
        })
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn search_store(&self) -> Option<&Arc<dyn SearchStore>> {
        self.search.as_ref()
    }

    pub fn has_history(&self) -> bool {
        self.history.is_some()
    }

    pub async fn read(&self, id: &Id) -> RepoResult<Item> {
        Ok(self.primary.read(id).await?)
    }

    /// Store an item, registering it in the model first.
    ///
    /// When the model grows, the model item is written to the primary store
    /// before the item. An attribute type conflict is returned without
    /// writing the item, but additions staged alongside it are kept and
    /// persisted.
    pub async fn write(&self, item: &Item) -> RepoResult<()> {
        if item.is_empty() {
            return Err(StoreError::EmptyItem.into());
        }

        if item.id.is_model() {
            self.primary.write(item).await?;
            self.model.reset_from(item);
            info!("model replaced");
            self.propagate_write(item);
            return Ok(());
        }

        let outcome = self.model.add_item(item);
        if outcome.changed {
            self.primary.write(&self.model.to_item()).await?;
            debug!(id = %item.id, "model persisted");
        }
        if let Some(err) = outcome.error {
            return Err(err.into());
        }

        self.primary.write(item).await?;
        self.propagate_write(item);
        Ok(())
    }

    /// Delete an item, and its whole subtree when some store can search.
    pub async fn delete(&self, id: &Id) -> RepoResult<()> {
        match &self.search {
            Some(search) => {
                let mut stores = vec![Arc::clone(&self.primary)];
                stores.extend(self.secondary.iter().cloned());
                delete_tree(id, &stores, Arc::clone(search)).await?;
            }
            None => {
                self.primary.delete(id).await?;
                self.propagate_delete(id);
            }
        }
        if id.is_model() {
            self.model.clear();
            info!("model cleared");
        }
        Ok(())
    }

    pub async fn history(&self, id: &Id, limit: usize) -> RepoResult<Vec<Status>> {
        let history = self.history.as_ref().ok_or(RepoError::NoHistory)?;
        Ok(history.history(id, limit).await?)
    }

    pub async fn search(&self, query: &Query) -> RepoResult<SearchResult> {
        let search = self.search.as_ref().ok_or(RepoError::NoSearch)?;
        Ok(search.search(query).await?)
    }

    /// Close both stores, reporting every failure.
    pub async fn close(&self) -> RepoResult<()> {
        let mut errors = Vec::new();
        if let Err(e) = self.primary.close().await {
            errors.push(e.to_string());
        }
        if let Some(secondary) = &self.secondary {
            if let Err(e) = secondary.close().await {
                errors.push(e.to_string());
            }
        }
        Ok(StoreError::multiple(errors)?)
    }

    fn propagate_write(&self, item: &Item) {
        let Some(secondary) = self.secondary.clone() else {
            return;
        };
        let item = item.clone();
        tokio::spawn(async move {
            if let Err(e) = secondary.write(&item).await {
                warn!(id = %item.id, error = %e, "secondary write failed");
            }
        });
    }

    fn propagate_delete(&self, id: &Id) {
        let Some(secondary) = self.secondary.clone() else {
            return;
        };
        let id = id.clone();
        tokio::spawn(async move {
            if let Err(e) = secondary.delete(&id).await {
                warn!(%id, error = %e, "secondary delete failed");
            }
        });
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("model", &self.model)
            .field("secondary", &self.secondary.is_some())
            .field("search", &self.search.is_some())
            .field("history", &self.history.is_some())
            .finish()
    }
}
