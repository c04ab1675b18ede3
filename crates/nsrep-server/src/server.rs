use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use nsrep_repo::Repository;
use nsrep_store::{connect_with_retry, InMemorySearchStore, InMemoryStore, Store};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::{build_router, AppState};

/// The nsrep HTTP server over in-memory stores.
pub struct NsrepServer {
    state: AppState,
}

impl NsrepServer {
    /// Connect the stores and load the model.
    pub async fn open(config: ServerConfig) -> ServerResult<Self> {
        let policy = config.retry_policy();
        let primary =
            connect_with_retry("primary", policy, || async { Ok(InMemoryStore::new()) }).await?;
        let primary: Arc<dyn Store> = Arc::new(primary);

        let secondary = if config.secondary {
            let search = connect_with_retry("secondary", policy, || async {
                Ok(InMemorySearchStore::new())
            })
            .await?;
            Some(Arc::new(search) as Arc<dyn Store>)
        } else {
            None
        };

        let repo = Repository::open(primary, secondary).await?;
        Ok(Self {
            state: AppState::new(Arc::new(repo), config),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    pub fn repository(&self) -> &Arc<Repository> {
        &self.state.repo
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Serve requests until the listener fails, then close the stores.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(self.state.config.bind_addr).await?;
        info!(addr = %self.state.config.bind_addr, "nsrep server listening");
        let served = axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()));
        self.state.repo.close().await?;
        served
    }
}
