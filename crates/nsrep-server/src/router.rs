use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use nsrep_repo::Repository;
use nsrep_schema::Projector;

use crate::config::ServerConfig;
use crate::handler;

/// Shared state of every handler.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    /// Present only when some store supports search.
    pub projector: Option<Arc<Projector>>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, config: ServerConfig) -> Self {
        let projector = repo.search_store().map(|search| {
            Arc::new(Projector::new(Arc::clone(repo.model()), Arc::clone(search)))
        });
        Self {
            repo,
            projector,
            config: Arc::new(config),
        }
    }
}

/// Build the axum router with all nsrep endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handler::health_handler))
        .route(
            "/items/*id",
            get(handler::get_item)
                .post(handler::post_item)
                .delete(handler::delete_item),
        )
        .route("/history/*id", get(handler::history))
        .route("/search", get(handler::search))
        .route(
            "/graphql",
            get(handler::graphql_schema).post(handler::graphql),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
