use axum::extract::{Path, Query as QueryParams, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use nsrep_types::{Facet, Id, Item, Query, SearchResult};

use crate::error::{ServerError, ServerResult};
use crate::router::AppState;

pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn path_id(raw: &str) -> ServerResult<Id> {
    let id = Id::parse(raw.trim_matches('/'));
    if id.is_empty() {
        return Err(ServerError::BadRequest("no id".into()));
    }
    Ok(id)
}

/// A strictly positive integer parameter, or `default`.
fn positive(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

pub async fn get_item(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> ServerResult<Response> {
    let id = path_id(&raw)?;
    let item = state.repo.read(&id).await?;
    let status = if item.is_empty() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };
    Ok((status, Json(item)).into_response())
}

pub async fn post_item(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Json(mut item): Json<Item>,
) -> ServerResult<Json<Item>> {
    item.id = path_id(&raw)?;
    state.repo.write(&item).await?;
    debug!(id = %item.id, "item stored");
    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> ServerResult<StatusCode> {
    let id = path_id(&raw)?;
    state.repo.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<String>,
}

pub async fn history(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    QueryParams(params): QueryParams<HistoryParams>,
) -> ServerResult<Response> {
    let id = path_id(&raw)?;
    let limit = positive(params.limit.as_deref(), state.config.history_limit);
    let versions = state.repo.history(&id, limit).await?;
    let status = if versions.is_empty() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };
    Ok((status, Json(versions)).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub from: Option<String>,
    pub length: Option<String>,
    /// Comma-separated facet names.
    pub facets: Option<String>,
}

pub async fn search(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<SearchParams>,
) -> ServerResult<Json<SearchResult>> {
    let query_string = params
        .query
        .ok_or_else(|| ServerError::BadRequest("no query".into()))?;
    let mut query = Query::new(query_string).page(
        positive(params.from.as_deref(), 0),
        positive(params.length.as_deref(), state.config.search_page_size),
    );
    for name in params.facets.iter().flat_map(|f| f.split(',')) {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let facet: Facet = name.parse().map_err(ServerError::BadRequest)?;
        query = query.add_facet(facet);
    }
    Ok(Json(state.repo.search(&query).await?))
}

pub async fn graphql(
    State(state): State<AppState>,
    document: String,
) -> ServerResult<Json<serde_json::Value>> {
    let projector = state
        .projector
        .as_ref()
        .ok_or_else(|| ServerError::NotFound("no store supports search".into()))?;
    Ok(Json(projector.execute(&document).await))
}

/// The current schema in SDL form.
pub async fn graphql_schema(State(state): State<AppState>) -> ServerResult<String> {
    let projector = state
        .projector
        .as_ref()
        .ok_or_else(|| ServerError::NotFound("no store supports search".into()))?;
    Ok(projector.schema().to_string())
}
