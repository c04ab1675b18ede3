use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use nsrep_repo::RepoError;
use nsrep_types::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("BAD_REQUEST: {0}")]
    BadRequest(String),

    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        Self::Repo(e.into())
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Repo(RepoError::Model(_)) => StatusCode::BAD_REQUEST,
            Self::Repo(RepoError::Store(StoreError::EmptyItem)) => StatusCode::BAD_REQUEST,
            Self::Repo(RepoError::NoSearch | RepoError::NoHistory) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use nsrep_model::ModelError;

    #[test]
    fn status_mapping() {
        let model = ServerError::from(RepoError::from(ModelError::Multiple(vec![])));
        assert_eq!(model.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ServerError::from(StoreError::EmptyItem).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::from(RepoError::NoHistory).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::from(StoreError::Closed).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_keep_the_code() {
        let err = ServerError::from(StoreError::Closed);
        assert!(err.to_string().starts_with("STORE_CLOSED"));
    }
}
