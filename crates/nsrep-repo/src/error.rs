use nsrep_model::ModelError;
use nsrep_types::StoreError;

/// Errors surfaced by [`Repository`](crate::Repository) operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("NO_SEARCH: No configured store supports search")]
    NoSearch,

    #[error("NO_HISTORY: No configured store keeps history")]
    NoHistory,
}

impl RepoError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Store(e) => e.code(),
            Self::Model(e) => e.code(),
            Self::NoSearch => "NO_SEARCH",
            Self::NoHistory => "NO_HISTORY",
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;
