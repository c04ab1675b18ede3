/// Errors from store operations.
///
/// Every message starts with a stable code (`EMPTY_ITEM`, `STORE_CLOSED`,
/// ...) so callers and logs can match on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A write was given the empty item.
    #[error("EMPTY_ITEM: Empty item provided")]
    EmptyItem,

    /// The store could not be created or connected.
    #[error("STORE_CREATION: {0}")]
    Creation(String),

    /// The store failed to close cleanly.
    #[error("STORE_CLOSE: {0}")]
    Close(String),

    /// Operation on a store that was already closed.
    #[error("STORE_CLOSED: Store is closed")]
    Closed,

    /// Backend failure.
    #[error("STORE_INTERNAL: {0}")]
    Internal(String),

    /// Contents could not be serialized for the backend.
    #[error("ITEM_MARSHALL: {0}")]
    Marshall(String),

    /// Contents read from the backend could not be decoded.
    #[error("ITEM_UNMARSHALL: {0}")]
    Unmarshall(String),

    /// Several item-level failures, one message per line.
    #[error("ITEM_MULTIPLE: {}", .0.join("\n"))]
    Multiple(Vec<String>),

    /// A streaming scan stopped because its consumer went away.
    #[error("SCAN_CANCELLED: scan consumer stopped draining")]
    Cancelled,
}

impl StoreError {
    /// Combine collected messages: `Ok` when there are none.
    pub fn multiple(errors: Vec<String>) -> StoreResult<()> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self::Multiple(errors))
        }
    }

    /// The stable code at the start of the message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyItem => "EMPTY_ITEM",
            Self::Creation(_) => "STORE_CREATION",
            Self::Close(_) => "STORE_CLOSE",
            Self::Closed => "STORE_CLOSED",
            Self::Internal(_) => "STORE_INTERNAL",
            Self::Marshall(_) => "ITEM_MARSHALL",
            Self::Unmarshall(_) => "ITEM_UNMARSHALL",
            Self::Multiple(_) => "ITEM_MULTIPLE",
            Self::Cancelled => "SCAN_CANCELLED",
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
