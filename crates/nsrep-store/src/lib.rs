//! Storage contracts for nsrep and their in-memory implementations.
//!
//! # Contracts
//!
//! - [`Store`] -- durable item storage: read, write, delete, close
//! - [`HistoryStore`] -- optional: every stored version of an item
//! - [`SearchStore`] -- optional: paged full-text search and unpaged scans
//!
//! A store advertises the optional capabilities through
//! [`Store::as_history`] and [`Store::as_search`].
//!
//! # Backends
//!
//! - [`InMemoryStore`] -- append-only version log, the primary store
//! - [`InMemorySearchStore`] -- field-indexed documents, the search store
//!
//! Both hold their state behind a `RwLock` and are safe to share across
//! tasks. Queries use the small grammar in [`query_string`].

pub mod connect;
pub mod memory;
pub mod query_string;
pub mod search;
pub mod traits;

pub use connect::{connect_with_retry, RetryPolicy};
pub use memory::InMemoryStore;
pub use search::{InMemorySearchStore, FIELD_ID_LENGTH, FIELD_NAMESPACE};
pub use traits::{HistoryStore, SearchStore, Store};

pub use nsrep_types::{StoreError, StoreResult};
