//! Foundation types for nsrep, the namespaced metadata repository.
//!
//! Every other nsrep crate depends on `nsrep-types`.
//!
//! # Key Types
//!
//! - [`Id`]: Hierarchical identifier made of `(Type, Key)` pairs
//! - [`Item`]: A stored entity: id, type, name and free-form contents
//! - [`Value`]: Tagged content value, decoded from the JSON wire form
//! - [`Status`]: An item version with its liveness tag, used for history
//! - [`Query`] / [`Facet`] / [`SearchResult`]: Search requests and answers
//! - [`StoreError`]: Error taxonomy shared by every store backend

pub mod error;
pub mod id;
pub mod item;
pub mod query;
pub mod value;

pub use error::{StoreError, StoreResult};
pub use id::{Id, MODEL_TYPE, SEPARATOR};
pub use item::{Item, Status, StatusTag, FIELD_ID, FIELD_NAME, FIELD_TYPE};
pub use query::{escape_query, Facet, Query, Score, SearchResult, DEFAULT_PAGE_LENGTH};
pub use value::{Value, ValueType};
