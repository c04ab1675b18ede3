//! Orchestration of the nsrep stores.
//!
//! A [`Repository`] owns a primary store, an optional secondary store and
//! the live [`Model`](nsrep_model::Model). Every write keeps the model in
//! step with the data, persisting it to the primary store under the
//! reserved `Model` id before the item itself. The secondary store is
//! updated in the background and never fails a request.
//!
//! Deleting an id removes its whole subtree when some store can search;
//! see [`delete_tree`].

pub mod error;
pub mod repository;
pub mod tree;

pub use error::{RepoError, RepoResult};
pub use repository::Repository;
pub use tree::{delete_tree, delete_tree_with_cancel};
