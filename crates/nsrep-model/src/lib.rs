//! Data model inference for nsrep.
//!
//! The [`Model`] records, for every item type seen so far, the value type of
//! each of its attributes and the types that appear nested below it. It is
//! fed one [`Item`](nsrep_types::Item) at a time and only ever grows.
//!
//! # Rules
//!
//! 1. An attribute's value type is fixed by the first item that carries it;
//!    later conflicting items are reported, never applied.
//! 2. Parent/child type relations accumulate as a set union.
//! 3. Reads take a shared lock; only committing staged additions takes the
//!    exclusive lock.

pub mod error;
pub mod model;

pub use error::ModelError;
pub use model::{AddOutcome, Model, ModelSnapshot, ROOT_TYPE};
