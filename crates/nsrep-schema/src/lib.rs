//! Projection of the inferred model into a queryable schema.
//!
//! Every root type of the model becomes a top-level list field and every
//! parent/child type relation a nested list field on the parent's object
//! type. Lists take an optional `name` filter and are resolved through a
//! [`SearchStore`](nsrep_store::SearchStore) query on id depth, type and
//! id prefix.
//!
//! [`Projector`] keeps the schema in step with the model and evaluates
//! selection documents (see [`document`]) into JSON.

pub mod document;
pub mod error;
pub mod projector;
pub mod resolve;
pub mod schema;

pub use document::{parse_document, Selection};
pub use error::{SchemaError, SchemaResult};
pub use projector::Projector;
pub use resolve::{resolve, resolve_query, Row};
pub use schema::{ListField, ObjectType, ProjectedSchema, ScalarKind};
