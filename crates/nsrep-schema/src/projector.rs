use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use serde_json::{json, Map, Value as Json};
use tracing::debug;

use nsrep_model::Model;
use nsrep_store::SearchStore;
use nsrep_types::{Id, FIELD_ID};

use crate::document::{parse_document, Selection};
use crate::error::SchemaError;
use crate::resolve::{resolve, Row, DEFAULT_RESOLVE_LENGTH};
use crate::schema::{ListField, ObjectType, ProjectedSchema, NAME_ARGUMENT};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

const ROOT_OWNER: &str = "Query";

struct CachedSchema {
    generation: u64,
    schema: Arc<ProjectedSchema>,
}

/// Evaluates selection documents against the live model.
///
/// The projected schema is cached and rebuilt on first use after the
/// model's generation counter moves.
pub struct Projector {
    model: Arc<Model>,
    search: Arc<dyn SearchStore>,
    resolve_length: usize,
    cache: RwLock<Option<CachedSchema>>,
}

impl Projector {
    pub fn new(model: Arc<Model>, search: Arc<dyn SearchStore>) -> Self {
        Self {
            model,
            search,
            resolve_length: DEFAULT_RESOLVE_LENGTH,
            cache: RwLock::new(None),
        }
    }

    /// Cap on the items returned for one list field.
    pub fn with_resolve_length(mut self, length: usize) -> Self {
        self.resolve_length = length;
        self
    }

    /// The schema for the current model.
    pub fn schema(&self) -> Arc<ProjectedSchema> {
        let generation = self.model.generation();
        if let Some(cached) = self.cache.read().expect("lock poisoned").as_ref() {
            if cached.generation == generation {
                return Arc::clone(&cached.schema);
            }
        }

        // The generation is read before the snapshot, so a change racing
        // with this build triggers another one.
        let schema = Arc::new(ProjectedSchema::build(&self.model.snapshot()));
        debug!(generation, roots = schema.roots.len(), "schema rebuilt");
        *self.cache.write().expect("lock poisoned") = Some(CachedSchema {
            generation,
            schema: Arc::clone(&schema),
        });
        schema
    }

    /// Run a selection document, returning `{"data": ..}` plus an
    /// `"errors"` list when anything failed.
    ///
    /// A failing field is reported and resolves to `null`; its siblings
    /// are still evaluated.
    pub async fn execute(&self, document: &str) -> Json {
        let selections = match parse_document(document) {
            Ok(selections) => selections,
            Err(e) => return response(Json::Null, &[e]),
        };
        let schema = self.schema();
        let mut errors = Vec::new();
        let mut data = Map::new();
        for selection in &selections {
            let value = match schema.root(&selection.name) {
                Some(field) => {
                    self.list(
                        &schema,
                        ROOT_OWNER,
                        field,
                        selection,
                        &Id::default(),
                        &mut errors,
                    )
                    .await
                }
                None => {
                    errors.push(unknown(ROOT_OWNER, &selection.name));
                    Json::Null
                }
            };
            data.insert(selection.name.clone(), value);
        }
        response(Json::Object(data), &errors)
    }

    /// Resolve the list `field` of `owner` below `parent`.
    fn list<'a>(
        &'a self,
        schema: &'a ProjectedSchema,
        owner: &'a str,
        field: &'a ListField,
        selection: &'a Selection,
        parent: &'a Id,
        errors: &'a mut Vec<SchemaError>,
    ) -> BoxFuture<'a, Json> {
        Box::pin(async move {
            if let Some(argument) = selection.arguments.keys().find(|a| *a != NAME_ARGUMENT) {
                errors.push(SchemaError::UnknownArgument {
                    field: field.name.clone(),
                    argument: argument.clone(),
                });
                return Json::Null;
            }
            let Some(object) = schema.object(field.item_type()) else {
                errors.push(unknown(owner, &field.name));
                return Json::Null;
            };
            let name_filter = selection.arguments.get(NAME_ARGUMENT).map(String::as_str);
            let rows = match resolve(
                self.search.as_ref(),
                field.item_type(),
                name_filter,
                parent,
                self.resolve_length,
            )
            .await
            {
                Ok(rows) => rows,
                Err(e) => {
                    errors.push(e);
                    return Json::Null;
                }
            };

            let mut out = Vec::with_capacity(rows.len());
            for row in rows {
                out.push(self.object(schema, object, row, selection, errors).await);
            }
            Json::Array(out)
        })
    }

    fn object<'a>(
        &'a self,
        schema: &'a ProjectedSchema,
        object: &'a ObjectType,
        row: Row,
        selection: &'a Selection,
        errors: &'a mut Vec<SchemaError>,
    ) -> BoxFuture<'a, Json> {
        Box::pin(async move {
            // Without sub-selections every stored attribute is returned.
            if selection.selections.is_empty() {
                return Json::Object(row.into_iter().collect());
            }
            let id: Id = row
                .get(FIELD_ID)
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default();

            let mut out = Map::new();
            for sub in &selection.selections {
                let value = if object.scalar(&sub.name).is_some() {
                    row.get(&sub.name).cloned().unwrap_or(Json::Null)
                } else if let Some(list) = object.list(&sub.name) {
                    self.list(schema, &object.name, list, sub, &id, errors)
                        .await
                } else {
                    errors.push(unknown(&object.name, &sub.name));
                    Json::Null
                };
                out.insert(sub.name.clone(), value);
            }
            Json::Object(out)
        })
    }
}

impl std::fmt::Debug for Projector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projector")
            .field("generation", &self.model.generation())
            .field("resolve_length", &self.resolve_length)
            .finish()
    }
}

fn unknown(owner: &str, field: &str) -> SchemaError {
    SchemaError::UnknownField {
        owner: owner.to_string(),
        field: field.to_string(),
    }
}

fn response(data: Json, errors: &[SchemaError]) -> Json {
    let mut body = json!({ "data": data });
    if !errors.is_empty() {
        body["errors"] = errors
            .iter()
            .map(|e| json!({ "message": e.to_string(), "code": e.code() }))
            .collect();
    }
    body
}
