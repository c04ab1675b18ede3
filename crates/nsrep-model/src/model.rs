//! The live data model and its persisted form.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use nsrep_types::{Id, Item, Value, ValueType, MODEL_TYPE};

use crate::error::ModelError;

/// Parent key under which root types are registered.
pub const ROOT_TYPE: &str = "";

const TYPE_ATTRIBUTES: &str = "typeAttributes";
const TYPE_CHILDREN: &str = "typeChildren";

/// Point-in-time copy of the model maps.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    /// Type name -> attribute name -> value type.
    pub type_attributes: BTreeMap<String, BTreeMap<String, ValueType>>,
    /// Parent type name (`""` for roots) -> child type names.
    pub type_children: BTreeMap<String, BTreeSet<String>>,
}

impl ModelSnapshot {
    pub fn child_types(&self, parent_type: &str) -> Vec<String> {
        self.type_children
            .get(parent_type)
            .map(|children| children.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn attributes(&self, item_type: &str) -> BTreeMap<String, ValueType> {
        self.type_attributes
            .get(item_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Every type known to the model, as attribute holder or as child.
    pub fn types(&self) -> BTreeSet<String> {
        let mut types: BTreeSet<String> = self.type_attributes.keys().cloned().collect();
        for children in self.type_children.values() {
            types.extend(children.iter().cloned());
        }
        types
    }
}

/// A staged, idempotent model mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
enum ModelOp {
    AddAttribute {
        item_type: String,
        name: String,
        value_type: ValueType,
    },
    AddChild {
        parent: String,
        child: String,
    },
}

impl ModelOp {
    fn apply(self, state: &mut ModelSnapshot) {
        match self {
            Self::AddAttribute {
                item_type,
                name,
                value_type,
            } => {
                state
                    .type_attributes
                    .entry(item_type)
                    .or_default()
                    .entry(name)
                    .or_insert(value_type);
            }
            Self::AddChild { parent, child } => {
                state.type_children.entry(parent).or_default().insert(child);
            }
        }
    }
}

/// Result of feeding one item to the model.
///
/// `changed` may be `true` even when an error is reported: attribute
/// conflicts do not prevent unrelated additions from the same item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddOutcome {
    pub changed: bool,
    pub error: Option<ModelError>,
}

impl AddOutcome {
    fn rejected(error: ModelError) -> Self {
        Self {
            changed: false,
            error: Some(error),
        }
    }

    /// `Ok(changed)` when no error was reported.
    pub fn into_result(self) -> Result<bool, ModelError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.changed),
        }
    }
}

/// The live data model inferred from stored items.
///
/// Shared between request handlers behind an `Arc`. Staging of additions
/// runs under the read lock and the commit takes the write lock separately,
/// so two concurrent callers may stage the same addition and both report
/// `changed`. Applying an addition twice is a no-op, so the model itself
/// stays consistent.
pub struct Model {
    state: RwLock<ModelSnapshot>,
    generation: AtomicU64,
}

impl Model {
    /// A model that knows no types.
    pub fn empty() -> Self {
        Self {
            state: RwLock::new(ModelSnapshot::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// Rebuild a model from its persisted item.
    ///
    /// Missing or malformed sections are skipped, so the empty item yields
    /// the empty model.
    pub fn from_item(item: &Item) -> Self {
        let model = Self::empty();
        let mut state = model.state.write().expect("model lock poisoned");
        for op in ops_from_item(item) {
            op.apply(&mut state);
        }
        drop(state);
        model
    }

    /// Serialize the model into the reserved model item.
    pub fn to_item(&self) -> Item {
        let state = self.state.read().expect("model lock poisoned");
        let children: BTreeMap<&String, Vec<&String>> = state
            .type_children
            .iter()
            .map(|(parent, children)| (parent, children.iter().collect()))
            .collect();
        let mut item = Item::new(Id::model(), MODEL_TYPE, MODEL_TYPE);
        item.contents.insert(
            TYPE_CHILDREN.into(),
            Value::Other(serde_json::json!(children)),
        );
        item.contents.insert(
            TYPE_ATTRIBUTES.into(),
            Value::Other(serde_json::json!(state.type_attributes)),
        );
        item
    }

    /// Register an item's attributes and type hierarchy.
    pub fn add_item(&self, item: &Item) -> AddOutcome {
        if let Err(err) = check_id(item) {
            return AddOutcome::rejected(err);
        }

        let mut errors = Vec::new();
        let mut ops = Vec::new();
        {
            let state = self.state.read().expect("model lock poisoned");
            let known = state.type_attributes.get(&item.item_type);
            for (name, value) in &item.contents {
                let value_type = value.value_type();
                match known.and_then(|attrs| attrs.get(name)) {
                    None => ops.push(ModelOp::AddAttribute {
                        item_type: item.item_type.clone(),
                        name: name.clone(),
                        value_type,
                    }),
                    Some(&was) if was != value_type => errors.push(ModelError::TypeMismatch {
                        item_type: item.item_type.clone(),
                        attribute: name.clone(),
                        was,
                        now: value_type,
                    }),
                    Some(_) => {}
                }
            }
            stage_children(&state, &item.id, &mut ops);
        }

        let changed = !ops.is_empty();
        if changed {
            let mut state = self.state.write().expect("model lock poisoned");
            for op in ops {
                op.apply(&mut state);
            }
            self.generation.fetch_add(1, Ordering::SeqCst);
            debug!(id = %item.id, item_type = %item.item_type, "model updated");
        }

        AddOutcome {
            changed,
            error: ModelError::combine(errors),
        }
    }

    /// Child types registered under `parent_type` (`""` for root types).
    pub fn child_types(&self, parent_type: &str) -> Vec<String> {
        self.state
            .read()
            .expect("model lock poisoned")
            .child_types(parent_type)
    }

    /// Attribute value types recorded for `item_type`.
    pub fn attributes(&self, item_type: &str) -> BTreeMap<String, ValueType> {
        self.state
            .read()
            .expect("model lock poisoned")
            .attributes(item_type)
    }

    pub fn types(&self) -> BTreeSet<String> {
        self.state.read().expect("model lock poisoned").types()
    }

    pub fn snapshot(&self) -> ModelSnapshot {
        self.state.read().expect("model lock poisoned").clone()
    }

    pub fn is_empty(&self) -> bool {
        let state = self.state.read().expect("model lock poisoned");
        state.type_attributes.is_empty() && state.type_children.is_empty()
    }

    /// Counter bumped on every committed change or reset.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Replace the whole model with the one persisted in `item`.
    pub fn reset_from(&self, item: &Item) {
        let fresh = Self::from_item(item).snapshot();
        *self.state.write().expect("model lock poisoned") = fresh;
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Forget every type.
    pub fn clear(&self) {
        *self.state.write().expect("model lock poisoned") = ModelSnapshot::default();
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read().expect("model lock poisoned");
        f.debug_struct("Model")
            .field("types", &state.type_attributes.len())
            .field("relations", &state.type_children.len())
            .field("generation", &self.generation())
            .finish()
    }
}

fn check_id(item: &Item) -> Result<(), ModelError> {
    let found = item.id.item_type().ok_or_else(|| ModelError::ShortId {
        id: item.id.clone(),
    })?;
    if found != item.item_type {
        return Err(ModelError::NoType {
            declared: item.item_type.clone(),
            found: found.to_string(),
        });
    }
    Ok(())
}

/// Stage an add-child op for every `(parent, child)` type pair along the id
/// that the model does not know yet.
///
/// Pairs are taken from the leaf upward, so with an odd segment count the
/// leading segment belongs to no pair and is ignored.
fn stage_children(state: &ModelSnapshot, id: &Id, ops: &mut Vec<ModelOp>) {
    let segments = id.segments();
    let mut end = segments.len();
    while end >= 2 {
        let child = &segments[end - 2];
        let parent = if end >= 4 {
            segments[end - 4].as_str()
        } else {
            ROOT_TYPE
        };
        end -= 2;
        let known = state
            .type_children
            .get(parent)
            .is_some_and(|children| children.contains(child));
        if !known {
            ops.push(ModelOp::AddChild {
                parent: parent.to_string(),
                child: child.clone(),
            });
        }
    }
}

fn ops_from_item(item: &Item) -> Vec<ModelOp> {
    let mut ops = Vec::new();

    if let Some(value) = item.contents.get(TYPE_CHILDREN) {
        match serde_json::from_value::<BTreeMap<String, Vec<String>>>(value.to_json()) {
            Ok(children) => {
                for (parent, list) in children {
                    ops.extend(list.into_iter().map(|child| ModelOp::AddChild {
                        parent: parent.clone(),
                        child,
                    }));
                }
            }
            Err(e) => warn!(error = %e, "skipping malformed typeChildren"),
        }
    }

    if let Some(value) = item.contents.get(TYPE_ATTRIBUTES) {
        match serde_json::from_value::<BTreeMap<String, BTreeMap<String, ValueType>>>(
            value.to_json(),
        ) {
            Ok(attributes) => {
                for (item_type, attrs) in attributes {
                    ops.extend(attrs.into_iter().map(|(name, value_type)| {
                        ModelOp::AddAttribute {
                            item_type: item_type.clone(),
                            name,
                            value_type,
                        }
                    }));
                }
            }
            Err(e) => warn!(error = %e, "skipping malformed typeAttributes"),
        }
    }

    ops
}
