//! The projected schema: one object type per model type, list fields for
//! the type hierarchy.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use nsrep_model::{ModelSnapshot, ROOT_TYPE};
use nsrep_types::{ValueType, FIELD_ID, FIELD_NAME, FIELD_TYPE};

/// The only argument a list field accepts: an exact item name filter.
pub const NAME_ARGUMENT: &str = "name";

/// Output kind of an attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ScalarKind {
    String,
    Int,
    Float,
    Boolean,
    /// The segments of an item id.
    Path,
}

impl From<ValueType> for ScalarKind {
    fn from(value_type: ValueType) -> Self {
        match value_type {
            ValueType::String | ValueType::Other => Self::String,
            ValueType::Integer => Self::Int,
            ValueType::Float => Self::Float,
            ValueType::Bool => Self::Boolean,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "String",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::Path => "[String]",
        };
        f.write_str(name)
    }
}

/// A list of items of the type it is named after.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ListField {
    pub name: String,
}

impl ListField {
    pub fn item_type(&self) -> &str {
        &self.name
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ObjectType {
    pub name: String,
    /// Attribute fields, including the `item.*` identity fields.
    pub scalars: BTreeMap<String, ScalarKind>,
    /// Child type lists, sorted by name.
    pub lists: Vec<ListField>,
}

impl ObjectType {
    pub fn scalar(&self, field: &str) -> Option<ScalarKind> {
        self.scalars.get(field).copied()
    }

    pub fn list(&self, field: &str) -> Option<&ListField> {
        self.lists.iter().find(|l| l.name == field)
    }
}

/// Schema built from a model snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProjectedSchema {
    /// Top-level lists, one per root type, sorted by name.
    pub roots: Vec<ListField>,
    pub objects: BTreeMap<String, ObjectType>,
}

impl ProjectedSchema {
    pub fn build(model: &ModelSnapshot) -> Self {
        let objects = model
            .types()
            .into_iter()
            .map(|name| {
                let mut scalars: BTreeMap<String, ScalarKind> = model
                    .attributes(&name)
                    .into_iter()
                    .map(|(attr, value_type)| (attr, value_type.into()))
                    .collect();
                scalars.insert(FIELD_ID.to_string(), ScalarKind::Path);
                scalars.insert(FIELD_TYPE.to_string(), ScalarKind::String);
                scalars.insert(FIELD_NAME.to_string(), ScalarKind::String);
                let lists = lists(model.child_types(&name));
                let object = ObjectType {
                    name: name.clone(),
                    scalars,
                    lists,
                };
                (name, object)
            })
            .collect();

        Self {
            roots: lists(model.child_types(ROOT_TYPE)),
            objects,
        }
    }

    pub fn root(&self, field: &str) -> Option<&ListField> {
        self.roots.iter().find(|l| l.name == field)
    }

    pub fn object(&self, name: &str) -> Option<&ObjectType> {
        self.objects.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

fn lists(mut names: Vec<String>) -> Vec<ListField> {
    names.sort();
    names.into_iter().map(|name| ListField { name }).collect()
}

/// Renders the schema in GraphQL SDL. Identity field names contain dots
/// and are quoted with backticks.
impl fmt::Display for ProjectedSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "type Query {{")?;
        for root in &self.roots {
            writeln!(f, "  {0}({NAME_ARGUMENT}: String): [{0}]", root.name)?;
        }
        writeln!(f, "}}")?;
        for object in self.objects.values() {
            writeln!(f)?;
            writeln!(f, "type {} {{", object.name)?;
            for (field, kind) in &object.scalars {
                if field.contains('.') {
                    writeln!(f, "  `{field}`: {kind}")?;
                } else {
                    writeln!(f, "  {field}: {kind}")?;
                }
            }
            for list in &object.lists {
                writeln!(f, "  {0}({NAME_ARGUMENT}: String): [{0}]", list.name)?;
            }
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}
