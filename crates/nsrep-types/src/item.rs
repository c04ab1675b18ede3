use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::Id;
use crate::value::Value;

/// Key of the id in a flattened item.
pub const FIELD_ID: &str = "item.id";
/// Key of the type in a flattened item.
pub const FIELD_TYPE: &str = "item.type";
/// Key of the name in a flattened item.
pub const FIELD_NAME: &str = "item.name";

/// A stored entity.
///
/// The empty item (empty id) is the canonical "not found" answer of every
/// store read. Missing fields deserialize to their empty values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub id: Id,
    #[serde(rename = "type")]
    pub item_type: String,
    pub name: String,
    pub contents: BTreeMap<String, Value>,
}

impl Item {
    pub fn new(id: Id, item_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            item_type: item_type.into(),
            name: name.into(),
            contents: BTreeMap::new(),
        }
    }

    /// Builder-style helper to add one attribute.
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.contents.insert(attribute.into(), value.into());
        self
    }

    /// Returns `true` for the empty / not-found item.
    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    /// Contents plus the `item.id`, `item.type` and `item.name` fields, as
    /// plain JSON values.
    pub fn flatten(&self) -> BTreeMap<String, serde_json::Value> {
        let mut body: BTreeMap<String, serde_json::Value> = self
            .contents
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        body.insert(FIELD_NAME.into(), self.name.clone().into());
        body.insert(FIELD_TYPE.into(), self.item_type.clone().into());
        body.insert(
            FIELD_ID.into(),
            serde_json::Value::from(self.id.segments().to_vec()),
        );
        body
    }
}

/// Liveness of one stored item version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusTag {
    Alive,
    Deleted,
}

impl fmt::Display for StatusTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alive => f.write_str("ALIVE"),
            Self::Deleted => f.write_str("DELETED"),
        }
    }
}

/// An item version together with its liveness, as returned by history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub item: Item,
    pub status: StatusTag,
}

impl Status {
    pub fn alive(item: Item) -> Self {
        Self {
            item,
            status: StatusTag::Alive,
        }
    }

    /// A tombstone carries only the id of the deleted item.
    pub fn deleted(id: Id) -> Self {
        Self {
            item: Item {
                id,
                ..Item::default()
            },
            status: StatusTag::Deleted,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.status == StatusTag::Alive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_wire_shape() {
        let item = Item::new(Id::parse("Table/Table1"), "Table", "Table1");
        let json = serde_json::to_string(&item).unwrap();
        assert_eq!(
            json,
            r#"{"id":["Table","Table1"],"type":"Table","name":"Table1","contents":{}}"#
        );
        let parsed: Item = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, item);
    }

    #[test]
    fn missing_contents_decode_as_empty() {
        let parsed: Item =
            serde_json::from_str(r#"{"id":["Table","T1"],"type":"Table","name":"T1"}"#).unwrap();
        assert!(parsed.contents.is_empty());
    }

    #[test]
    fn empty_item_is_not_found() {
        assert!(Item::default().is_empty());
        assert!(!Item::new(Id::parse("Table/T1"), "Table", "T1").is_empty());
    }

    #[test]
    fn flatten_adds_literal_fields() {
        let item = Item::new(Id::parse("Table/T1"), "Table", "T1")
            .with("rows", 12)
            .with("owner", "alice");
        let flat = item.flatten();
        assert_eq!(flat["rows"], serde_json::json!(12));
        assert_eq!(flat["owner"], serde_json::json!("alice"));
        assert_eq!(flat[FIELD_ID], serde_json::json!(["Table", "T1"]));
        assert_eq!(flat[FIELD_TYPE], serde_json::json!("Table"));
        assert_eq!(flat[FIELD_NAME], serde_json::json!("T1"));
    }

    #[test]
    fn status_tags_serialize_uppercase() {
        let st = Status::deleted(Id::parse("Table/T1"));
        let json = serde_json::to_value(&st).unwrap();
        assert_eq!(json["status"], "DELETED");
        assert!(!st.is_alive());
        assert_eq!(StatusTag::Alive.to_string(), "ALIVE");
    }
}
