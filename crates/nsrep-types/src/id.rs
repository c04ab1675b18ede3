use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between id segments in the string form.
pub const SEPARATOR: char = '/';

/// Type (and sole segment) of the reserved item holding the data model.
pub const MODEL_TYPE: &str = "Model";

/// Hierarchical item identifier.
///
/// An `Id` is an ordered list of path segments. Ids of regular items have an
/// even length of at least two and read as repeating `(Type, Key)` pairs:
/// `["DataSource", "DS1", "Table", "Table1"]` is the `Table1` table inside
/// the `DS1` data source. Every proper prefix of an id names an ancestor
/// namespace.
///
/// The string form joins segments with `/`. The single-segment id
/// `["Model"]` is reserved for the persisted data model.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(Vec<String>);

impl Id {
    /// Build an id from its segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse the `/`-joined string form. The empty string is the empty id.
    pub fn parse(s: &str) -> Self {
        if s.is_empty() {
            return Self::default();
        }
        Self(s.split(SEPARATOR).map(str::to_string).collect())
    }

    /// The reserved id of the persisted data model.
    pub fn model() -> Self {
        Self(vec![MODEL_TYPE.to_string()])
    }

    /// Returns `true` if this is the reserved model id.
    pub fn is_model(&self) -> bool {
        self.0.len() == 1 && self.0[0] == MODEL_TYPE
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The type segment of the last `(Type, Key)` pair, if any.
    pub fn item_type(&self) -> Option<&str> {
        self.0.len().checked_sub(2).map(|i| self.0[i].as_str())
    }

    /// The id without its last `(Type, Key)` pair. Empty for root items.
    pub fn parent(&self) -> Self {
        let end = self.0.len().saturating_sub(2);
        Self(self.0[..end].to_vec())
    }

    /// Extend this id with a `(Type, Key)` pair.
    pub fn child(&self, item_type: impl Into<String>, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(item_type.into());
        segments.push(key.into());
        Self(segments)
    }

    /// Returns `true` if `self` is a strict, segment-wise prefix of `other`.
    pub fn is_prefix_of(&self, other: &Id) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// All ancestor namespaces, as joined strings.
    ///
    /// For an id of length `n` this is every prefix `id[0..1]` up to
    /// `id[0..n-1]`; the id itself is excluded.
    ///
    /// ```
    /// use nsrep_types::Id;
    ///
    /// let id = Id::new(["Organization", "Org1", "Team", "Team1"]);
    /// assert_eq!(
    ///     id.namespaces(),
    ///     vec!["Organization", "Organization/Org1", "Organization/Org1/Team"]
    /// );
    /// ```
    pub fn namespaces(&self) -> Vec<String> {
        (1..self.0.len())
            .map(|end| self.0[..end].join("/"))
            .collect()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({self})")
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<Vec<String>> for Id {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn string_form_joins_segments() {
        let id = Id::new(["DataSource", "DS1", "Table", "Table1"]);
        assert_eq!(id.to_string(), "DataSource/DS1/Table/Table1");
        assert_eq!(Id::parse("DataSource/DS1/Table/Table1"), id);
    }

    #[test]
    fn empty_string_is_empty_id() {
        assert!(Id::parse("").is_empty());
        assert_eq!(Id::default().to_string(), "");
    }

    #[test]
    fn namespaces_of_nested_id() {
        let id = Id::new(["Organization", "Org1", "Team", "Team1"]);
        assert_eq!(
            id.namespaces(),
            vec!["Organization", "Organization/Org1", "Organization/Org1/Team"]
        );
    }

    #[test]
    fn namespaces_of_short_ids() {
        assert!(Id::default().namespaces().is_empty());
        assert!(Id::new(["Table"]).namespaces().is_empty());
        assert_eq!(Id::new(["Table", "T1"]).namespaces(), vec!["Table"]);
    }

    #[test]
    fn model_id_is_reserved() {
        assert!(Id::model().is_model());
        assert!(Id::parse("Model").is_model());
        assert!(!Id::new(["Model", "M1"]).is_model());
    }

    #[test]
    fn item_type_and_parent() {
        let id = Id::new(["DataSource", "DS1", "Table", "Table1"]);
        assert_eq!(id.item_type(), Some("Table"));
        assert_eq!(id.parent(), Id::new(["DataSource", "DS1"]));
        assert_eq!(id.parent().parent(), Id::default());
        assert_eq!(Id::new(["Table1"]).item_type(), None);
    }

    #[test]
    fn child_extends_by_one_pair() {
        let parent = Id::new(["DataSource", "DS1"]);
        assert_eq!(
            parent.child("Table", "Table1"),
            Id::new(["DataSource", "DS1", "Table", "Table1"])
        );
    }

    #[test]
    fn prefix_is_segment_wise() {
        let x = Id::parse("Table/T1");
        assert!(x.is_prefix_of(&Id::parse("Table/T1/Column/C1")));
        assert!(!x.is_prefix_of(&x));
        assert!(!x.is_prefix_of(&Id::parse("Table/T10/Column/C1")));
    }

    #[test]
    fn serde_is_a_plain_list() {
        let id = Id::new(["Table", "T1"]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#"["Table","T1"]"#);
        let parsed: Id = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    proptest! {
        #[test]
        fn string_round_trip(segments in prop::collection::vec("[A-Za-z0-9_.-]{1,12}", 1..8)) {
            let id = Id::new(segments);
            prop_assert_eq!(Id::parse(&id.to_string()), id);
        }

        #[test]
        fn namespace_count(segments in prop::collection::vec("[a-z]{1,4}", 1..10)) {
            let id = Id::new(segments);
            prop_assert_eq!(id.namespaces().len(), id.len() - 1);
        }
    }
}
