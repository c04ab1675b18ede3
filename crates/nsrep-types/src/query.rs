use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::item::Item;

/// Default page size of a new query.
pub const DEFAULT_PAGE_LENGTH: usize = 10;

/// An aggregation dimension returned alongside search results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facet {
    Name,
    Type,
    Namespace,
}

impl Facet {
    pub const ALL: [Facet; 3] = [Facet::Name, Facet::Type, Facet::Namespace];

    /// The indexed field this facet aggregates over.
    pub fn field(self) -> &'static str {
        match self {
            Self::Name => "item.name",
            Self::Type => "item.type",
            Self::Namespace => "item.ns",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => f.write_str("Name"),
            Self::Type => f.write_str("Type"),
            Self::Namespace => f.write_str("Namespace"),
        }
    }
}

impl FromStr for Facet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Name" => Ok(Self::Name),
            "Type" => Ok(Self::Type),
            "Namespace" => Ok(Self::Namespace),
            other => Err(format!("unknown facet: {other}")),
        }
    }
}

/// A paged full-text query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub query_string: String,
    pub from: usize,
    pub length: usize,
    pub facets: Vec<Facet>,
}

impl Query {
    /// First page of ten results, no facets.
    pub fn new(query_string: impl Into<String>) -> Self {
        Self {
            query_string: query_string.into(),
            from: 0,
            length: DEFAULT_PAGE_LENGTH,
            facets: Vec::new(),
        }
    }

    /// A copy of this query with the given paging.
    pub fn page(&self, from: usize, length: usize) -> Self {
        Self {
            from,
            length,
            ..self.clone()
        }
    }

    /// Request one more facet. Facets already requested are ignored.
    pub fn add_facet(mut self, facet: Facet) -> Self {
        if !self.facets.contains(&facet) {
            self.facets.push(facet);
        }
        self
    }

    pub fn add_all_facets(self) -> Self {
        Facet::ALL.into_iter().fold(self, Self::add_facet)
    }
}

/// Escape a raw query string for the search grammar.
///
/// Ids embed `/`, which the query-string grammar treats specially, so every
/// `/` becomes `\/`.
pub fn escape_query(query_string: &str) -> String {
    query_string.replace('/', "\\/")
}

/// An item with its relevance score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub item: Item,
    pub score: f64,
}

/// Search answer: scored items, best first, and the requested facets.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub scores: Vec<Score>,
    /// Facet field -> bucket value -> document count.
    pub facets: BTreeMap<String, BTreeMap<String, u64>>,
}

impl SearchResult {
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.scores.iter().map(|s| &s.item)
    }
}
