use std::collections::BTreeMap;

use tracing::debug;

use nsrep_store::query_string::quote;
use nsrep_store::{SearchStore, FIELD_ID_LENGTH};
use nsrep_types::{Id, Query, FIELD_ID, FIELD_NAME, FIELD_TYPE};

use crate::error::SchemaResult;

/// A matched item projected to its flat attribute map.
pub type Row = BTreeMap<String, serde_json::Value>;

/// Number of items fetched for one list field.
pub const DEFAULT_RESOLVE_LENGTH: usize = 100;

/// Query string selecting the items of `item_type` directly below `parent`.
pub fn resolve_query(item_type: &str, name_filter: Option<&str>, parent: &Id) -> String {
    let mut query = format!(
        "{FIELD_ID_LENGTH}:{} and {FIELD_TYPE}:{}",
        parent.len() + 2,
        quote(item_type)
    );
    if let Some(name) = name_filter {
        query.push_str(&format!(" and {FIELD_NAME}:{}", quote(name)));
    }
    if !parent.is_empty() {
        query.push_str(&format!(" and {FIELD_ID}:{}*", quote(&format!("{parent}/"))));
    }
    query
}

/// Items of `item_type` directly below `parent` (the root when empty),
/// optionally restricted to one name.
pub async fn resolve(
    search: &dyn SearchStore,
    item_type: &str,
    name_filter: Option<&str>,
    parent: &Id,
    length: usize,
) -> SchemaResult<Vec<Row>> {
    let depth = parent.len() + 2;
    let query = Query::new(resolve_query(item_type, name_filter, parent)).page(0, length);
    let result = search.search(&query).await?;
    debug!(query = %query.query_string, hits = result.scores.len(), "list field resolved");

    // The search backend may match loosely, so type and depth are checked
    // again on the results.
    Ok(result
        .items()
        .filter(|item| item.item_type == item_type && item.id.len() == depth)
        .map(|item| item.flatten())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nsrep_store::{InMemorySearchStore, Store};
    use nsrep_types::Item;

    async fn seeded() -> InMemorySearchStore {
        let store = InMemorySearchStore::new();
        for (id, name) in [
            ("Organization/O1", "Acme"),
            ("Organization/O2", "Globex"),
            ("Organization/O1/Team/T1", "Core"),
            ("Organization/O1/Team/T2", "Web Team"),
            ("Organization/O2/Team/T1", "Core"),
            ("Organization/O1/Team/T1/Team/T9", "Nested"),
        ] {
            let id = Id::parse(id);
            let ty = id.item_type().unwrap_or_default().to_string();
            store.write(&Item::new(id, ty, name).with("size", 2)).await.unwrap();
        }
        store
    }

    fn names(rows: &[Row]) -> Vec<&str> {
        rows.iter()
            .map(|r| r[FIELD_NAME].as_str().unwrap_or_default())
            .collect()
    }

    #[test]
    fn query_text() {
        assert_eq!(
            resolve_query("Team", Some("Web Team"), &Id::parse("Organization/O1")),
            r#"item.idlength:4 and item.type:"Team" and item.name:"Web Team" and item.id:"Organization/O1/"*"#
        );
        assert_eq!(
            resolve_query("Organization", None, &Id::default()),
            r#"item.idlength:2 and item.type:"Organization""#
        );
    }

    #[tokio::test]
    async fn root_items() {
        let store = seeded().await;
        let rows = resolve(&store, "Organization", None, &Id::default(), 100)
            .await
            .unwrap();
        assert_eq!(names(&rows), vec!["Acme", "Globex"]);
        assert_eq!(rows[0]["size"], serde_json::json!(2));
        assert_eq!(rows[0][FIELD_ID], serde_json::json!(["Organization", "O1"]));
    }

    #[tokio::test]
    async fn children_of_one_parent_only() {
        let store = seeded().await;
        let rows = resolve(&store, "Team", None, &Id::parse("Organization/O1"), 100)
            .await
            .unwrap();
        assert_eq!(names(&rows), vec!["Core", "Web Team"]);
    }

    #[tokio::test]
    async fn name_filter_is_exact() {
        let store = seeded().await;
        let rows = resolve(
            &store,
            "Team",
            Some("Web Team"),
            &Id::parse("Organization/O1"),
            100,
        )
        .await
        .unwrap();
        assert_eq!(names(&rows), vec!["Web Team"]);

        let none = resolve(&store, "Team", Some("Web"), &Id::parse("Organization/O1"), 100)
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
