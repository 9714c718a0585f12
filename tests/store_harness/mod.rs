//! Macro-generated test suite for `RecordStore` contract validation.
//!
//! The `record_store_tests!` macro generates a test module that validates any
//! `RecordStore` implementation against the contract the engine relies on:
//! key assignment, merge-on-save, lookups, pivot maintenance and
//! transactions.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod store_harness;
//!
//! use store_harness::*;
//! use nestmut::storage::InMemoryRecordStore;
//!
//! record_store_tests!(
//!     InMemoryRecordStore::new,
//!     |store: &InMemoryRecordStore, parent: &Record, field: &str| {
//!         store.pivot_links(parent, field).expect("links")
//!     }
//! );
//! ```
//!
//! # Generated Tests
//!
//! ## Records
//! - `test_save_assigns_key`: new record gets a key and is marked persisted
//! - `test_save_merges_attributes`: saving an existing key keeps unset columns
//! - `test_find_by_key_accepts_string_keys`: `1` and `"1"` find the same row
//! - `test_query_by_keys_skips_missing`: unknown keys are ignored
//! - `test_find_by_columns`: all columns must match
//! - `test_delete`: deleted rows are gone
//!
//! ## Pivots
//! - `test_attach_and_detach`: links are added and removed per parent
//! - `test_sync_detaching`: keys not listed are detached
//! - `test_sync_without_detaching`: existing links survive
//! - `test_pivot_on_unsaved_parent_fails`: the parent needs a key
//!
//! ## Transactions
//! - `test_rollback_discards_writes`
//! - `test_commit_keeps_writes`

#![allow(dead_code)]

use nestmut::prelude::*;

/// Models used by the contract tests
pub fn harness_config() -> ModelsConfig {
    ModelsConfig {
        models: vec![
            ModelConfig::new("Author").with_relation(
                Relation::new("tags", RelationKind::ManyToMany)
                    .related("Tag")
                    .pivot("author_tag", "author_id", "tag_id"),
            ),
            ModelConfig::new("Tag"),
        ],
    }
}

/// Build a new, unsaved record from a JSON object
pub fn record(model: &str, attributes: Value) -> Record {
    let mut record = Record::new(model);
    if let Value::Object(map) = attributes {
        record.fill(map);
    }
    record
}

/// Generate a `RecordStore` conformance test suite.
///
/// `$factory` must be callable with a [`ModelsConfig`] and return a store. It
/// is called once per test to keep tests isolated. `$links` reads back the
/// pivot links of a parent record, since the trait has no read for them.
#[macro_export]
macro_rules! record_store_tests {
    ($factory:expr, $links:expr) => {
        mod record_store_contract_tests {
            use super::*;

            async fn saved<S: RecordStore>(store: &S, model: &str, attributes: Value) -> Record {
                let mut record = record(model, attributes);
                store.save(&mut record).await.expect("save");
                record
            }

            // ==================================================================
            // Records
            // ==================================================================

            #[tokio::test]
            async fn test_save_assigns_key() {
                let store = ($factory)(harness_config());
                let mut author = record("Author", json!({"name": "a"}));
                assert!(!author.exists());

                store.save(&mut author).await.expect("save");

                assert!(author.exists());
                assert!(author.key("id").is_some());
            }

            #[tokio::test]
            async fn test_save_merges_attributes() {
                let store = ($factory)(harness_config());
                let author = saved(&store, "Author", json!({"name": "a", "bio": "b"})).await;
                let key = author.key("id").cloned().expect("key");

                let mut partial = Record::existing("Author", common_map(json!({"id": key.clone(), "name": "renamed"})));
                store.save(&mut partial).await.expect("save");

                let found = store
                    .find_by_key("Author", &key)
                    .await
                    .expect("find")
                    .expect("row exists");
                assert_eq!(found.get("name"), Some(&json!("renamed")));
                assert_eq!(found.get("bio"), Some(&json!("b")));
            }

            #[tokio::test]
            async fn test_find_by_key_accepts_string_keys() {
                let store = ($factory)(harness_config());
                let author = saved(&store, "Author", json!({"name": "a"})).await;
                let key = author.key("id").cloned().expect("key");
                let as_string = Value::String(match &key {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                });

                let found = store.find_by_key("Author", &as_string).await.expect("find");
                assert!(found.is_some());
            }

            #[tokio::test]
            async fn test_query_by_keys_skips_missing() {
                let store = ($factory)(harness_config());
                let first = saved(&store, "Tag", json!({"label": "x"})).await;
                let second = saved(&store, "Tag", json!({"label": "y"})).await;
                let keys = vec![
                    second.key("id").cloned().expect("key"),
                    json!(999),
                    first.key("id").cloned().expect("key"),
                ];

                let found = store.query_by_keys("Tag", &keys).await.expect("query");

                let labels: Vec<_> = found.iter().filter_map(|r| r.get("label").cloned()).collect();
                assert_eq!(labels, vec![json!("y"), json!("x")]);
            }

            #[tokio::test]
            async fn test_find_by_columns() {
                let store = ($factory)(harness_config());
                saved(&store, "Author", json!({"name": "a", "team": 1})).await;
                saved(&store, "Author", json!({"name": "a", "team": 2})).await;

                let found = store
                    .find_by_columns("Author", &common_map(json!({"name": "a", "team": 2})))
                    .await
                    .expect("find")
                    .expect("match");
                assert_eq!(found.get("team"), Some(&json!(2)));

                let none = store
                    .find_by_columns("Author", &common_map(json!({"name": "b"})))
                    .await
                    .expect("find");
                assert!(none.is_none());
            }

            #[tokio::test]
            async fn test_delete() {
                let store = ($factory)(harness_config());
                let author = saved(&store, "Author", json!({"name": "a"})).await;
                let key = author.key("id").cloned().expect("key");

                store.delete("Author", &[key.clone()]).await.expect("delete");

                assert!(store.find_by_key("Author", &key).await.expect("find").is_none());
            }

            // ==================================================================
            // Pivots
            // ==================================================================

            #[tokio::test]
            async fn test_attach_and_detach() {
                let store = ($factory)(harness_config());
                let author = saved(&store, "Author", json!({"name": "a"})).await;
                let other = saved(&store, "Author", json!({"name": "b"})).await;

                store
                    .attach_pivot(&author, "tags", &[PivotEntry::new(json!(1)), PivotEntry::new(json!(2))])
                    .await
                    .expect("attach");
                store
                    .attach_pivot(&other, "tags", &[PivotEntry::new(json!(1))])
                    .await
                    .expect("attach");
                store.detach_pivot(&author, "tags", &[json!(1)]).await.expect("detach");

                assert_eq!(keys(($links)(&store, &author, "tags")), vec![json!(2)]);
                assert_eq!(keys(($links)(&store, &other, "tags")), vec![json!(1)]);
            }

            #[tokio::test]
            async fn test_sync_detaching() {
                let store = ($factory)(harness_config());
                let author = saved(&store, "Author", json!({"name": "a"})).await;
                store
                    .attach_pivot(&author, "tags", &[PivotEntry::new(json!(1)), PivotEntry::new(json!(2))])
                    .await
                    .expect("attach");

                let mut attributes = serde_json::Map::new();
                attributes.insert("weight".to_string(), json!(3));
                store
                    .sync_pivot(
                        &author,
                        "tags",
                        &[PivotEntry::with_attributes(json!(2), attributes.clone()), PivotEntry::new(json!(3))],
                        true,
                    )
                    .await
                    .expect("sync");

                let links = ($links)(&store, &author, "tags");
                assert_eq!(keys(links.clone()), vec![json!(2), json!(3)]);
                assert_eq!(links[0].attributes, attributes);
            }

            #[tokio::test]
            async fn test_sync_without_detaching() {
                let store = ($factory)(harness_config());
                let author = saved(&store, "Author", json!({"name": "a"})).await;

                store
                    .sync_pivot(&author, "tags", &[PivotEntry::new(json!(1))], false)
                    .await
                    .expect("sync");
                store
                    .sync_pivot(&author, "tags", &[PivotEntry::new(json!(2))], false)
                    .await
                    .expect("sync");

                assert_eq!(keys(($links)(&store, &author, "tags")), vec![json!(1), json!(2)]);
            }

            #[tokio::test]
            async fn test_pivot_on_unsaved_parent_fails() {
                let store = ($factory)(harness_config());
                let author = record("Author", json!({"name": "a"}));

                let result = store.attach_pivot(&author, "tags", &[PivotEntry::new(json!(1))]).await;
                assert!(result.is_err());
            }

            // ==================================================================
            // Transactions
            // ==================================================================

            #[tokio::test]
            async fn test_rollback_discards_writes() {
                let store = ($factory)(harness_config());
                let kept = saved(&store, "Author", json!({"name": "kept"})).await;

                store.begin().await.expect("begin");
                let dropped = saved(&store, "Author", json!({"name": "dropped"})).await;
                store.rollback().await.expect("rollback");

                let kept_key = kept.key("id").cloned().expect("key");
                let dropped_key = dropped.key("id").cloned().expect("key");
                assert!(store.find_by_key("Author", &kept_key).await.expect("find").is_some());
                assert!(store.find_by_key("Author", &dropped_key).await.expect("find").is_none());
            }

            #[tokio::test]
            async fn test_commit_keeps_writes() {
                let store = ($factory)(harness_config());

                store.begin().await.expect("begin");
                let author = saved(&store, "Author", json!({"name": "a"})).await;
                store.commit().await.expect("commit");

                let key = author.key("id").cloned().expect("key");
                assert!(store.find_by_key("Author", &key).await.expect("find").is_some());
            }

            fn keys(links: Vec<PivotEntry>) -> Vec<Value> {
                links.into_iter().map(|entry| entry.key).collect()
            }

            fn common_map(value: Value) -> serde_json::Map<String, Value> {
                match value {
                    Value::Object(map) => map,
                    other => panic!("expected an object, got {}", other),
                }
            }
        }
    };
}
