//! Tests for the query result module

use super::*;
use crate::error::{BoxError, Error, ErrorCode, Result, ResultError};
use crate::pagination::MoreResults;
use crate::sobject::{Field, FromRecord, GenericObject, ObjectMap, Record, SObject};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Account {
    id: String,
    name: String,
}

impl SObject for Account {
    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }

    fn type_name(&self) -> Option<&str> {
        Some("Account")
    }
}

impl FromRecord for Account {
    fn from_record(record: Record) -> Result<Self> {
        Ok(Self {
            id: record.require_str("Id")?.to_string(),
            name: record.require_str("Name")?.to_string(),
        })
    }
}

fn account(id: &str, name: &str) -> Value {
    json!({
        "attributes": {
            "type": "Account",
            "url": format!("/services/data/v59.0/sobjects/Account/{id}")
        },
        "Id": id,
        "Name": name
    })
}

fn page(records: Vec<Value>, next: Option<&str>) -> Value {
    json!({
        "done": next.is_none(),
        "totalSize": records.len(),
        "records": records,
        "nextRecordsUrl": next
    })
}

fn account_map() -> Arc<ObjectMap> {
    Arc::new(ObjectMap::new().bind::<Account>("Account"))
}

/// Account map whose factory counts every record it builds
fn counting_map(parsed: &Arc<AtomicUsize>) -> Arc<ObjectMap> {
    let counter = Arc::clone(parsed);
    Arc::new(
        ObjectMap::new()
            .register_factory("Account", move |record: Record| -> Result<Box<dyn SObject>> {
                counter.fetch_add(1, Ordering::SeqCst);
                if record.str("Name") == Some("broken") {
                    return Err(Error::invalid_field("Name", "broken record"));
                }
                Ok(Box::new(Account::from_record(record)?))
            })
            .map_type("Account", "Account"),
    )
}

/// Continuation serving canned pages by cursor
#[derive(Clone)]
struct StubPages {
    pages: Arc<HashMap<String, Value>>,
    calls: Arc<AtomicUsize>,
    map: Arc<ObjectMap>,
}

impl StubPages {
    fn new(map: &Arc<ObjectMap>, pages: Vec<(&str, Value)>) -> Self {
        Self {
            pages: Arc::new(
                pages
                    .into_iter()
                    .map(|(cursor, body)| (cursor.to_string(), body))
                    .collect(),
            ),
            calls: Arc::new(AtomicUsize::new(0)),
            map: Arc::clone(map),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MoreResults for StubPages {
    fn fetch(&self, cursor: &str, _class_name: &str) -> Result<Option<QueryResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.pages.get(cursor) {
            Some(body) => QueryResult::new(
                body.clone(),
                Arc::clone(&self.map),
                Some(Arc::new(self.clone())),
            )
            .map(Some),
            None => Ok(None),
        }
    }
}

fn ids(result: &mut QueryResult) -> Vec<String> {
    result.iter().map(|entry| entry.unwrap().0).collect()
}

// ============================================================================
// Factory Tests
// ============================================================================

#[test]
fn test_from_response_200_decodes_body() {
    let body = page(vec![account("001A", "Acme")], None);
    let mut result =
        QueryResult::from_response(RawResponse::json(200, &body), account_map(), None).unwrap();

    assert_eq!(result.class_name(), "Account");
    assert_eq!(ids(&mut result), vec!["001A"]);
}

#[test]
fn test_from_response_201_exposes_last_id() {
    let body = json!({"id": "001B", "success": true, "errors": []});
    let mut result =
        QueryResult::from_response(RawResponse::json(201, &body), account_map(), None).unwrap();

    assert_eq!(result.last_id(), Some("001B"));
    assert!(result.first().unwrap().is_none());
}

#[test]
fn test_from_response_unexpected_status() {
    let response = RawResponse::json(500, &json!([{"errorCode": "UNKNOWN_EXCEPTION"}]));
    let err = QueryResult::from_response(response, account_map(), None).unwrap_err();

    assert_eq!(err.code(), Some(ErrorCode::UnexpectedStatusCode));
    assert!(matches!(
        err,
        Error::Result(ResultError::UnexpectedStatusCode { status: 500 })
    ));
}

#[test]
fn test_from_response_204_never_reads_body() {
    struct UnreadBody;

    impl Response for UnreadBody {
        fn status(&self) -> u16 {
            204
        }

        fn into_body(self) -> std::result::Result<Vec<u8>, BoxError> {
            panic!("body of a 204 response must not be read");
        }
    }

    let mut result = QueryResult::from_response(UnreadBody, account_map(), None).unwrap();
    assert_eq!(result.total_size(), 0);
    assert!(result.records().is_empty());
    assert!(result.to_map().unwrap().is_empty());
}

#[test]
fn test_from_response_invalid_json() {
    let response = RawResponse::new(200, "{\"records\": [");
    let err = QueryResult::from_response(response, account_map(), None).unwrap_err();

    assert_eq!(err.code(), Some(ErrorCode::UnparsableResponse));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_from_response_unexpected_shape() {
    for body in [json!([1, 2, 3]), json!({"records": "nope"}), json!("text")] {
        let err = QueryResult::from_response(RawResponse::json(200, &body), account_map(), None)
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::UnparsableResponse));
    }
}

// ============================================================================
// Construction Tests
// ============================================================================

#[test]
fn test_single_entity_is_normalized() {
    let mut result = QueryResult::new(account("001A", "Acme"), account_map(), None).unwrap();

    assert!(result.is_done());
    assert_eq!(result.total_size(), 1);
    assert_eq!(result.records().len(), 1);
    assert_eq!(
        result.envelope(),
        &Envelope::single(account("001A", "Acme").as_object().unwrap().clone())
    );
    assert!(result.envelope().next_records_url.is_none());

    let first = result.first().unwrap().unwrap();
    assert_eq!(
        first.downcast_ref::<Account>(),
        Some(&Account {
            id: "001A".to_string(),
            name: "Acme".to_string()
        })
    );

    let objects = result.to_map().unwrap();
    assert_eq!(objects.len(), 1);
    assert!(objects.contains_key("001A"));
}

#[test]
fn test_empty_records() {
    let mut result = QueryResult::new(page(vec![], None), account_map(), None).unwrap();

    assert!(result.iter().next().is_none());
    assert!(result.first().unwrap().is_none());
    assert_eq!(result.class_name(), "SObject");
    // parsed and legitimately empty
    assert!(result.is_cached());
}

#[test]
fn test_unknown_type_uses_generic_object() {
    let body = json!({
        "attributes": {"type": "Widget__c"},
        "Id": "a01A",
        "Size__c": 3
    });
    let mut result = QueryResult::new(body, account_map(), None).unwrap();
    assert_eq!(result.class_name(), "SObject");

    let object = result.first().unwrap().unwrap();
    let widget = object.downcast_ref::<GenericObject>().unwrap();
    assert_eq!(widget.value("Size__c"), Some(&json!(3)));
    assert_eq!(object.type_name(), Some("Widget__c"));
}

#[test]
fn test_unregistered_class_is_usage_error() {
    let map = Arc::new(ObjectMap::new().map_type("Account", "AccountModel"));
    let err = QueryResult::new(page(vec![account("001A", "Acme")], None), map, None).unwrap_err();

    assert!(err.is_usage());
    assert_eq!(err.code(), Some(ErrorCode::BadSfoClassname));
    assert_eq!(
        err.to_string(),
        "'AccountModel' is not a registered SObject class"
    );
}

#[test]
fn test_construction_does_not_parse_records() {
    let parsed = Arc::new(AtomicUsize::new(0));
    let body = page(vec![account("1", "A"), account("2", "broken")], None);
    let result = QueryResult::new(body, counting_map(&parsed), None).unwrap();

    assert_eq!(parsed.load(Ordering::SeqCst), 0);
    assert!(!result.is_cached());
}

// ============================================================================
// Iteration & Caching Tests
// ============================================================================

#[test]
fn test_to_map_is_idempotent() {
    let parsed = Arc::new(AtomicUsize::new(0));
    let map = counting_map(&parsed);
    let stub = StubPages::new(&map, vec![("/page2", page(vec![account("3", "C")], None))]);
    let body = page(vec![account("1", "A"), account("2", "B")], Some("/page2"));
    let mut result = QueryResult::new(body, map, Some(Arc::new(stub.clone()))).unwrap();

    let first = result.to_map().unwrap();
    assert_eq!(parsed.load(Ordering::SeqCst), 3);
    assert_eq!(stub.calls(), 1);

    let second = result.to_map().unwrap();
    assert_eq!(parsed.load(Ordering::SeqCst), 3);
    assert_eq!(stub.calls(), 1);

    let mut first_keys: Vec<_> = first.keys().cloned().collect();
    let mut second_keys: Vec<_> = second.keys().cloned().collect();
    first_keys.sort();
    second_keys.sort();
    assert_eq!(first_keys, vec!["1", "2", "3"]);
    assert_eq!(first_keys, second_keys);
    for (id, object) in &first {
        assert_eq!(
            object.downcast_ref::<Account>(),
            second[id].downcast_ref::<Account>()
        );
    }
}

#[test]
fn test_clear_cache_reparses() {
    let version = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&version);
    let map = Arc::new(
        ObjectMap::new()
            .register_factory("Account", move |record: Record| -> Result<Box<dyn SObject>> {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(Account {
                    id: record.require_str("Id")?.to_string(),
                    name: format!("v{n}"),
                }))
            })
            .map_type("Account", "Account"),
    );
    let mut result = QueryResult::new(account("001A", "Acme"), map, None).unwrap();

    let name = |result: &mut QueryResult| {
        let object = result.first().unwrap().unwrap();
        object.downcast_ref::<Account>().unwrap().name.clone()
    };

    result.to_map().unwrap();
    assert_eq!(name(&mut result), "v0");
    assert_eq!(name(&mut result), "v0");

    result.clear_cache();
    assert!(!result.is_cached());
    assert_eq!(name(&mut result), "v1");
}

#[test]
fn test_failure_mid_page_leaves_no_cache() {
    let parsed = Arc::new(AtomicUsize::new(0));
    let body = page(
        vec![
            account("1", "A"),
            account("2", "B"),
            account("3", "broken"),
            account("4", "D"),
            account("5", "E"),
        ],
        None,
    );
    let mut result = QueryResult::new(body, counting_map(&parsed), None).unwrap();

    let mut iter = result.iter();
    assert_eq!(iter.next().unwrap().unwrap().0, "1");
    assert_eq!(iter.next().unwrap().unwrap().0, "2");
    let err = iter.next().unwrap().unwrap_err();
    assert!(iter.next().is_none());

    match err {
        Error::Result(ResultError::UnparsableRecord {
            record,
            class_name,
            object,
            source,
        }) => {
            assert_eq!(record["Id"], "3");
            assert_eq!(class_name, "Account");
            assert!(object.is_none());
            assert!(matches!(*source, Error::InvalidField { .. }));
        }
        other => panic!("Expected UnparsableRecord, got {other:?}"),
    }

    assert!(!result.is_cached());
    assert_eq!(parsed.load(Ordering::SeqCst), 3);

    // starts over from record 1
    assert!(result.to_map().is_err());
    assert_eq!(parsed.load(Ordering::SeqCst), 6);
    assert!(!result.is_cached());
}

#[test]
fn test_aggregate_row_is_keyed_by_empty_identity() {
    let body = json!({"attributes": {"type": "AggregateResult"}, "expr0": 42});
    let mut result = QueryResult::new(body, account_map(), None).unwrap();

    let object = result.first().unwrap().unwrap();
    let generic = object.downcast_ref::<GenericObject>().unwrap();
    assert_eq!(generic.value("expr0"), Some(&json!(42)));
    assert!(object.id().is_none());
}

#[test]
fn test_rows_without_identity_are_all_yielded() {
    let body = page(
        vec![
            json!({"attributes": {"type": "Account"}, "Name": "Acme"}),
            json!({"attributes": {"type": "Account"}, "Name": "Globex"}),
        ],
        None,
    );
    let mut result = QueryResult::new(body, Arc::new(ObjectMap::new()), None).unwrap();

    let names: Vec<_> = result
        .iter()
        .map(|entry| {
            let (id, object) = entry.unwrap();
            assert_eq!(id, "");
            let generic = object.downcast_ref::<GenericObject>().unwrap();
            generic.value("Name").cloned().unwrap()
        })
        .collect();
    assert_eq!(names, vec![json!("Acme"), json!("Globex")]);
    assert!(result.is_cached());
    assert_eq!(ids(&mut result), vec!["", ""]);

    // rows sharing the empty key collapse in the map
    assert_eq!(result.to_map().unwrap().len(), 1);
}

#[test]
fn test_replay_keeps_duplicate_identities() {
    let body = page(vec![account("001A", "Acme"), account("001A", "Acme Again")], None);
    let mut result = QueryResult::new(body, account_map(), None).unwrap();

    assert_eq!(ids(&mut result), vec!["001A", "001A"]);
    assert!(result.is_cached());
    assert_eq!(ids(&mut result), vec!["001A", "001A"]);

    let map = result.to_map().unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(
        map["001A"].downcast_ref::<Account>().unwrap().name,
        "Acme Again"
    );
}

#[test]
fn test_yielded_objects_are_copies() {
    let body = page(vec![account("001A", "Acme")], None);
    let mut result = QueryResult::new(body, Arc::new(ObjectMap::new()), None).unwrap();

    let mut objects = result.to_map().unwrap();
    let generic = objects
        .get_mut("001A")
        .unwrap()
        .downcast_mut::<GenericObject>()
        .unwrap();
    generic.record_mut().insert("Name", json!("Changed"));

    let again = result.to_map().unwrap();
    let cached = again["001A"].downcast_ref::<GenericObject>().unwrap();
    assert_eq!(cached.value("Name"), Some(&json!("Acme")));
}

#[test]
fn test_first_does_not_materialize_everything() {
    let parsed = Arc::new(AtomicUsize::new(0));
    let map = counting_map(&parsed);
    let stub = StubPages::new(&map, vec![("/page2", page(vec![account("3", "C")], None))]);
    let body = page(vec![account("1", "A"), account("2", "B")], Some("/page2"));
    let mut result = QueryResult::new(body, map, Some(Arc::new(stub.clone()))).unwrap();

    let first = result.first().unwrap().unwrap();
    assert_eq!(first.id(), Some("1"));
    assert_eq!(parsed.load(Ordering::SeqCst), 1);
    assert_eq!(stub.calls(), 0);
    assert!(!result.is_cached());
}

// ============================================================================
// Nested Relation Tests
// ============================================================================

fn account_with_relations() -> Value {
    json!({
        "done": true,
        "totalSize": 1,
        "records": [{
            "attributes": {"type": "Account"},
            "Id": "001A",
            "Name": "Acme",
            "Owner": {
                "attributes": {"type": "User"},
                "Id": "005A",
                "Name": "Ada"
            },
            "Parent": null,
            "Contacts": {
                "done": true,
                "totalSize": 2,
                "records": [
                    {"attributes": {"type": "Contact"}, "Id": "003A", "LastName": "Lovelace"},
                    {"attributes": {"type": "Contact"}, "Id": "003B", "LastName": "Byron"}
                ]
            }
        }]
    })
}

#[test]
fn test_nested_single_relation_is_object() {
    let mut result =
        QueryResult::new(account_with_relations(), Arc::new(ObjectMap::new()), None).unwrap();
    let object = result.first().unwrap().unwrap();
    let account = object.downcast_ref::<GenericObject>().unwrap();

    let owner = account.get("Owner").and_then(Field::as_parent).unwrap();
    assert_eq!(owner.id(), Some("005A"));
    assert_eq!(owner.type_name(), Some("User"));
    assert_eq!(
        owner
            .downcast_ref::<GenericObject>()
            .and_then(|o| o.value("Name")),
        Some(&json!("Ada"))
    );

    assert!(account.get("Parent").unwrap().is_null());
}

#[test]
fn test_nested_list_relation_is_lazy_result() {
    let mut result =
        QueryResult::new(account_with_relations(), Arc::new(ObjectMap::new()), None).unwrap();
    let mut object = result.first().unwrap().unwrap();
    let account = object.downcast_mut::<GenericObject>().unwrap();

    let contacts = account
        .record_mut()
        .get_mut("Contacts")
        .and_then(Field::as_children_mut)
        .unwrap();
    assert!(!contacts.is_cached());
    assert_eq!(contacts.total_size(), 2);
    assert_eq!(ids(contacts), vec!["003A", "003B"]);
    assert!(contacts.is_cached());
}

#[test]
fn test_nested_relations_use_object_map() {
    let map = Arc::new(ObjectMap::new().bind::<Account>("Account"));
    let body = json!({
        "attributes": {"type": "Contact"},
        "Id": "003A",
        "Account": account("001A", "Acme")
    });
    let mut result = QueryResult::new(body, map, None).unwrap();
    let object = result.first().unwrap().unwrap();
    let contact = object.downcast_ref::<GenericObject>().unwrap();

    let parent = contact.get("Account").and_then(Field::as_parent).unwrap();
    assert_eq!(
        parent.downcast_ref::<Account>().map(|a| a.name.as_str()),
        Some("Acme")
    );
}

#[test]
fn test_nested_failure_is_wrapped() {
    let body = json!({
        "attributes": {"type": "Contact"},
        "Id": "003A",
        "ParentAccount": account("001A", "broken")
    });
    let parsed = Arc::new(AtomicUsize::new(0));
    let mut result = QueryResult::new(body, counting_map(&parsed), None).unwrap();

    match result.first().unwrap_err() {
        Error::Result(ResultError::UnparsableRecord {
            class_name,
            object,
            source,
            ..
        }) => {
            assert_eq!(class_name, "SObject");
            assert_eq!(source.code(), Some(ErrorCode::UnparsableRecord));

            // fields parsed before the failing relation
            let partial = object.unwrap();
            let generic = partial.downcast_ref::<GenericObject>().unwrap();
            assert!(generic.get("ParentAccount").is_none());
            assert_eq!(generic.value("Id"), Some(&json!("003A")));
        }
        other => panic!("Expected UnparsableRecord, got {other:?}"),
    }
}

// ============================================================================
// Pagination Tests
// ============================================================================

#[test]
fn test_pages_are_chained_in_order() {
    let map = account_map();
    let stub = StubPages::new(
        &map,
        vec![
            ("/page2", page(vec![account("3", "C"), account("4", "D")], Some("/page3"))),
            ("/page3", page(vec![account("5", "E")], None)),
        ],
    );
    let body = page(vec![account("1", "A"), account("2", "B")], Some("/page2"));
    let mut result = QueryResult::new(body, map, Some(Arc::new(stub.clone()))).unwrap();

    assert_eq!(ids(&mut result), vec!["1", "2", "3", "4", "5"]);
    assert_eq!(stub.calls(), 2);

    assert_eq!(ids(&mut result), vec!["1", "2", "3", "4", "5"]);
    assert_eq!(stub.calls(), 2);
}

#[test]
fn test_more_is_memoized() {
    let map = account_map();
    let stub = StubPages::new(&map, vec![("/page2", page(vec![account("2", "B")], None))]);
    let body = page(vec![account("1", "A")], Some("/page2"));
    let mut result = QueryResult::new(body, map, Some(Arc::new(stub.clone()))).unwrap();

    assert!(result.more().unwrap().is_some());
    assert!(result.more().unwrap().is_some());
    assert_eq!(stub.calls(), 1);
}

#[test]
fn test_more_without_cursor_or_callback() {
    let map = account_map();
    let stub = StubPages::new(&map, vec![]);

    let mut no_cursor = QueryResult::new(
        page(vec![account("1", "A")], None),
        Arc::clone(&map),
        Some(Arc::new(stub.clone())),
    )
    .unwrap();
    assert!(no_cursor.more().unwrap().is_none());
    assert_eq!(stub.calls(), 0);

    let mut no_callback =
        QueryResult::new(page(vec![account("1", "A")], Some("/page2")), map, None).unwrap();
    assert!(no_callback.more().unwrap().is_none());
    assert_eq!(ids(&mut no_callback), vec!["1"]);
}

#[test]
fn test_callback_receives_cursor_and_class() {
    let map = account_map();
    let page2 = page(vec![account("2", "B")], None);
    let map2 = Arc::clone(&map);
    let callback = move |cursor: &str, class_name: &str| -> Result<Option<QueryResult>> {
        assert_eq!(cursor, "/services/data/v59.0/query/01g-2000");
        assert_eq!(class_name, "Account");
        QueryResult::new(page2.clone(), Arc::clone(&map2), None).map(Some)
    };
    let body = page(
        vec![account("1", "A")],
        Some("/services/data/v59.0/query/01g-2000"),
    );
    let mut result = QueryResult::new(body, map, Some(Arc::new(callback))).unwrap();

    assert_eq!(ids(&mut result), vec!["1", "2"]);
}

#[test]
fn test_failed_fetch_is_reported_and_can_be_retried() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&attempts);
    let map = account_map();
    let map2 = Arc::clone(&map);
    let page2 = page(vec![account("2", "B")], None);
    let callback = move |_cursor: &str, _class_name: &str| -> Result<Option<QueryResult>> {
        if seen.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(Error::Other("connection reset".to_string()));
        }
        QueryResult::new(page2.clone(), Arc::clone(&map2), None).map(Some)
    };
    let body = page(vec![account("1", "A")], Some("/page2"));
    let mut result = QueryResult::new(body, map, Some(Arc::new(callback))).unwrap();

    let err = result.to_map().unwrap_err();
    assert!(matches!(err, Error::Other(_)));
    // the page itself was fully parsed
    assert!(result.is_cached());

    assert_eq!(result.to_map().unwrap().len(), 2);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_clear_cache_only_affects_own_page() {
    let map = account_map();
    let stub = StubPages::new(&map, vec![("/page2", page(vec![account("2", "B")], None))]);
    let body = page(vec![account("1", "A")], Some("/page2"));
    let mut result = QueryResult::new(body, map, Some(Arc::new(stub.clone()))).unwrap();

    result.to_map().unwrap();
    result.clear_cache();

    assert!(!result.is_cached());
    assert!(result.more().unwrap().unwrap().is_cached());
    assert_eq!(ids(&mut result), vec!["1", "2"]);
    assert_eq!(stub.calls(), 1);
}

#[test]
fn test_into_iterator_for_mut_ref() {
    let mut result = QueryResult::new(
        page(vec![account("1", "A"), account("2", "B")], None),
        account_map(),
        None,
    )
    .unwrap();

    let mut names = Vec::new();
    for entry in &mut result {
        let (_, object) = entry.unwrap();
        names.push(object.downcast_ref::<Account>().unwrap().name.clone());
    }
    assert_eq!(names, vec!["A", "B"]);
}
