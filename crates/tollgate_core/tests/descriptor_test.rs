use serde_json::json;
use std::str::FromStr;
use std::time::Duration;
use tollgate_core::{CacheKind, Operation, OperationKind, RequestDescriptor};

#[test]
fn test_read_operations_use_the_cache() {
    let request = RequestDescriptor::new(Operation::read("company.lookup"));
    assert!(!request.bypasses_cache());
    assert_eq!(request.endpoint(), "company.lookup");
    assert_eq!(*request.cache_kind(), CacheKind::Standard);
}

#[test]
fn test_write_operations_bypass_the_cache() {
    let request: RequestDescriptor = Operation::write("filing.submit")
        .with_param("form", json!("CS01"))
        .into();
    assert!(request.bypasses_cache());
}

#[test]
fn test_setters_produce_modified_copies() {
    let base = RequestDescriptor::new(Operation::read("vat.verify"));
    let overridden = base
        .clone()
        .with_cache_key("vat:GB1")
        .with_ttl(Duration::from_secs(5))
        .with_cache_kind(CacheKind::Static);

    assert_eq!(*base.ttl(), None);
    assert_eq!(overridden.cache_key().as_deref(), Some("vat:GB1"));
    assert_eq!(*overridden.ttl(), Some(Duration::from_secs(5)));
    assert_eq!(*overridden.cache_kind(), CacheKind::Static);
}

#[test]
fn test_with_param_replaces_existing_value() {
    let op = Operation::read("lookup")
        .with_param("id", json!(1))
        .with_param("id", json!(2));
    assert_eq!(op.params().len(), 1);
    assert_eq!(op.params()["id"], json!(2));
}

#[test]
fn test_kinds_parse_from_lowercase_names() {
    assert_eq!(OperationKind::from_str("write").unwrap(), OperationKind::Write);
    assert_eq!(CacheKind::from_str("perishable").unwrap(), CacheKind::Perishable);
    assert!(CacheKind::from_str("forever").is_err());
}

#[test]
fn test_operation_deserializes_with_defaults() {
    let op: Operation = serde_json::from_value(json!({ "name": "status.get" })).unwrap();
    assert_eq!(*op.kind(), OperationKind::Read);
    assert!(op.params().is_empty());
}
