//! Object nodes: field access, whole-object writes and structural edits

mod common;

use common::{init_logging, person_tree};
use fold_schema::{EngineConfig, ErrorKind, Schema, Tree, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_field_access_and_paths() {
    init_logging();
    let mut tree = person_tree();
    let root = tree.root();

    tree.set_field(root, "age", 30).expect("Failed to set age");
    let age = tree.field(root, "age").expect("Failed to read age");
    assert_eq!(tree.value(age), Value::Int(30));
    assert_eq!(tree.path_name(age), "$.age");
    assert_eq!(tree.name(age), Some("age"));
    assert_eq!(tree.parent(age), Some(root));
    assert!(tree.is_root(root));
    assert!(!tree.is_root(age));

    let err = tree.field(root, "nickname").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.message(), "Unknown content");
    assert_eq!(err.path(), "$.nickname");
    assert_eq!(tree.get(root, "nickname"), None);
}

#[test]
fn test_unknown_field_write_is_rejected() {
    init_logging();
    let mut tree = person_tree();
    let root = tree.root();

    let err = tree.set_field(root, "nickname", "bob").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.message(), "locked");

    let err = tree
        .set(root, Value::map([("nickname", "bob")]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structure);
    assert_eq!(err.path(), "$.nickname");
}

#[test]
fn test_whole_object_write_is_atomic() {
    init_logging();
    let mut tree = person_tree();
    let root = tree.root();
    tree.set(root, Value::map([("name", Value::from("Ada")), ("age", Value::Int(36))]))
        .expect("Failed to set person");

    let err = tree
        .set(root, Value::map([("name", Value::from("Bob")), ("age", Value::Int(-1))]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Constraint);
    assert_eq!(err.path(), "$.age");
    assert_eq!(err.context("min"), Some(&Value::Int(0)));

    assert_eq!(tree.select_value(root, "$.name"), Some(Value::from("Ada")));
    assert_eq!(tree.select_value(root, "$.age"), Some(Value::Int(36)));
}

#[test]
fn test_type_mismatch_names_the_field() {
    let mut tree = person_tree();
    let root = tree.root();
    let err = tree.set_field(root, "age", "old").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(err.path(), "$.age");
    assert_eq!(err.context("expected"), Some(&Value::from("int")));
    assert!(err.to_string().contains("at $.age"));
}

/// Setting the current value again reports no change and fires no callback
#[test]
fn test_unchanged_set_is_idempotent() {
    init_logging();
    let changes = Arc::new(AtomicUsize::new(0));
    let seen = changes.clone();
    let mut tree = Tree::new(Schema::object([
        ("a", Schema::int()),
        ("b", Schema::string()),
    ])
    .on_change(move |_, _, _| {
        seen.fetch_add(1, Ordering::SeqCst);
    }))
    .expect("Failed to build tree");
    let root = tree.root();

    let value = Value::map([("a", Value::Int(1)), ("b", Value::from("x"))]);
    assert!(tree.set(root, value).expect("Failed to set"));
    let current = tree.value(root);
    assert!(!tree.set(root, current.clone()).expect("Failed to set again"));
    assert!(!tree.set(root, current).expect("Failed to set a third time"));
    assert_eq!(changes.load(Ordering::SeqCst), 1);
    assert!(tree.pending_events().is_empty());
}

#[test]
fn test_partial_map_keeps_other_fields() {
    let mut tree = Tree::new(Schema::object([
        ("a", Schema::int().default(1)),
        ("b", Schema::int().default(2)),
    ]))
    .expect("Failed to build tree");
    let root = tree.root();
    tree.set(root, Value::map([("b", 5)])).expect("Failed to set b");
    assert_eq!(
        tree.value(root),
        Value::map([("a", Value::Int(1)), ("b", Value::Int(5))])
    );

    tree.set(root, Value::Null).expect("Failed to reset");
    assert_eq!(
        tree.value(root),
        Value::map([("a", Value::Int(1)), ("b", Value::Int(2))])
    );
}

#[test]
fn test_required_field() {
    let mut tree = Tree::new(Schema::object([
        ("id", Schema::string().required().default("none")),
    ]))
    .expect("Failed to build tree");
    let root = tree.root();
    let id = tree.field(root, "id").expect("Failed to read id");

    let err = tree.check(id, Value::Null).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Required);
    assert_eq!(err.message(), "Cannot be empty");
    assert!(Tree::new(Schema::object([("id", Schema::string().required())])).is_ok());
}

#[test]
fn test_copy_is_independent() {
    let mut tree = person_tree();
    let root = tree.root();
    tree.set_field(root, "age", 40).expect("Failed to set age");

    let mut copy = tree.copy(root).expect("Failed to copy");
    let copy_root = copy.root();
    copy.set_field(copy_root, "age", 41).expect("Failed to set copied age");

    assert_eq!(tree.select_value(root, "$.age"), Some(Value::Int(40)));
    assert_eq!(copy.select_value(copy_root, "$.age"), Some(Value::Int(41)));
    assert!(copy.is_root(copy_root));
}

#[test]
fn test_bind_field_shares_one_node() {
    init_logging();
    let address = Arc::new(Schema::object([("city", Schema::string())]));
    let mut tree = Tree::new(Schema::object([
        ("home", address.clone()),
        ("work", address),
        ("count", Arc::new(Schema::int())),
    ]))
    .expect("Failed to build tree");
    let root = tree.root();
    let home = tree.field(root, "home").expect("Failed to read home");
    tree.set_field(home, "city", "Lyon").expect("Failed to set city");

    tree.bind_field(root, "work", home).expect("Failed to bind");
    assert_eq!(tree.field(root, "work").expect("Failed to read work"), home);
    assert_eq!(tree.select_value(root, "$.work.city"), Some(Value::from("Lyon")));

    tree.set_field(home, "city", "Nice").expect("Failed to set city again");
    assert_eq!(tree.select_value(root, "$.work.city"), Some(Value::from("Nice")));

    let count = tree.field(root, "count").expect("Failed to read count");
    let err = tree.bind_field(root, "work", count).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

/// A copy keeps bound fields pointing at one node, apart from the source
#[test]
fn test_copy_keeps_bound_fields_shared() {
    let address = Arc::new(Schema::object([("city", Schema::string())]));
    let mut tree = Tree::new(Schema::object([
        ("home", address.clone()),
        ("work", address),
    ]))
    .expect("Failed to build tree");
    let root = tree.root();
    let home = tree.field(root, "home").expect("Failed to read home");
    tree.set_field(home, "city", "Lyon").expect("Failed to set city");
    tree.bind_field(root, "work", home).expect("Failed to bind");

    let mut copy = tree.copy(root).expect("Failed to copy");
    let copy_root = copy.root();
    let copy_home = copy.field(copy_root, "home").expect("Failed to read copied home");
    assert_eq!(copy.field(copy_root, "work").expect("Failed to read copied work"), copy_home);
    assert_eq!(copy.path_name(copy_home), "$.home");

    copy.set_field(copy_home, "city", "Nice").expect("Failed to set copied city");
    assert_eq!(copy.select_value(copy_root, "$.work.city"), Some(Value::from("Nice")));
    assert_eq!(tree.select_value(root, "$.work.city"), Some(Value::from("Lyon")));
}

#[test]
fn test_add_and_remove_fields() {
    let mut tree = Tree::new(Schema::object([("a", Schema::int())])).expect("Failed to build tree");
    let root = tree.root();

    let b = tree
        .add_field(root, "b", Schema::int().default(7))
        .expect("Failed to add field");
    assert_eq!(tree.value(b), Value::Int(7));
    assert_eq!(tree.keys(root), vec!["a".to_string(), "b".to_string()]);

    let err = tree.add_field(root, "a", Schema::int()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structure);
    let err = tree
        .add_field(root, "c", Schema::int().max(3).default(9))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Constraint);

    tree.remove_field(root, "a").expect("Failed to remove field");
    assert_eq!(tree.keys(root), vec!["b".to_string()]);
    assert_eq!(
        tree.remove_field(root, "a").unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn test_custom_path_separator() {
    let config = EngineConfig {
        path_separator: "/".to_string(),
        ..Default::default()
    };
    let mut tree = Tree::with_config(
        Schema::object([("inner", Schema::object([("n", Schema::int().max(1))]))]),
        config,
    )
    .expect("Failed to build tree");
    let root = tree.root();
    let inner = tree.field(root, "inner").expect("Failed to read inner");
    let err = tree.set_field(inner, "n", 5).unwrap_err();
    assert_eq!(err.path(), "$/inner/n");
}

#[test]
fn test_invalid_schema_is_refused() {
    let err = Tree::new(Schema::string().min(3)).err().expect("schema should be refused");
    assert_eq!(err.kind(), ErrorKind::Structure);
    assert!(err.context("problems").is_some());
}
