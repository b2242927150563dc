//! Fixed arity nodes

mod common;

use common::init_logging;
use fold_schema::{ErrorKind, Schema, Tree, Value};

fn flag_and_count() -> Tree {
    Tree::new(Schema::tuple([Schema::boolean(), Schema::int()])).expect("Failed to build tuple tree")
}

#[test]
fn test_arity_and_slot_types() {
    init_logging();
    let mut tree = flag_and_count();
    let root = tree.root();

    assert!(tree.set(root, (true, 5)).expect("Failed to set tuple"));
    assert_eq!(
        tree.value(root),
        Value::Tuple(vec![Value::Bool(true), Value::Int(5)])
    );

    let err = tree.set(root, (true, 5, 9)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structure);
    assert_eq!(err.message(), "Tuple not same size");
    assert_eq!(err.context("expected"), Some(&Value::Int(2)));
    assert_eq!(err.context("found"), Some(&Value::Int(3)));

    let err = tree.set(root, (1, 5)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(err.path(), "$[0]");

    assert_eq!(
        tree.value(root),
        Value::Tuple(vec![Value::Bool(true), Value::Int(5)])
    );
}

#[test]
fn test_slot_access() {
    let mut tree = flag_and_count();
    let root = tree.root();
    assert_eq!(tree.arity(root).expect("Failed to read arity"), 2);
    assert_eq!(tree.item(root, 0), None);

    tree.set(root, (false, 3)).expect("Failed to set tuple");
    let count = tree.item(root, 1).expect("second slot");
    assert_eq!(tree.value(count), Value::Int(3));
    assert_eq!(tree.select_value(root, "$[0]"), Some(Value::Bool(false)));

    tree.set(count, 4).expect("Failed to set slot");
    assert_eq!(tree.value(root), Value::Tuple(vec![Value::Bool(false), Value::Int(4)]));
    assert_eq!(tree.set(count, "four").unwrap_err().kind(), ErrorKind::TypeMismatch);
}

#[test]
fn test_slot_constraints() {
    let mut tree = Tree::new(Schema::object([(
        "range",
        Schema::tuple([Schema::int().min(0), Schema::int().max(100)]),
    )]))
    .expect("Failed to build tree");
    let root = tree.root();

    tree.set_field(root, "range", (0, 100)).expect("Failed to set range");
    let err = tree.set_field(root, "range", (-1, 10)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Constraint);
    assert_eq!(err.path(), "$.range[0]");
    assert_eq!(
        tree.select_value(root, "$.range"),
        Some(Value::Tuple(vec![Value::Int(0), Value::Int(100)]))
    );
}

#[test]
fn test_concat_builds_longer_tuple() {
    let mut left = flag_and_count();
    let mut right = Tree::new(Schema::tuple([Schema::string()])).expect("Failed to build tree");
    let (l, r) = (left.root(), right.root());
    left.set(l, (true, 1)).expect("Failed to set left");
    right.set(r, Value::list(["x"])).expect("Failed to set right");

    let joined = left.concat(l, &right, r).expect("Failed to concat");
    let root = joined.root();
    assert_eq!(joined.arity(root).expect("Failed to read arity"), 3);
    assert_eq!(
        joined.value(root),
        Value::Tuple(vec![Value::Bool(true), Value::Int(1), Value::from("x")])
    );

    let list = Tree::new(Schema::list(Schema::int())).expect("Failed to build list");
    let err = left.concat(l, &list, list.root()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

/// Arithmetic results keep the original arity
#[test]
fn test_add_cannot_grow_a_tuple() {
    let mut tree = flag_and_count();
    let root = tree.root();
    tree.set(root, (true, 1)).expect("Failed to set tuple");

    let err = tree
        .add(root, &Value::Tuple(vec![Value::Int(2)]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structure);
    assert_eq!(tree.value(root), Value::Tuple(vec![Value::Bool(true), Value::Int(1)]));
}
