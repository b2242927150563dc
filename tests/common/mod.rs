//! Shared fixtures for the integration tests
//!
//! Each test binary pulls in only what it needs, hence the dead code allowance.

#![allow(dead_code)]

use fold_schema::{NodeRef, Schema, Tree, Value};

/// Route library logging to the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn is_adult(root: &NodeRef<'_>) -> bool {
    root.value_of("age").as_i64().map_or(false, |age| age >= 18)
}

/// Person record with a derived discount and a salary only adults may read
pub fn person_schema() -> Schema {
    Schema::object([
        ("name", Schema::string().default("")),
        ("age", Schema::int().min(0).max(150)),
        (
            "discount",
            Schema::int().compute(|root| {
                let young = root.value_of("age").as_i64().map_or(false, |age| age < 18);
                Value::Int(if young { 10 } else { 0 })
            }),
        ),
        ("salary", Schema::int().can_read_if(is_adult)),
    ])
}

pub fn person_tree() -> Tree {
    Tree::new(person_schema()).expect("Failed to build person tree")
}

/// `{b: {l: [{i: string}]}}`
pub fn nested_schema() -> Schema {
    Schema::object([(
        "b",
        Schema::object([("l", Schema::list(Schema::object([("i", Schema::string())])))]),
    )])
}

/// Nested tree holding the items `fir` and `sec`.
pub fn nested_tree() -> Tree {
    let mut tree = Tree::new(nested_schema()).expect("Failed to build nested tree");
    let root = tree.root();
    tree.set(
        root,
        Value::map([(
            "b",
            Value::map([(
                "l",
                Value::list([Value::map([("i", "fir")]), Value::map([("i", "sec")])]),
            )]),
        )]),
    )
    .expect("Failed to set nested tree");
    tree
}
