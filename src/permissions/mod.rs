//! Per-node rights and the global permission switch
//!
//! Every schema node may declare named rights (`read`, `modify` or any custom
//! name) as a literal boolean or a decision function. A lookup walks from the
//! node towards the root and stops at the first conclusive answer; when no
//! node decides, the right is granted. With the switch disabled every lookup
//! is granted.

pub mod table;

pub use table::{PermissionTable, Right, RightFn};

use crate::tree::NodeRef;
use crate::value::Value;
use log::debug;
use std::collections::BTreeMap;

pub const READ: &str = "read";
pub const MODIFY: &str = "modify";

/// Global enable/disable switch owned by a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionSwitch {
    enabled: bool,
}

impl PermissionSwitch {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for PermissionSwitch {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Resolve `right` against a chain of tables ordered from the node up to the
/// root. Each table either answers or defers to the next one.
pub(crate) fn resolve<'a, I>(
    switch: PermissionSwitch,
    chain: I,
    right: &str,
    root: &NodeRef<'_>,
    other: Option<&Value>,
) -> bool
where
    I: IntoIterator<Item = &'a PermissionTable>,
{
    if !switch.is_enabled() {
        return true;
    }
    for table in chain {
        if let Some(decision) = table.get(right).and_then(|r| r.evaluate(right, root, other)) {
            if !decision {
                debug!("Right '{}' denied", right);
            }
            return decision;
        }
    }
    true
}

/// Same walk, considering literal booleans only.
pub(crate) fn resolve_strict<'a, I>(switch: PermissionSwitch, chain: I, right: &str) -> bool
where
    I: IntoIterator<Item = &'a PermissionTable>,
{
    if !switch.is_enabled() {
        return true;
    }
    chain
        .into_iter()
        .find_map(|table| table.get(right).and_then(Right::strict))
        .unwrap_or(true)
}

/// Evaluate every right declared on one table. Undecided functions map to `None`.
pub(crate) fn snapshot(
    table: &PermissionTable,
    root: &NodeRef<'_>,
) -> BTreeMap<String, Option<bool>> {
    table
        .iter()
        .map(|(name, right)| (name.to_string(), right.evaluate(name, root, None)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::tree::Tree;

    fn table(entries: &[(&str, Right)]) -> PermissionTable {
        let mut table = PermissionTable::new();
        for (name, right) in entries {
            table.set(*name, right.clone());
        }
        table
    }

    #[test]
    fn test_nearest_decision_wins() {
        let tree = Tree::new(Schema::int()).unwrap();
        let root = tree.root_ref();
        let node = table(&[(READ, Right::Flag(true))]);
        let parent = table(&[(READ, Right::Flag(false)), (MODIFY, Right::Flag(false))]);
        let on = PermissionSwitch::default();

        assert!(resolve(on, [&node, &parent], READ, &root, None));
        assert!(!resolve(on, [&node, &parent], MODIFY, &root, None));
        assert!(resolve(on, [&node, &parent], "export", &root, None));
        assert!(resolve(PermissionSwitch::new(false), [&parent], MODIFY, &root, None));
    }

    #[test]
    fn test_undecided_function_defers() {
        let tree = Tree::new(Schema::int()).unwrap();
        let root = tree.root_ref();
        let undecided: RightFn = std::sync::Arc::new(|_: &str, _: &NodeRef<'_>, _: Option<&Value>| None);
        let node = table(&[(READ, Right::Func(undecided))]);
        let parent = table(&[(READ, Right::Flag(false))]);
        let on = PermissionSwitch::default();

        assert!(!resolve(on, [&node, &parent], READ, &root, None));
        assert!(!resolve_strict(on, [&node, &parent], READ));
        assert_eq!(snapshot(&node, &root).get(READ), Some(&None));
    }

    #[test]
    fn test_function_sees_other_value() {
        let tree = Tree::new(Schema::int()).unwrap();
        let root = tree.root_ref();
        let small_only: RightFn = std::sync::Arc::new(|_: &str, _: &NodeRef<'_>, other: Option<&Value>| {
            Some(other.and_then(Value::as_i64).map_or(true, |n| n < 10))
        });
        let node = table(&[(MODIFY, Right::Func(small_only))]);
        let on = PermissionSwitch::default();

        assert!(resolve(on, [&node], MODIFY, &root, Some(&Value::Int(3))));
        assert!(!resolve(on, [&node], MODIFY, &root, Some(&Value::Int(30))));
        assert!(resolve_strict(on, [&node], MODIFY));
    }
}
