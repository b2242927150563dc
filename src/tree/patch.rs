use super::select::Selection;
use super::{Body, NodeId, Tree};
use crate::error::{SchemaError, SchemaResult};
use crate::selector::split_trailing_bracket;
use crate::value::Value;
use log::warn;
use std::str::FromStr;

/// Patch operations, after RFC 6902
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOp {
    Replace,
    Test,
    Add,
    Remove,
}

impl FromStr for PatchOp {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(PatchOp::Replace),
            "test" => Ok(PatchOp::Test),
            "add" => Ok(PatchOp::Add),
            "remove" => Ok(PatchOp::Remove),
            other => Err(SchemaError::syntax("invalid operator", "").with("op", other)),
        }
    }
}

impl Tree {
    /// Apply one patch operation to the node `path` selects from `id`.
    pub fn patch<V: Into<Value>>(&mut self, id: NodeId, op: &str, path: &str, value: V) -> SchemaResult<()> {
        let op: PatchOp = op.parse()?;
        self.apply_patch(id, op, path, value.into())
    }

    pub fn apply_patch(&mut self, id: NodeId, op: PatchOp, path: &str, value: Value) -> SchemaResult<()> {
        let result = self.patch_inner(id, op, path, value);
        if let Err(e) = &result {
            warn!("Patch {:?} on '{}' rejected: {}", op, path, e);
        }
        result
    }

    fn patch_inner(&mut self, id: NodeId, op: PatchOp, path: &str, value: Value) -> SchemaResult<()> {
        if op == PatchOp::Remove {
            if let Some((prefix, index)) = split_trailing_bracket(path) {
                let target = self.patch_target(id, prefix)?;
                let index: isize = index.trim().parse().map_err(|_| {
                    SchemaError::syntax("invalid index", path).with("index", index)
                })?;
                return self.remove_at(target, index);
            }
        }

        let target = self.patch_target(id, path)?;
        match op {
            PatchOp::Replace => self.set(target, value).map(|_| ()),
            PatchOp::Test => self.check(target, value),
            PatchOp::Add => {
                self.require_list(target)?;
                self.append(target, value)
            }
            PatchOp::Remove => {
                let index = value.as_i64().ok_or_else(|| {
                    SchemaError::syntax("remove needs an index", self.path_name(target))
                        .with("value", value.clone())
                })?;
                self.remove_at(target, index as isize)
            }
        }
    }

    fn patch_target(&self, id: NodeId, path: &str) -> SchemaResult<NodeId> {
        match self.select(id, path) {
            Some(Selection::Node(target)) => Ok(target),
            Some(Selection::List(_)) => Err(SchemaError::syntax(
                "patch target must be a single node",
                path,
            )),
            None => Err(SchemaError::not_found("target does not exist", path)),
        }
    }

    fn require_list(&self, id: NodeId) -> SchemaResult<()> {
        match self.data(id)?.body {
            Body::Items(_) => Ok(()),
            _ => Err(SchemaError::syntax("invalid operator", self.path_name(id))),
        }
    }

    fn remove_at(&mut self, id: NodeId, index: isize) -> SchemaResult<()> {
        self.require_list(id)?;
        self.delete(id, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::schema::Schema;

    fn sample() -> Tree {
        let mut tree = Tree::new(Schema::object([
            ("a", Schema::int().max(10)),
            ("l", Schema::list(Schema::int())),
        ]))
        .unwrap();
        let root = tree.root();
        tree.set(root, Value::map([("a", Value::Int(1)), ("l", Value::list([1, 2, 3]))]))
            .unwrap();
        tree
    }

    #[test]
    fn test_replace_and_test() {
        let mut tree = sample();
        let root = tree.root();
        tree.patch(root, "replace", "$.a", 5).unwrap();
        assert_eq!(tree.select_value(root, "$.a"), Some(Value::Int(5)));
        assert!(tree.patch(root, "test", "$.a", 9).is_ok());
        assert_eq!(
            tree.patch(root, "test", "$.a", 11).unwrap_err().kind(),
            ErrorKind::Constraint
        );
        assert_eq!(tree.select_value(root, "$.a"), Some(Value::Int(5)));
    }

    #[test]
    fn test_list_add_remove() {
        let mut tree = sample();
        let root = tree.root();
        tree.patch(root, "add", "$.l", 4).unwrap();
        tree.patch(root, "remove", "$.l[0]", Value::Null).unwrap();
        tree.patch(root, "remove", "$.l", -1).unwrap();
        assert_eq!(tree.select_value(root, "$.l"), Some(Value::list([2, 3])));
    }

    #[test]
    fn test_rejections() {
        let mut tree = sample();
        let root = tree.root();
        assert_eq!(
            tree.patch(root, "move", "$.a", 1).unwrap_err().message(),
            "invalid operator"
        );
        assert_eq!(
            tree.patch(root, "replace", "$.zz", 1).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            tree.patch(root, "add", "$.a", 1).unwrap_err().kind(),
            ErrorKind::Syntax
        );
    }
}
