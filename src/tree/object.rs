use super::events::CHANGE;
use super::{Body, NodeId, Tree};
use crate::error::{SchemaError, SchemaResult};
use crate::schema::Schema;
use crate::value::Value;
use log::debug;
use std::sync::Arc;

impl Tree {
    fn fields(&self, id: NodeId) -> SchemaResult<&[(String, NodeId)]> {
        match &self.data(id)?.body {
            Body::Fields(fields) => Ok(fields.as_slice()),
            _ => Err(SchemaError::type_mismatch("Must be a dict", self.path_name(id))),
        }
    }

    fn field_path(&self, id: NodeId, name: &str) -> String {
        format!("{}{}{}", self.path_name(id), self.config.path_separator, name)
    }

    /// Visible field of an object node.
    pub fn field(&self, id: NodeId, name: &str) -> SchemaResult<NodeId> {
        let child = self
            .fields(id)?
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, child)| *child)
            .ok_or_else(|| SchemaError::not_found("Unknown content", self.field_path(id, name)))?;
        if !self.exists_or_can_read(child) {
            return Err(SchemaError::not_found("locked", self.field_path(id, name)));
        }
        Ok(child)
    }

    /// Like [`Tree::field`], `None` for anything missing or hidden.
    pub fn get(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.field(id, name).ok()
    }

    /// Names of the visible fields, in declaration order.
    pub fn keys(&self, id: NodeId) -> Vec<String> {
        match self.slot(id).map(|n| &n.body) {
            Some(Body::Fields(fields)) => fields
                .iter()
                .filter(|(_, child)| self.exists_or_can_read(*child))
                .map(|(key, _)| key.clone())
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn set_field<V: Into<Value>>(&mut self, id: NodeId, name: &str, value: V) -> SchemaResult<bool> {
        self.data(id)?;
        let child = self
            .get(id, name)
            .ok_or_else(|| SchemaError::not_found("locked", self.field_path(id, name)))?;
        self.set(child, value)
    }

    /// Make field `name` refer to `node`, another node of the same kind in
    /// this tree. Both places then share one node.
    pub fn bind_field(&mut self, id: NodeId, name: &str, node: NodeId) -> SchemaResult<()> {
        let current = self.field(id, name)?;
        let path = self.field_path(id, name);
        let target = self.schema(node)?;
        if !self.schema(current)?.same_kind(&target) {
            return Err(SchemaError::type_mismatch("cannot bind a node of another kind", path)
                .with("expected", self.schema(current)?.kind().name())
                .with("found", target.kind().name()));
        }
        if self.is_ancestor_or_self(node, id) {
            return Err(SchemaError::structure("cannot bind a node inside itself", path));
        }
        if current == node {
            return Ok(());
        }
        self.check(current, self.value(node))?;

        if let Body::Fields(fields) = &mut self.data_mut(id)?.body {
            for (key, child) in fields.iter_mut() {
                if key == name {
                    *child = node;
                }
            }
        }
        debug!("Bound {} to {}", path, self.path_name(node));
        if self.parent(current) == Some(id) {
            self.rehome_or_free(current);
        }
        self.events.enqueue(CHANGE, node);
        self.drain()
    }

    /// Add a field to an object node after creation.
    pub fn add_field<S: Into<Arc<Schema>>>(&mut self, id: NodeId, name: &str, schema: S) -> SchemaResult<NodeId> {
        if self.fields(id)?.iter().any(|(key, _)| key == name) {
            return Err(SchemaError::structure(
                "field already exists",
                self.field_path(id, name),
            ));
        }
        let child = self.instantiate(schema.into(), Some(id), name.to_string());
        if let Body::Fields(fields) = &mut self.data_mut(id)?.body {
            fields.push((name.to_string(), child));
        }
        if let Err(e) = self.validate_defaults(child) {
            if let Body::Fields(fields) = &mut self.data_mut(id)?.body {
                fields.retain(|(_, c)| *c != child);
            }
            self.free(child);
            return Err(e);
        }
        Ok(child)
    }

    pub fn remove_field(&mut self, id: NodeId, name: &str) -> SchemaResult<()> {
        let path = self.field_path(id, name);
        let position = self
            .fields(id)?
            .iter()
            .position(|(key, _)| key == name)
            .ok_or_else(|| SchemaError::not_found("Unknown content", path))?;
        let mut removed = None;
        if let Body::Fields(fields) = &mut self.data_mut(id)?.body {
            removed = Some(fields.remove(position).1);
        }
        if let Some(child) = removed.filter(|c| self.parent(*c) == Some(id)) {
            self.rehome_or_free(child);
        }
        self.events.enqueue(CHANGE, id);
        self.drain()
    }

    /// A node that lost its owning slot moves to another field still
    /// referring to it, or is released.
    fn rehome_or_free(&mut self, id: NodeId) {
        let holder = self.nodes.iter().enumerate().find_map(|(index, slot)| match slot {
            Some(node) => match &node.body {
                Body::Fields(fields) => fields
                    .iter()
                    .find(|(_, child)| *child == id)
                    .map(|(key, _)| (NodeId(index), key.clone())),
                _ => None,
            },
            None => None,
        });
        match holder {
            Some((parent, key)) => {
                if let Ok(node) = self.data_mut(id) {
                    node.parent = Some(parent);
                    node.name = key;
                }
            }
            None => self.free(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn person() -> Tree {
        Tree::new(Schema::object([
            ("name", Schema::string()),
            ("age", Schema::int()),
            ("secret", Schema::string().can_read(false)),
        ]))
        .unwrap()
    }

    #[test]
    fn test_field_access() {
        let tree = person();
        let root = tree.root();
        assert!(tree.field(root, "name").is_ok());
        assert_eq!(tree.keys(root), vec!["name".to_string(), "age".to_string()]);

        let err = tree.field(root, "nope").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.path(), "$.nope");

        let err = tree.field(root, "secret").unwrap_err();
        assert_eq!(err.message(), "locked");
        assert!(tree.get(root, "secret").is_none());
    }

    #[test]
    fn test_field_on_scalar() {
        let tree = person();
        let name = tree.field(tree.root(), "name").unwrap();
        let err = tree.field(name, "x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_set_field() {
        let mut tree = person();
        let root = tree.root();
        tree.set_field(root, "age", 33).unwrap();
        assert_eq!(tree.node(root).value_of("age"), Value::Int(33));
        assert_eq!(
            tree.set_field(root, "unknown", 1).unwrap_err().message(),
            "locked"
        );
    }

    #[test]
    fn test_bind_shares_node() {
        let mut tree = Tree::new(Schema::object([
            ("a", Schema::object([("x", Schema::int())])),
            ("b", Schema::object([("x", Schema::int())])),
        ]))
        .unwrap();
        let root = tree.root();
        let a = tree.field(root, "a").unwrap();
        let b = tree.field(root, "b").unwrap();
        tree.bind_field(root, "b", a).unwrap();

        let ax = tree.field(a, "x").unwrap();
        tree.set(ax, 5).unwrap();
        let b_now = tree.field(root, "b").unwrap();
        assert_eq!(b_now, a);
        assert_eq!(tree.node(b_now).value_of("x"), Value::Int(5));
        assert!(!tree.contains(b));
    }

    #[test]
    fn test_bind_rejects_other_kind_and_self() {
        let mut tree = Tree::new(Schema::object([
            ("a", Schema::object([("x", Schema::int())])),
            ("n", Schema::int()),
        ]))
        .unwrap();
        let root = tree.root();
        let a = tree.field(root, "a").unwrap();
        let n = tree.field(root, "n").unwrap();
        assert_eq!(
            tree.bind_field(root, "n", a).unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
        let x = tree.field(a, "x").unwrap();
        assert!(tree.bind_field(a, "x", n).is_ok());
        assert_eq!(tree.field(a, "x").unwrap(), n);
        assert!(!tree.contains(x));
        assert_eq!(
            tree.bind_field(root, "a", root).unwrap_err().kind(),
            ErrorKind::Structure
        );
    }

    #[test]
    fn test_add_and_remove_field() {
        let mut tree = person();
        let root = tree.root();
        let email = tree
            .add_field(root, "email", Schema::string().default("a@b.c"))
            .unwrap();
        assert_eq!(tree.value(email), Value::from("a@b.c"));
        assert_eq!(tree.path_name(email), "$.email");
        assert_eq!(
            tree.add_field(root, "email", Schema::string()).unwrap_err().kind(),
            ErrorKind::Structure
        );

        tree.remove_field(root, "email").unwrap();
        assert!(!tree.contains(email));
        assert!(tree.get(root, "email").is_none());
        assert_eq!(
            tree.remove_field(root, "email").unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
