use super::{Criteria, NodeId, Selection, Tree};
use crate::value::Value;
use std::fmt;

/// Read-only view of one node, handed to constraint, transform, derived
/// value and event callbacks.
#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t Tree,
    id: NodeId,
}

impl<'t> NodeRef<'t> {
    pub(crate) fn new(tree: &'t Tree, id: NodeId) -> Self {
        Self { tree, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t Tree {
        self.tree
    }

    pub fn value(&self) -> Value {
        self.tree.value(self.id)
    }

    /// Visible field of an object node.
    pub fn get(&self, name: &str) -> Option<NodeRef<'t>> {
        self.tree.get(self.id, name).map(|id| NodeRef::new(self.tree, id))
    }

    /// Value of a visible field, `Null` when there is none.
    pub fn value_of(&self, name: &str) -> Value {
        self.get(name).map(|n| n.value()).unwrap_or_default()
    }

    /// Item of a sequence node; negative positions count from the end.
    pub fn item(&self, index: isize) -> Option<NodeRef<'t>> {
        self.tree.item(self.id, index).map(|id| NodeRef::new(self.tree, id))
    }

    /// Resolve a path to a single node.
    pub fn lookup(&self, path: &str) -> Option<NodeRef<'t>> {
        self.tree.lookup(self.id, path).map(|id| NodeRef::new(self.tree, id))
    }

    pub fn select(&self, path: &str) -> Option<Selection> {
        self.tree.select(self.id, path)
    }

    pub fn parent(&self) -> Option<NodeRef<'t>> {
        self.tree.parent(self.id).map(|id| NodeRef::new(self.tree, id))
    }

    pub fn root(&self) -> NodeRef<'t> {
        self.tree.root_ref()
    }

    pub fn path_name(&self) -> String {
        self.tree.path_name(self.id)
    }

    pub fn is_root(&self) -> bool {
        self.tree.is_root(self.id)
    }

    pub fn len(&self) -> usize {
        self.tree.len(self.id)
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty(self.id)
    }

    pub fn keys(&self) -> Vec<String> {
        self.tree.keys(self.id)
    }

    pub fn matches(&self, criteria: &Criteria) -> bool {
        self.tree.matches(self.id, criteria)
    }
}

impl PartialEq<Value> for NodeRef<'_> {
    fn eq(&self, other: &Value) -> bool {
        self.value() == *other
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.path_name(), self.value())
    }
}

impl From<NodeRef<'_>> for Value {
    fn from(node: NodeRef<'_>) -> Self {
        node.value()
    }
}
