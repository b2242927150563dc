//! Live node trees
//!
//! A [`Tree`] instantiates a [`Schema`] into an arena of nodes. Each node
//! keeps its committed value, the value before the last commit, a back-link
//! to its parent and the name it occupies there. Containers hold their
//! children by [`NodeId`]; scalar nodes hold a plain [`Value`].
//!
//! Every mutation goes through the same pipeline: the input is corrected
//! (transform, decode), checked against the node and its sub-nodes, and only
//! then committed. Committed changes queue a `change` event that the tree
//! drains to a fixed point, recomputing derived values on the way.

mod check;
mod commit;
mod events;
mod matching;
mod node_ref;
mod object;
mod ops;
mod patch;
mod select;
mod sequence;
mod tuple;
mod view;

pub use events::EventContext;
pub use matching::Criteria;
pub use node_ref::NodeRef;
pub use patch::PatchOp;
pub use select::Selection;
pub use view::{belongs_to_view, ViewMembership};

use crate::config::EngineConfig;
use crate::error::{SchemaError, SchemaResult};
use crate::permissions::{self, PermissionSwitch, READ};
use crate::schema::{Exists, Schema, SchemaKind};
use crate::value::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Handle of a node inside its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Body {
    Leaf,
    Fields(Vec<(String, NodeId)>),
    /// `None` is a sequence that was never set, distinct from an empty one
    Items(Option<Vec<NodeId>>),
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) schema: Arc<Schema>,
    pub(crate) value: Value,
    pub(crate) old_value: Value,
    pub(crate) parent: Option<NodeId>,
    pub(crate) name: String,
    pub(crate) body: Body,
}

/// Who asked for a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    External,
    /// Derived value recomputation
    Internal,
}

/// An instantiated schema
pub struct Tree {
    nodes: Vec<Option<NodeData>>,
    root: NodeId,
    config: EngineConfig,
    permissions: PermissionSwitch,
    events: events::EventQueue,
}

impl Tree {
    pub fn new<S: Into<Arc<Schema>>>(schema: S) -> SchemaResult<Self> {
        Self::with_config(schema, EngineConfig::default())
    }

    pub fn with_config<S: Into<Arc<Schema>>>(schema: S, config: EngineConfig) -> SchemaResult<Self> {
        config.validate()?;
        let schema = schema.into();
        let problems = schema.problems();
        if !problems.is_empty() {
            return Err(SchemaError::structure("Not a schema", "$")
                .with("problems", Value::list(problems)));
        }

        let mut tree = Self::empty(config);
        tree.root = tree.instantiate(schema, None, "$".to_string());
        let root = tree.root;
        tree.validate_defaults(root)?;
        Ok(tree)
    }

    fn empty(config: EngineConfig) -> Self {
        let permissions = PermissionSwitch::new(config.permissions_enabled);
        Self {
            nodes: Vec::new(),
            root: NodeId(0),
            config,
            permissions,
            events: events::EventQueue::default(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_ref(&self) -> NodeRef<'_> {
        NodeRef::new(self, self.root)
    }

    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef::new(self, id)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn permissions(&self) -> PermissionSwitch {
        self.permissions
    }

    pub fn permissions_mut(&mut self) -> &mut PermissionSwitch {
        &mut self.permissions
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    pub(crate) fn slot(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn data(&self, id: NodeId) -> SchemaResult<&NodeData> {
        self.slot(id)
            .ok_or_else(|| SchemaError::not_found(format!("node {id} does not exist"), ""))
    }

    pub(crate) fn data_mut(&mut self, id: NodeId) -> SchemaResult<&mut NodeData> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| SchemaError::not_found(format!("node {id} does not exist"), ""))
    }

    pub fn schema(&self, id: NodeId) -> SchemaResult<Arc<Schema>> {
        Ok(self.data(id)?.schema.clone())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|n| n.parent)
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.slot(id).map_or(false, |n| n.parent.is_none())
    }

    /// Name of the node under its parent: a field name or `[i]`.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.slot(id).map(|n| n.name.as_str())
    }

    /// Path from the root, e.g. `$.b.l[0].i`
    pub fn path_name(&self, id: NodeId) -> String {
        let mut parts: Vec<&str> = Vec::new();
        let mut current = self.slot(id);
        let Some(node) = current else {
            return String::new();
        };
        parts.push(&node.name);
        while let Some(parent) = current.and_then(|n| n.parent).and_then(|p| self.slot(p)) {
            if matches!(parent.body, Body::Fields(_)) {
                parts.push(&self.config.path_separator);
            }
            parts.push(&parent.name);
            current = Some(parent);
        }
        parts.reverse();
        parts.concat()
    }

    /// Committed value. Objects list their visible fields only; a sequence
    /// never set is `Null`.
    pub fn value(&self, id: NodeId) -> Value {
        let Some(node) = self.slot(id) else {
            return Value::Null;
        };
        match &node.body {
            Body::Leaf => node.value.clone(),
            Body::Fields(fields) => Value::Map(
                fields
                    .iter()
                    .filter(|(_, child)| self.exists_or_can_read(*child))
                    .map(|(name, child)| (name.clone(), self.value(*child)))
                    .collect::<BTreeMap<_, _>>(),
            ),
            Body::Items(None) => Value::Null,
            Body::Items(Some(ids)) => {
                let items = ids.iter().map(|c| self.value(*c)).collect();
                match node.schema.kind() {
                    SchemaKind::Tuple(_) => Value::Tuple(items),
                    _ => Value::List(items),
                }
            }
        }
    }

    /// Value before the last commit
    pub fn old_value(&self, id: NodeId) -> Value {
        self.slot(id).map(|n| n.old_value.clone()).unwrap_or_default()
    }

    /// Direct children: fields in order, or sequence items.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.slot(id).map(|n| &n.body) {
            Some(Body::Fields(fields)) => fields.iter().map(|(_, c)| *c).collect(),
            Some(Body::Items(Some(ids))) => ids.clone(),
            _ => Vec::new(),
        }
    }

    /// Number of fields of an object or items of a sequence.
    pub fn len(&self, id: NodeId) -> usize {
        match self.slot(id).map(|n| &n.body) {
            Some(Body::Fields(fields)) => fields.len(),
            Some(Body::Items(Some(ids))) => ids.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self, id: NodeId) -> bool {
        self.len(id) == 0
    }

    /// Whether the node exists and may be read.
    pub fn exists_or_can_read(&self, id: NodeId) -> bool {
        self.exists(id) && self.is_allowed_to(id, READ)
    }

    /// Existence of the node and of every ancestor.
    pub fn exists(&self, id: NodeId) -> bool {
        let root = self.root_ref();
        self.lineage(Some(id))
            .all(|node| existence(&node.schema, &node.value, &root))
    }

    /// Resolve a right from the node up to the root.
    pub fn is_allowed_to(&self, id: NodeId, right: &str) -> bool {
        let root = self.root_ref();
        permissions::resolve(
            self.permissions,
            self.lineage(Some(id)).map(|n| &n.schema.options().rights),
            right,
            &root,
            None,
        )
    }

    /// Like [`Tree::is_allowed_to`] but decision functions are ignored.
    pub fn is_strictly_allowed_to(&self, id: NodeId, right: &str) -> bool {
        permissions::resolve_strict(
            self.permissions,
            self.lineage(Some(id)).map(|n| &n.schema.options().rights),
            right,
        )
    }

    /// Every right declared on the node itself, evaluated now.
    pub fn rights_snapshot(&self, id: NodeId) -> SchemaResult<BTreeMap<String, Option<bool>>> {
        let node = self.data(id)?;
        Ok(permissions::snapshot(&node.schema.options().rights, &self.root_ref()))
    }

    /// The node followed by its ancestors.
    pub(crate) fn lineage(&self, start: Option<NodeId>) -> impl Iterator<Item = &NodeData> + '_ {
        std::iter::successors(start.and_then(|id| self.slot(id)), move |node| {
            node.parent.and_then(|p| self.slot(p))
        })
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    pub(crate) fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.parent(c);
        }
        false
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(Some(data));
        NodeId(self.nodes.len() - 1)
    }

    /// Build a node and its sub-nodes from a template, holding defaults.
    pub(crate) fn instantiate(
        &mut self,
        schema: Arc<Schema>,
        parent: Option<NodeId>,
        name: String,
    ) -> NodeId {
        let id = self.alloc(NodeData {
            schema: schema.clone(),
            value: Value::Null,
            old_value: Value::Null,
            parent,
            name,
            body: Body::Leaf,
        });
        match schema.kind() {
            SchemaKind::Object(fields) => {
                let children = fields
                    .iter()
                    .map(|(key, template)| {
                        (key.clone(), self.instantiate(template.clone(), Some(id), key.clone()))
                    })
                    .collect();
                self.set_body(id, Body::Fields(children));
            }
            SchemaKind::List { .. } | SchemaKind::Tuple(_) => {
                self.set_body(id, Body::Items(None));
            }
            _ => {}
        }
        let default = schema.options().default_value();
        if !default.is_null() {
            self.load(id, default);
        }
        id
    }

    fn set_body(&mut self, id: NodeId, body: Body) {
        if let Some(Some(node)) = self.nodes.get_mut(id.0) {
            node.body = body;
        }
    }

    /// Store a value without checks or events. Used for defaults.
    fn load(&mut self, id: NodeId, value: Value) {
        let Some(node) = self.slot(id) else {
            return;
        };
        let schema = node.schema.clone();
        let value = check::normalize(&schema, value.clone(), "").unwrap_or(value);
        match node.body.clone() {
            Body::Leaf => {
                if let Ok(node) = self.data_mut(id) {
                    node.old_value = value.clone();
                    node.value = value;
                }
            }
            Body::Fields(fields) => {
                if let Value::Map(map) = value {
                    for (key, child) in fields {
                        if let Some(sub) = map.get(&key) {
                            self.load(child, sub.clone());
                        }
                    }
                }
            }
            Body::Items(old) => {
                for child in old.unwrap_or_default() {
                    self.free(child);
                }
                let items = value.as_items().map(<[Value]>::to_vec);
                let ids: Option<Vec<NodeId>> = items.map(|items| {
                    items
                        .into_iter()
                        .enumerate()
                        .filter_map(|(i, item)| {
                            let template = item_template(&schema, i)?;
                            let child = self.instantiate(template, Some(id), format!("[{i}]"));
                            self.load(child, item);
                            Some(child)
                        })
                        .collect()
                });
                self.set_body(id, Body::Items(ids));
                let current = self.value(id);
                if let Ok(node) = self.data_mut(id) {
                    node.old_value = current;
                }
            }
        }
    }

    /// Check every default of a sub-tree against its node, ignoring permissions.
    pub(crate) fn validate_defaults(&mut self, id: NodeId) -> SchemaResult<()> {
        let saved = self.permissions;
        self.permissions.disable();
        let mut pending = vec![id];
        let mut result = Ok(());
        while let Some(current) = pending.pop() {
            pending.extend(self.children(current));
            let default = match self.data(current) {
                Ok(node) => node.schema.options().default_value(),
                Err(e) => {
                    result = Err(e);
                    break;
                }
            };
            if default.is_null() {
                continue;
            }
            if let Err(e) = self.check(current, default) {
                result = Err(e);
                break;
            }
        }
        self.permissions = saved;
        result
    }

    /// Release a node and the sub-nodes it owns.
    pub(crate) fn free(&mut self, id: NodeId) {
        for child in self.children(id) {
            if self.parent(child) == Some(id) {
                self.free(child);
            }
        }
        if let Some(slot) = self.nodes.get_mut(id.0) {
            *slot = None;
        }
    }

    /// Give every item of a sequence its position as name.
    pub(crate) fn renumber(&mut self, id: NodeId) {
        for (i, child) in self.children(id).into_iter().enumerate() {
            if let Ok(node) = self.data_mut(child) {
                node.name = format!("[{i}]");
            }
        }
    }

    /// Deep copy of a node as the root of a new tree.
    pub fn copy(&self, id: NodeId) -> SchemaResult<Tree> {
        self.data(id)?;
        let mut tree = self.empty_like();
        if let Some(root) = self.copy_into(id, &mut tree, None, "$".to_string()) {
            tree.root = root;
        }
        Ok(tree)
    }

    pub(crate) fn empty_like(&self) -> Tree {
        let mut tree = Tree::empty(self.config.clone());
        tree.permissions = self.permissions;
        tree
    }

    /// Copy the sub-tree under `src` into `dst`. A node bound into two
    /// places of the sub-tree is copied once and stays shared.
    pub(crate) fn copy_into(
        &self,
        src: NodeId,
        dst: &mut Tree,
        parent: Option<NodeId>,
        name: String,
    ) -> Option<NodeId> {
        let mut state = Copying::default();
        let top = self.copy_node(src, dst, parent, name, &mut state)?;
        while let Some(from) = state.pending.pop() {
            let (Some(node), Some(&to)) = (self.slot(from), state.copied.get(&from)) else {
                continue;
            };
            let body = match &node.body {
                Body::Leaf => Body::Leaf,
                Body::Items(None) => Body::Items(None),
                Body::Fields(fields) => Body::Fields(
                    fields
                        .iter()
                        .filter_map(|(key, child)| {
                            self.copy_link(*child, dst, to, key.clone(), &mut state)
                                .map(|c| (key.clone(), c))
                        })
                        .collect(),
                ),
                Body::Items(Some(ids)) => Body::Items(Some(
                    ids.iter()
                        .enumerate()
                        .filter_map(|(i, child)| {
                            self.copy_link(*child, dst, to, format!("[{i}]"), &mut state)
                        })
                        .collect(),
                )),
            };
            dst.set_body(to, body);
        }
        Some(top)
    }

    /// Allocate copies of `src` and of the nodes it owns. Bodies are wired
    /// afterwards, once every owned node has its copy.
    fn copy_node(
        &self,
        src: NodeId,
        dst: &mut Tree,
        parent: Option<NodeId>,
        name: String,
        state: &mut Copying,
    ) -> Option<NodeId> {
        let node = self.slot(src)?;
        let id = dst.alloc(NodeData {
            schema: node.schema.clone(),
            value: node.value.clone(),
            old_value: node.old_value.clone(),
            parent,
            name,
            body: Body::Leaf,
        });
        state.copied.insert(src, id);
        state.pending.push(src);
        for child in self.children(src) {
            if self.parent(child) == Some(src) && !state.copied.contains_key(&child) {
                let name = self.slot(child).map(|n| n.name.clone()).unwrap_or_default();
                self.copy_node(child, dst, Some(id), name, state);
            }
        }
        Some(id)
    }

    /// Copy of a child slot: the shared copy when one exists, otherwise a
    /// fresh copy owned by `parent`.
    fn copy_link(
        &self,
        child: NodeId,
        dst: &mut Tree,
        parent: NodeId,
        name: String,
        state: &mut Copying,
    ) -> Option<NodeId> {
        match state.copied.get(&child) {
            Some(&copy) => Some(copy),
            None => self.copy_node(child, dst, Some(parent), name, state),
        }
    }
}

#[derive(Default)]
struct Copying {
    copied: HashMap<NodeId, NodeId>,
    pending: Vec<NodeId>,
}

/// Template of the `index`-th item of a list or tuple.
pub(crate) fn item_template(schema: &Schema, index: usize) -> Option<Arc<Schema>> {
    match schema.kind() {
        SchemaKind::List { element, .. } => Some(element.clone()),
        SchemaKind::Tuple(items) => items.get(index).cloned(),
        _ => None,
    }
}

pub(crate) fn existence(schema: &Schema, value: &Value, root: &NodeRef<'_>) -> bool {
    match &schema.options().exists {
        None | Some(Exists::Flag(true)) => true,
        Some(Exists::Flag(false)) => false,
        Some(Exists::Func(f)) => f(value, root),
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("root", &self.root)
            .field("value", &self.value(self.root))
            .field("nodes", &self.nodes.iter().filter(|n| n.is_some()).count())
            .finish()
    }
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.node_eq(self.root, other, other.root)
    }
}
