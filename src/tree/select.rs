use super::{Body, NodeId, Tree};
use crate::schema::SchemaKind;
use crate::selector::{Index, Segment, Selector};
use crate::value::Value;

/// Result of a path selection: one node, or the nodes a wildcard or slice
/// fanned out to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Node(NodeId),
    List(Vec<Selection>),
}

impl Selection {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Selection::Node(id) => Some(*id),
            Selection::List(_) => None,
        }
    }

    pub fn value(&self, tree: &Tree) -> Value {
        match self {
            Selection::Node(id) => tree.value(*id),
            Selection::List(items) => Value::List(items.iter().map(|s| s.value(tree)).collect()),
        }
    }

    /// Every selected node, flattened.
    pub fn nodes(&self) -> Vec<NodeId> {
        match self {
            Selection::Node(id) => vec![*id],
            Selection::List(items) => items.iter().flat_map(Selection::nodes).collect(),
        }
    }
}

impl Tree {
    /// Resolve a path such as `$.b.l[0:2].i`. `$` starts at the root, `@` at
    /// `id`. Anything that does not resolve gives `None`.
    pub fn select(&self, id: NodeId, path: &str) -> Option<Selection> {
        self.slot(id)?;
        if path.is_empty() {
            return Some(Selection::Node(id));
        }
        let mut selector = Selector::parse(path);
        let first = selector.pop()?;
        let start = match first.name.as_str() {
            "$" => self.root,
            "@" => id,
            _ => return None,
        };
        self.walk(start, first.filter.as_deref(), selector.as_slice())
    }

    pub fn select_value(&self, id: NodeId, path: &str) -> Option<Value> {
        self.select(id, path).map(|s| s.value(self))
    }

    pub fn multi_select(&self, id: NodeId, paths: &[&str]) -> Vec<Option<Selection>> {
        paths.iter().map(|path| self.select(id, path)).collect()
    }

    /// Resolve a path to exactly one node.
    pub fn lookup(&self, id: NodeId, path: &str) -> Option<NodeId> {
        self.select(id, path)?.node()
    }

    fn walk(&self, id: NodeId, filter: Option<&str>, rest: &[Segment]) -> Option<Selection> {
        let node = self.slot(id)?;

        if let Some(filter) = filter {
            let Body::Items(Some(ids)) = &node.body else {
                return None;
            };
            let index = match node.schema.kind() {
                SchemaKind::Tuple(_) => {
                    if filter.is_empty() || !filter.chars().all(|c| c.is_ascii_digit()) {
                        return None;
                    }
                    Index::Single(filter.parse().ok()?)
                }
                _ => Index::parse(filter)?,
            };
            let positions = index.positions(ids.len());
            return match index {
                Index::Single(_) => {
                    let child = ids[*positions.first()?];
                    if !self.exists_or_can_read(child) {
                        return None;
                    }
                    self.walk(child, None, rest)
                }
                Index::Slice { .. } => Some(Selection::List(
                    positions
                        .into_iter()
                        .map(|i| ids[i])
                        .filter(|child| self.exists_or_can_read(*child))
                        .filter_map(|child| self.walk(child, None, rest))
                        .collect(),
                )),
            };
        }

        if matches!(node.body, Body::Items(None)) {
            return None;
        }
        let Some((segment, tail)) = rest.split_first() else {
            return Some(Selection::Node(id));
        };

        match &node.body {
            Body::Items(Some(ids)) => {
                let found: Vec<Selection> = ids
                    .iter()
                    .filter(|child| self.exists_or_can_read(**child))
                    .filter_map(|child| self.walk(*child, None, rest))
                    .collect();
                (!found.is_empty()).then_some(Selection::List(found))
            }
            Body::Fields(fields) => {
                if segment.is_anchor() {
                    return None;
                }
                if segment.is_wildcard() {
                    let mut found: Vec<Selection> = fields
                        .iter()
                        .filter(|(_, child)| self.exists_or_can_read(*child))
                        .filter_map(|(_, child)| self.walk(*child, segment.filter.as_deref(), tail))
                        .collect();
                    return match found.len() {
                        0 => None,
                        1 => found.pop(),
                        _ => Some(Selection::List(found)),
                    };
                }
                let child = fields
                    .iter()
                    .find(|(key, _)| *key == segment.name)
                    .map(|(_, child)| *child)?;
                if !self.exists_or_can_read(child) {
                    return None;
                }
                self.walk(child, segment.filter.as_deref(), tail)
            }
            _ => None,
        }
    }
}
