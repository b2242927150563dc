//! Projections of a tree through a view tag
//!
//! A schema lists the view tags it takes part in. A bare tag (`"summary"`)
//! keeps every node that does not list `"!summary"`; an explicit tag
//! (`"+summary"`) keeps only nodes that list `"summary"`, or containers
//! holding such nodes.

use super::{Body, NodeData, NodeId, Tree};
use crate::error::SchemaResult;

/// Membership of one node in a requested view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMembership {
    Yes,
    No,
    /// Bare request, node not excluded
    Unknown,
    /// Explicit request, node not listed
    ExplicitUnknown,
}

pub fn belongs_to_view(views: &[String], request: Option<&str>) -> ViewMembership {
    let Some(request) = request else {
        return ViewMembership::Yes;
    };
    let excluded = |tag: &str| views.iter().any(|v| v.strip_prefix('!') == Some(tag));
    match request.trim_end().strip_prefix('+') {
        Some(tag) if views.iter().any(|v| v == tag) => ViewMembership::Yes,
        Some(tag) if excluded(tag) => ViewMembership::No,
        Some(_) => ViewMembership::ExplicitUnknown,
        None if excluded(request) => ViewMembership::No,
        None => ViewMembership::Unknown,
    }
}

enum Keep {
    Whole,
    Partial(Vec<(String, NodeId, Keep)>),
}

impl Tree {
    /// Copy of the sub-tree under `id` restricted to a view, `None` when
    /// nothing of it belongs there.
    pub fn view(&self, id: NodeId, tag: Option<&str>) -> SchemaResult<Option<Tree>> {
        self.data(id)?;
        let Some(keep) = self.keep(id, tag) else {
            return Ok(None);
        };
        let mut tree = self.empty_like();
        if let Some(root) = self.copy_kept(id, &keep, &mut tree, None, "$".to_string()) {
            tree.root = root;
        }
        Ok(Some(tree))
    }

    fn keep(&self, id: NodeId, tag: Option<&str>) -> Option<Keep> {
        let node = self.slot(id)?;
        let explicit = match belongs_to_view(&node.schema.options().views, tag) {
            ViewMembership::Yes => return Some(Keep::Whole),
            ViewMembership::No => return None,
            ViewMembership::Unknown => false,
            ViewMembership::ExplicitUnknown => true,
        };
        let kept: Vec<(String, NodeId, Keep)> = match &node.body {
            Body::Leaf | Body::Items(None) => {
                return (!explicit).then_some(Keep::Whole);
            }
            Body::Fields(fields) => fields
                .iter()
                .filter(|(_, child)| self.exists_or_can_read(*child))
                .filter_map(|(key, child)| Some((key.clone(), *child, self.keep(*child, tag)?)))
                .collect(),
            Body::Items(Some(ids)) => ids
                .iter()
                .filter(|child| self.exists(**child))
                .filter_map(|child| Some((String::new(), *child, self.keep(*child, tag)?)))
                .collect(),
        };
        if explicit && kept.is_empty() {
            return None;
        }
        Some(Keep::Partial(kept))
    }

    fn copy_kept(
        &self,
        src: NodeId,
        keep: &Keep,
        dst: &mut Tree,
        parent: Option<NodeId>,
        name: String,
    ) -> Option<NodeId> {
        let kept = match keep {
            Keep::Whole => return self.copy_into(src, dst, parent, name),
            Keep::Partial(kept) => kept,
        };
        let node = self.slot(src)?;
        let id = dst.alloc(NodeData {
            schema: node.schema.clone(),
            value: node.value.clone(),
            old_value: node.old_value.clone(),
            parent,
            name,
            body: Body::Leaf,
        });
        let body = match &node.body {
            Body::Fields(_) => Body::Fields(
                kept.iter()
                    .filter_map(|(key, child, keep)| {
                        self.copy_kept(*child, keep, dst, Some(id), key.clone())
                            .map(|c| (key.clone(), c))
                    })
                    .collect(),
            ),
            Body::Items(_) => Body::Items(Some(
                kept.iter()
                    .enumerate()
                    .filter_map(|(i, (_, child, keep))| {
                        self.copy_kept(*child, keep, dst, Some(id), format!("[{i}]"))
                    })
                    .collect(),
            )),
            Body::Leaf => Body::Leaf,
        };
        dst.set_body(id, body);
        Some(id)
    }
}
