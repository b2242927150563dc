//! List style operations on sequence nodes
//!
//! Every mutation validates a scratch copy of the whole sequence first and
//! only then touches live items, so a rejected edit leaves the node as it
//! was. A sequence that was never set becomes an empty one on first edit.

use super::{item_template, Body, NodeId, Tree};
use crate::error::{SchemaError, SchemaResult};
use crate::schema::SchemaKind;
use crate::value::Value;
use std::cmp::Ordering;
use std::ops::Range;

impl Tree {
    fn items(&self, id: NodeId) -> SchemaResult<Option<&[NodeId]>> {
        match &self.data(id)?.body {
            Body::Items(ids) => Ok(ids.as_deref()),
            _ => Err(SchemaError::type_mismatch("Must be a list", self.path_name(id))),
        }
    }

    /// Items of a list node. Tuples are refused: their positions are typed.
    fn list_items(&self, id: NodeId) -> SchemaResult<Vec<NodeId>> {
        let node = self.data(id)?;
        match (node.schema.kind(), &node.body) {
            (SchemaKind::List { .. }, Body::Items(ids)) => Ok(ids.clone().unwrap_or_default()),
            (kind, _) => Err(SchemaError::type_mismatch("Must be a list", self.path_name(id))
                .with("expected", "list")
                .with("found", kind.name())),
        }
    }

    fn sequence_value(&self, id: NodeId, items: Vec<Value>) -> Value {
        match self.slot(id).map(|n| n.schema.kind()) {
            Some(SchemaKind::Tuple(_)) => Value::Tuple(items),
            _ => Value::List(items),
        }
    }

    fn position(&self, id: NodeId, index: isize) -> SchemaResult<usize> {
        let len = self.items(id)?.map_or(0, <[NodeId]>::len);
        resolve_index(index, len).ok_or_else(|| {
            SchemaError::not_found("list index out of range", self.path_name(id))
                .with("index", index as i64)
        })
    }

    /// Item at `index`; negative positions count from the end.
    pub fn item(&self, id: NodeId, index: isize) -> Option<NodeId> {
        let items = self.items(id).ok()??;
        resolve_index(index, items.len()).map(|i| items[i])
    }

    pub fn contains_value(&self, id: NodeId, value: &Value) -> bool {
        self.index_of(id, value).is_some()
    }

    pub fn index_of(&self, id: NodeId, value: &Value) -> Option<usize> {
        self.children(id).iter().position(|c| self.value(*c) == *value)
    }

    /// Replace the items in `range` by `values`.
    pub fn splice<I, V>(&mut self, id: NodeId, range: Range<usize>, values: I) -> SchemaResult<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let probe = self.probe(id)?;
        if !self.probe_visible(&probe) {
            return Err(SchemaError::not_found("locked", probe.path));
        }
        let ids: Vec<NodeId> = self.items(id)?.map(<[NodeId]>::to_vec).unwrap_or_default();
        if range.start > range.end || range.end > ids.len() {
            return Err(SchemaError::not_found("list index out of range", probe.path)
                .with("start", range.start)
                .with("end", range.end));
        }

        let mut scratch: Vec<Value> = ids.iter().map(|c| self.value(*c)).collect();
        scratch.splice(range.clone(), values.iter().cloned());
        let candidate = self.sequence_value(id, scratch);
        // Kept items are checked as themselves; a value written over an item
        // in place is checked against that item.
        let mut layout: Vec<Option<NodeId>> = ids.iter().copied().map(Some).collect();
        let replaced = ids[range.clone()].to_vec();
        layout.splice(
            range.clone(),
            (0..values.len()).map(|offset| replaced.get(offset).copied()),
        );
        self.check_edit(&probe, &candidate, &layout)?;

        let before = self.value(id);
        for removed in &ids[range.clone()] {
            if self.parent(*removed) == Some(id) {
                self.free(*removed);
            }
        }
        let added: Vec<NodeId> = (0..values.len())
            .filter_map(|offset| {
                let at = range.start + offset;
                let template = item_template(&probe.schema, at)?;
                Some(self.instantiate(template, Some(id), format!("[{at}]")))
            })
            .collect();
        let mut all = ids;
        all.splice(range, added.iter().copied());
        self.set_body(id, Body::Items(Some(all)));
        self.renumber(id);
        for (child, value) in added.into_iter().zip(values) {
            self.commit_child(child, value, false)?;
        }

        self.finish_edit(id, before)
    }

    fn finish_edit(&mut self, id: NodeId, before: Value) -> SchemaResult<()> {
        let after = self.value(id);
        let schema = self.schema(id)?;
        self.data_mut(id)?.old_value = before.clone();
        if !before.same(&after) {
            self.after_change(id, &schema, &before, &after, true);
        }
        self.drain()
    }

    pub fn append<V: Into<Value>>(&mut self, id: NodeId, value: V) -> SchemaResult<()> {
        let len = self.len(id);
        self.splice(id, len..len, [value])
    }

    pub fn extend<I, V>(&mut self, id: NodeId, values: I) -> SchemaResult<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let len = self.len(id);
        self.splice(id, len..len, values)
    }

    /// Insert before `index`, clamped to the sequence bounds.
    pub fn insert<V: Into<Value>>(&mut self, id: NodeId, index: isize, value: V) -> SchemaResult<()> {
        let at = clamp_index(index, self.len(id));
        self.splice(id, at..at, [value])
    }

    pub fn set_item<V: Into<Value>>(&mut self, id: NodeId, index: isize, value: V) -> SchemaResult<()> {
        let at = self.position(id, index)?;
        self.splice(id, at..at + 1, [value])
    }

    /// Replace a slice; bounds are clamped.
    pub fn set_slice<I, V>(&mut self, id: NodeId, range: Range<usize>, values: I) -> SchemaResult<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let len = self.len(id);
        let start = range.start.min(len);
        let end = range.end.clamp(start, len);
        self.splice(id, start..end, values)
    }

    pub fn delete(&mut self, id: NodeId, index: isize) -> SchemaResult<()> {
        let at = self.position(id, index)?;
        self.splice(id, at..at + 1, Vec::<Value>::new())
    }

    pub fn delete_slice(&mut self, id: NodeId, range: Range<usize>) -> SchemaResult<()> {
        self.set_slice(id, range, Vec::<Value>::new())
    }

    /// Remove and return an item, the last one by default.
    pub fn pop(&mut self, id: NodeId, index: Option<isize>) -> SchemaResult<Value> {
        if self.len(id) == 0 {
            self.items(id)?;
            return Err(SchemaError::not_found("pop from empty list", self.path_name(id)));
        }
        let at = self.position(id, index.unwrap_or(-1))?;
        let value = self.value(self.children(id)[at]);
        self.splice(id, at..at + 1, Vec::<Value>::new())?;
        Ok(value)
    }

    /// Remove the first item equal to `value`.
    pub fn remove(&mut self, id: NodeId, value: &Value) -> SchemaResult<()> {
        self.items(id)?;
        let at = self.index_of(id, value).ok_or_else(|| {
            SchemaError::not_found("value not in list", self.path_name(id)).with("value", value.clone())
        })?;
        self.splice(id, at..at + 1, Vec::<Value>::new())
    }

    pub fn clear(&mut self, id: NodeId) -> SchemaResult<()> {
        let len = self.len(id);
        self.splice(id, 0..len, Vec::<Value>::new())
    }

    /// Reorder the items by value. Items with no common order are rejected.
    pub fn sort(&mut self, id: NodeId, reverse: bool) -> SchemaResult<()> {
        let ids = self.list_items(id)?;
        let mut keyed: Vec<(Value, NodeId)> = ids.iter().map(|c| (self.value(*c), *c)).collect();

        let mut incomparable = None;
        keyed.sort_by(|(a, _), (b, _)| {
            a.partial_cmp(b).unwrap_or_else(|| {
                incomparable.get_or_insert_with(|| (a.clone(), b.clone()));
                Ordering::Equal
            })
        });
        if let Some((a, b)) = incomparable {
            return Err(SchemaError::type_mismatch("items cannot be ordered", self.path_name(id))
                .with("left", a)
                .with("right", b));
        }
        if reverse {
            keyed.reverse();
        }
        self.reorder(id, keyed.into_iter().map(|(_, c)| c).collect())
    }

    pub fn reverse(&mut self, id: NodeId) -> SchemaResult<()> {
        let mut ids = self.list_items(id)?;
        ids.reverse();
        self.reorder(id, ids)
    }

    /// Commit a permutation of the live items. Each item keeps its node.
    fn reorder(&mut self, id: NodeId, order: Vec<NodeId>) -> SchemaResult<()> {
        let probe = self.probe(id)?;
        if !self.probe_visible(&probe) {
            return Err(SchemaError::not_found("locked", probe.path));
        }
        if matches!(self.data(id)?.body, Body::Items(None)) {
            return Ok(());
        }
        let candidate = self.sequence_value(id, order.iter().map(|c| self.value(*c)).collect());
        let layout: Vec<Option<NodeId>> = order.iter().copied().map(Some).collect();
        self.check_edit(&probe, &candidate, &layout)?;

        let before = self.value(id);
        self.set_body(id, Body::Items(Some(order)));
        self.renumber(id);
        self.finish_edit(id, before)
    }
}

fn resolve_index(index: isize, len: usize) -> Option<usize> {
    let len = isize::try_from(len).ok()?;
    let at = if index < 0 { index + len } else { index };
    (0..len).contains(&at).then_some(at as usize)
}

fn clamp_index(index: isize, len: usize) -> usize {
    let signed = isize::try_from(len).unwrap_or(isize::MAX);
    let at = if index < 0 { index + signed } else { index };
    at.clamp(0, signed) as usize
}
