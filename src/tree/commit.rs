use super::check::normalize;
use super::events::CHANGE;
use super::{Body, NodeId, Origin, Tree};
use crate::error::{SchemaError, SchemaResult};
use crate::schema::Schema;
use crate::value::Value;
use log::debug;
use std::sync::Arc;

impl Tree {
    /// Check `value` against the node and commit it. Returns whether the
    /// committed value changed. Derived values are brought up to date before
    /// returning.
    pub fn set<V: Into<Value>>(&mut self, id: NodeId, value: V) -> SchemaResult<bool> {
        self.assign(id, value.into(), Origin::External)
    }

    pub(crate) fn assign(&mut self, id: NodeId, value: Value, origin: Origin) -> SchemaResult<bool> {
        let probe = self.probe(id)?;
        if origin == Origin::External {
            if !self.probe_visible(&probe) {
                return Err(SchemaError::not_found("locked", probe.path));
            }
            if probe.schema.is_computed() {
                return Err(SchemaError::read_only(
                    "cannot modify a computed value",
                    probe.path,
                ));
            }
        }

        let saved = self.permissions;
        if origin == Origin::Internal {
            self.permissions.disable();
        }
        let checked = self
            .corrected(&probe, value)
            .and_then(|value| self.check_corrected(&probe, &value).map(|_| value));
        self.permissions = saved;

        let changed = self.commit_corrected(id, checked?, true)?;
        if origin == Origin::External {
            self.drain()?;
        }
        Ok(changed)
    }

    /// Restore the value held before the last commit.
    pub fn rollback(&mut self, id: NodeId) -> SchemaResult<bool> {
        let old = self.old_value(id);
        let changed = self.commit_corrected(id, old, true)?;
        self.drain()?;
        Ok(changed)
    }

    /// Store an already checked value. Sub-nodes are corrected on the way down.
    pub(crate) fn commit_corrected(
        &mut self,
        id: NodeId,
        value: Value,
        notify: bool,
    ) -> SchemaResult<bool> {
        let node = self.data(id)?;
        let schema = node.schema.clone();
        match node.body.clone() {
            Body::Leaf => {
                let value = self.or_default(&schema, value, id)?;
                let node = self.data_mut(id)?;
                let old = std::mem::replace(&mut node.value, value.clone());
                node.old_value = old.clone();
                if old.same(&value) {
                    return Ok(false);
                }
                self.after_change(id, &schema, &old, &value, notify);
                Ok(true)
            }
            Body::Fields(fields) => {
                let before = self.value(id);
                let value = match value {
                    Value::Null => schema.options().default_value(),
                    other => other,
                };
                match value {
                    Value::Map(map) => {
                        for (key, child) in &fields {
                            let Some(sub) = map.get(key) else {
                                continue;
                            };
                            self.commit_child(*child, sub.clone(), notify)?;
                        }
                    }
                    Value::Null => {
                        for (_, child) in &fields {
                            self.commit_child(*child, Value::Null, notify)?;
                        }
                    }
                    other => {
                        return Err(SchemaError::type_mismatch("Must be a dict", self.path_name(id))
                            .with("value", other))
                    }
                }
                let after = self.value(id);
                self.data_mut(id)?.old_value = before.clone();
                if before.same(&after) {
                    return Ok(false);
                }
                if let Some(on_change) = &schema.options().on_change {
                    on_change(&before, &after, &self.root_ref());
                }
                Ok(true)
            }
            Body::Items(old_ids) => {
                let value = self.or_default(&schema, value, id)?;
                let before = self.value(id);
                if value.same(&before) {
                    return Ok(false);
                }
                for child in old_ids.unwrap_or_default() {
                    self.free(child);
                }
                let items = value.as_items().map(<[Value]>::to_vec);
                let ids = items.as_ref().map(|items| {
                    (0..items.len())
                        .filter_map(|i| {
                            let template = super::item_template(&schema, i)?;
                            Some(self.instantiate(template, Some(id), format!("[{i}]")))
                        })
                        .collect::<Vec<_>>()
                });
                self.set_body(id, Body::Items(ids.clone()));
                for (child, item) in ids.unwrap_or_default().into_iter().zip(items.unwrap_or_default()) {
                    self.commit_child(child, item, false)?;
                }
                let after = self.value(id);
                self.data_mut(id)?.old_value = before.clone();
                self.after_change(id, &schema, &before, &after, notify);
                Ok(true)
            }
        }
    }

    /// Correct and commit a sub-node. Derived sub-nodes keep their value.
    pub(crate) fn commit_child(&mut self, child: NodeId, value: Value, notify: bool) -> SchemaResult<bool> {
        let probe = self.probe(child)?;
        if probe.schema.is_computed() {
            return Ok(false);
        }
        let value = self.corrected(&probe, value)?;
        self.commit_corrected(child, value, notify)
    }

    fn or_default(&self, schema: &Schema, value: Value, id: NodeId) -> SchemaResult<Value> {
        if value.is_null() {
            normalize(schema, schema.options().default_value(), &self.path_name(id))
        } else {
            Ok(value)
        }
    }

    pub(crate) fn after_change(
        &mut self,
        id: NodeId,
        schema: &Arc<Schema>,
        old: &Value,
        new: &Value,
        notify: bool,
    ) {
        debug!("{} changed from {} to {}", self.path_name(id), old, new);
        if let Some(on_change) = &schema.options().on_change {
            on_change(old, new, &self.root_ref());
        }
        if notify {
            self.events.enqueue(CHANGE, id);
        }
    }
}
