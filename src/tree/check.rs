//! Validation of candidate values
//!
//! A [`Probe`] is the node being checked: either a live node or a template
//! standing at a position that does not hold a node yet (a list item being
//! inserted, a union candidate). Rights and existence of a template resolve
//! through its enclosing templates and then through the live anchor.

use super::{existence, Body, NodeId, Tree};
use crate::error::{SchemaError, SchemaResult};
use crate::permissions::{self, MODIFY, READ};
use crate::schema::{pattern, Allowed, Schema, SchemaKind};
use crate::value::Value;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct Probe {
    pub(crate) schema: Arc<Schema>,
    pub(crate) node: Option<NodeId>,
    /// Nearest live ancestor
    pub(crate) anchor: Option<NodeId>,
    /// Enclosing templates between the probe and its anchor, nearest first
    pub(crate) outer: Vec<Arc<Schema>>,
    pub(crate) path: String,
}

impl Probe {
    fn child(&self, schema: Arc<Schema>, path: String) -> Probe {
        match self.node {
            Some(id) => Probe {
                schema,
                node: None,
                anchor: Some(id),
                outer: Vec::new(),
                path,
            },
            None => {
                let mut outer = Vec::with_capacity(self.outer.len() + 1);
                outer.push(self.schema.clone());
                outer.extend(self.outer.iter().cloned());
                Probe {
                    schema,
                    node: None,
                    anchor: self.anchor,
                    outer,
                    path,
                }
            }
        }
    }
}

/// Decode text for extended types and bring a value to the node's own kind.
pub(crate) fn normalize(schema: &Schema, value: Value, path: &str) -> SchemaResult<Value> {
    match (schema.kind(), value) {
        (SchemaKind::Extend(codec), Value::String(raw)) => match codec.decode(&raw) {
            Ok(decoded) => Ok(decoded),
            Err(cause) => Err(SchemaError::serialization("error json decode", path, cause)
                .with("json", raw)),
        },
        (SchemaKind::Tuple(_), Value::List(items)) => Ok(Value::Tuple(items)),
        (SchemaKind::Timestamp, Value::Int(seconds)) => Ok(Value::Timestamp(seconds)),
        (SchemaKind::Timestamp, Value::DateTime(dt)) => Ok(Value::Timestamp(dt.timestamp())),
        (SchemaKind::Union(candidates), value) => {
            for candidate in candidates {
                if let Ok(v) = normalize(candidate, value.clone(), path) {
                    if !v.is_null() && type_ok(candidate, &v) {
                        return Ok(v);
                    }
                }
            }
            Ok(value)
        }
        (_, value) => Ok(value),
    }
}

fn type_ok(schema: &Schema, value: &Value) -> bool {
    match (schema.kind(), value) {
        (SchemaKind::Bool, Value::Bool(_))
        | (SchemaKind::Int { .. }, Value::Int(_))
        | (SchemaKind::Float { .. }, Value::Float(_))
        | (SchemaKind::String { .. }, Value::String(_))
        | (SchemaKind::Timestamp, Value::Timestamp(_) | Value::Int(_))
        | (SchemaKind::Object(_), Value::Map(_))
        | (SchemaKind::List { .. }, Value::List(_))
        | (SchemaKind::Tuple(_), Value::Tuple(_) | Value::List(_)) => true,
        (SchemaKind::Union(candidates), v) => candidates.iter().any(|c| type_ok(c, v)),
        (SchemaKind::Extend(codec), v) => codec.accepts(v),
        _ => false,
    }
}

fn type_error(schema: &Schema, value: &Value, path: &str) -> SchemaError {
    let message = match schema.kind() {
        SchemaKind::Bool => "Not a bool",
        SchemaKind::Int { .. } => "Must be a int",
        SchemaKind::Float { .. } => "Must be a float",
        SchemaKind::String { .. } => "Must be a string",
        SchemaKind::Timestamp => "Timestamp must be a timestamp",
        SchemaKind::Object(_) => "Must be a dict",
        SchemaKind::List { .. } => "Must be a list",
        SchemaKind::Tuple(_) => "Must be a tuple or a Tuple",
        SchemaKind::Union(_) => "Match no model",
        SchemaKind::Extend(_) => "Must be a extend type",
    };
    SchemaError::type_mismatch(message, path)
        .with("expected", schema.kind().name())
        .with("value", value.clone())
}

impl Tree {
    pub(crate) fn probe(&self, id: NodeId) -> SchemaResult<Probe> {
        let node = self.data(id)?;
        Ok(Probe {
            schema: node.schema.clone(),
            node: Some(id),
            anchor: node.parent,
            outer: Vec::new(),
            path: self.path_name(id),
        })
    }

    fn probe_allowed(&self, probe: &Probe, right: &str, other: Option<&Value>) -> bool {
        let root = self.root_ref();
        let own = std::iter::once(&probe.schema)
            .chain(probe.outer.iter())
            .map(|s| &s.options().rights);
        let anchored = self.lineage(probe.anchor).map(|n| &n.schema.options().rights);
        permissions::resolve(self.permissions, own.chain(anchored), right, &root, other)
    }

    pub(crate) fn probe_visible(&self, probe: &Probe) -> bool {
        let root = self.root_ref();
        let own_value = probe
            .node
            .and_then(|id| self.slot(id))
            .map(|n| n.value.clone())
            .unwrap_or_default();
        let exists = existence(&probe.schema, &own_value, &root)
            && probe.outer.iter().all(|s| existence(s, &Value::Null, &root))
            && self
                .lineage(probe.anchor)
                .all(|n| existence(&n.schema, &n.value, &root));
        exists && self.probe_allowed(probe, READ, None)
    }

    /// Apply the transform, then normalize.
    pub(crate) fn corrected(&self, probe: &Probe, value: Value) -> SchemaResult<Value> {
        let value = match &probe.schema.options().transform {
            Some(transform) => transform(&value, &self.root_ref()),
            None => value,
        };
        normalize(&probe.schema, value, &probe.path)
    }

    /// Validate `value` against a node without committing anything.
    pub fn check<V: Into<Value>>(&self, id: NodeId, value: V) -> SchemaResult<()> {
        let probe = self.probe(id)?;
        let value = self.corrected(&probe, value.into())?;
        self.check_corrected(&probe, &value)
    }

    /// Full check of an already corrected value.
    pub(crate) fn check_corrected(&self, probe: &Probe, value: &Value) -> SchemaResult<()> {
        self.check_arranged(probe, value, None)
    }

    /// Check a sequence edit. `layout` gives, for each item of the candidate,
    /// the live item it keeps, or `None` for a new one.
    pub(crate) fn check_edit(
        &self,
        probe: &Probe,
        value: &Value,
        layout: &[Option<NodeId>],
    ) -> SchemaResult<()> {
        self.check_arranged(probe, value, Some(layout))
    }

    fn check_arranged(
        &self,
        probe: &Probe,
        value: &Value,
        layout: Option<&[Option<NodeId>]>,
    ) -> SchemaResult<()> {
        let schema = &probe.schema;
        let path = probe.path.as_str();

        if !self.probe_allowed(probe, READ, None) {
            return Err(SchemaError::permission("cannot read (and modify) value", path));
        }

        if value.is_null() {
            if schema.options().required {
                return Err(SchemaError::required("Cannot be empty", path));
            }
            return Ok(());
        }

        if !type_ok(schema, value) {
            return Err(type_error(schema, value, path));
        }

        if let SchemaKind::Tuple(positions) = schema.kind() {
            let found = value.as_items().map_or(0, <[Value]>::len);
            if found != positions.len() {
                return Err(SchemaError::structure("Tuple not same size", path)
                    .with("expected", positions.len())
                    .with("found", found));
            }
        }

        // Sequence constraints see the items as they would be committed.
        let items = match schema.kind() {
            SchemaKind::List { .. } | SchemaKind::Tuple(_) => {
                Some(self.corrected_items(probe, value, layout)?)
            }
            _ => None,
        };
        let rebuilt;
        let value = match &items {
            Some(items) => {
                let values = items.iter().map(|(_, item)| item.clone()).collect();
                rebuilt = match value {
                    Value::Tuple(_) => Value::Tuple(values),
                    _ => Value::List(values),
                };
                &rebuilt
            }
            None => value,
        };

        if !self.probe_allowed(probe, MODIFY, Some(value)) && self.differs(probe, value) {
            return Err(SchemaError::read_only("cannot modify value", path)
                .with("value", value.clone()));
        }

        self.check_constraints(probe, value)?;

        match schema.kind() {
            SchemaKind::Object(_) => self.check_object(probe, value),
            SchemaKind::List { .. } | SchemaKind::Tuple(_) => {
                for (child, item) in items.iter().flatten() {
                    self.check_corrected(child, item)?;
                }
                Ok(())
            }
            SchemaKind::Union(candidates) => {
                let candidate = candidates
                    .iter()
                    .find(|c| type_ok(c, value))
                    .ok_or_else(|| type_error(schema, value, path))?;
                let probe = Probe {
                    schema: candidate.clone(),
                    node: None,
                    anchor: probe.node.or(probe.anchor),
                    outer: if probe.node.is_some() {
                        Vec::new()
                    } else {
                        probe.outer.clone()
                    },
                    path: probe.path.clone(),
                };
                self.check_corrected(&probe, value)
            }
            _ => Ok(()),
        }
    }

    /// Whether `value` would change the committed value. Objects compare the
    /// provided keys only.
    fn differs(&self, probe: &Probe, value: &Value) -> bool {
        let current = probe.node.map(|id| self.value(id)).unwrap_or_default();
        match (&current, value) {
            (Value::Map(current), Value::Map(new)) => new
                .iter()
                .any(|(key, v)| !current.get(key).map_or(false, |c| c.same(v))),
            _ => !current.same(value),
        }
    }

    fn check_constraints(&self, probe: &Probe, value: &Value) -> SchemaResult<()> {
        let options = probe.schema.options();
        let path = probe.path.as_str();
        let root = self.root_ref();

        if let Some(allowed) = &options.allowed {
            let resolved = match allowed {
                Allowed::Values(values) => values.clone(),
                Allowed::Func(f) => match f(value, &root) {
                    Value::List(values) => values,
                    other => {
                        return Err(SchemaError::constraint("Union constraint not list", path)
                            .with("in", other))
                    }
                },
            };
            if !resolved.contains(value) {
                return Err(SchemaError::constraint("not in list", path)
                    .with("value", value.clone())
                    .with("in", Value::List(resolved)));
            }
        }

        for constraint in &options.constraints {
            if !constraint(value, &root) {
                return Err(SchemaError::constraint("constraint not validated", path)
                    .with("value", value.clone()));
            }
        }

        match probe.schema.kind() {
            SchemaKind::Int { min, max } => {
                let n = value.as_i64().unwrap_or_default();
                if let Some(min) = min.filter(|m| n < *m) {
                    return Err(below_min(path, value, min));
                }
                if let Some(max) = max.filter(|m| n > *m) {
                    return Err(above_max(path, value, max));
                }
            }
            SchemaKind::Float { min, max } => {
                let n = value.as_f64().unwrap_or_default();
                if let Some(min) = min.filter(|m| n < *m) {
                    return Err(below_min(path, value, min));
                }
                if let Some(max) = max.filter(|m| n > *m) {
                    return Err(above_max(path, value, max));
                }
            }
            SchemaKind::String { patterns } => {
                let text = value.as_str().unwrap_or_default();
                for p in patterns {
                    let regexp = p.resolve(value, &root);
                    if !pattern::matches_start(&regexp, text).map_err(|e| e.at(path))? {
                        return Err(SchemaError::constraint("Dont match regexp", path)
                            .with("value", value.clone())
                            .with("regexp", regexp));
                    }
                }
            }
            SchemaKind::List { min, max, uniq, .. } => {
                let items = value.as_items().unwrap_or_default();
                if let Some(min) = min.filter(|m| items.len() < *m) {
                    return Err(below_min(path, value, min));
                }
                if let Some(max) = max.filter(|m| items.len() > *m) {
                    return Err(above_max(path, value, max));
                }
                if *uniq {
                    for (i, item) in items.iter().enumerate() {
                        if items[..i].contains(item) {
                            return Err(SchemaError::constraint("duplicate value in list", path)
                                .with("value", item.clone()));
                        }
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn check_object(&self, probe: &Probe, value: &Value) -> SchemaResult<()> {
        let Value::Map(map) = value else {
            return Err(type_error(&probe.schema, value, &probe.path));
        };
        let separator = &self.config.path_separator;

        let fields: Vec<(String, Probe)> = match probe.node.and_then(|id| self.slot(id)) {
            Some(node) => match &node.body {
                Body::Fields(fields) => fields
                    .iter()
                    .map(|(key, child)| Ok((key.clone(), self.probe(*child)?)))
                    .collect::<SchemaResult<_>>()?,
                _ => Vec::new(),
            },
            None => match probe.schema.kind() {
                SchemaKind::Object(templates) => templates
                    .iter()
                    .map(|(key, template)| {
                        let path = format!("{}{}{}", probe.path, separator, key);
                        (key.clone(), probe.child(template.clone(), path))
                    })
                    .collect(),
                _ => Vec::new(),
            },
        };

        for (key, child) in &fields {
            let Some(sub) = map.get(key) else {
                continue;
            };
            if !self.probe_visible(child) {
                return Err(SchemaError::not_found("locked", child.path.clone()));
            }
            if child.schema.is_computed() {
                continue;
            }
            let sub = self.corrected(child, sub.clone())?;
            self.check_corrected(child, &sub)?;
        }

        if let Some(unknown) = map.keys().find(|k| !fields.iter().any(|(key, _)| key == *k)) {
            return Err(SchemaError::structure(
                "Unknown content",
                format!("{}{}{}", probe.path, separator, unknown),
            ));
        }
        Ok(())
    }

    /// Probes for the items of a candidate sequence. Without a layout the
    /// live item at the same position stands for each item.
    fn item_probes(
        &self,
        probe: &Probe,
        len: usize,
        layout: Option<&[Option<NodeId>]>,
    ) -> SchemaResult<Vec<Probe>> {
        let live: Vec<Option<NodeId>> = match layout {
            Some(layout) => layout.to_vec(),
            None => probe
                .node
                .map(|id| self.children(id))
                .unwrap_or_default()
                .into_iter()
                .map(Some)
                .collect(),
        };
        (0..len)
            .map(|i| {
                let path = format!("{}[{}]", probe.path, i);
                if let Some(Some(child)) = live.get(i) {
                    let mut item = self.probe(*child)?;
                    item.path = path;
                    return Ok(item);
                }
                let template = super::item_template(&probe.schema, i).ok_or_else(|| {
                    SchemaError::structure("Tuple not same size", probe.path.clone())
                })?;
                Ok(probe.child(template, path))
            })
            .collect()
    }

    fn corrected_items(
        &self,
        probe: &Probe,
        value: &Value,
        layout: Option<&[Option<NodeId>]>,
    ) -> SchemaResult<Vec<(Probe, Value)>> {
        let items = value.as_items().unwrap_or_default();
        let probes = self.item_probes(probe, items.len(), layout)?;
        probes
            .into_iter()
            .zip(items)
            .map(|(child, item)| {
                let item = self.corrected(&child, item.clone())?;
                Ok((child, item))
            })
            .collect()
    }
}

fn below_min<B: Into<Value>>(path: &str, value: &Value, min: B) -> SchemaError {
    SchemaError::constraint("Must be above Minimal", path)
        .with("value", value.clone())
        .with("min", min)
}

fn above_max<B: Into<Value>>(path: &str, value: &Value, max: B) -> SchemaError {
    SchemaError::constraint("Must be below Maximal", path)
        .with("value", value.clone())
        .with("max", max)
}
