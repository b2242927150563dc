//! Named events and derived value propagation
//!
//! Commits queue a `change` event for the node they touched. Draining the
//! queue delivers each event to every visible node of the tree except the
//! one it came from, and recomputes derived values on `change`. Recomputed
//! values commit through the same pipeline and may queue further events, so
//! a drain runs until nothing changes or the configured budget is spent.

use super::{NodeId, NodeRef, Origin, Tree};
use crate::error::{SchemaError, SchemaResult};
use log::{debug, warn};
use std::collections::VecDeque;

pub(crate) const CHANGE: &str = "change";

#[derive(Debug, Default)]
pub(crate) struct EventQueue {
    pending: VecDeque<(String, NodeId)>,
    draining: bool,
}

impl EventQueue {
    /// Queue an event unless the same one is already waiting.
    pub(crate) fn enqueue(&mut self, name: &str, origin: NodeId) {
        if !self.pending.iter().any(|(n, o)| n == name && *o == origin) {
            self.pending.push_back((name.to_string(), origin));
        }
    }
}

/// What an event handler sees
pub struct EventContext<'t> {
    pub name: &'t str,
    pub root: NodeRef<'t>,
    /// Node the handler is registered on
    pub node: NodeRef<'t>,
}

impl Tree {
    /// Events queued and not yet delivered.
    pub fn pending_events(&self) -> Vec<(String, NodeId)> {
        self.events.pending.iter().cloned().collect()
    }

    /// Deliver `event` to the sub-tree under `id`, skipping `origin`, then
    /// settle every event it caused.
    pub fn trigger(&mut self, id: NodeId, event: &str, origin: Option<NodeId>) -> SchemaResult<()> {
        self.data(id)?;
        self.dispatch(id, event, origin)?;
        self.drain()
    }

    pub(crate) fn drain(&mut self) -> SchemaResult<()> {
        if self.events.draining {
            return Ok(());
        }
        self.events.draining = true;
        let result = self.run_queue();
        self.events.draining = false;
        if result.is_err() {
            self.events.pending.clear();
        }
        result
    }

    fn run_queue(&mut self) -> SchemaResult<()> {
        let mut processed = 0usize;
        while let Some((name, origin)) = self.events.pending.pop_front() {
            processed += 1;
            if processed > self.config.max_drain_events {
                warn!(
                    "Derived values did not settle after {} events, last from {}",
                    self.config.max_drain_events,
                    self.path_name(origin)
                );
                return Err(SchemaError::cyclic(
                    "derived values keep changing each other",
                    self.path_name(origin),
                )
                .with("events", processed));
            }
            if !self.contains(origin) {
                continue;
            }
            let root = self.root;
            self.dispatch(root, &name, Some(origin))?;
        }
        Ok(())
    }

    fn dispatch(&mut self, start: NodeId, event: &str, origin: Option<NodeId>) -> SchemaResult<()> {
        let mut targets = Vec::new();
        self.post_order(start, &mut targets);
        targets.retain(|id| Some(*id) != origin && self.exists_or_can_read(*id));
        debug!("Dispatching '{}' to {} nodes", event, targets.len());

        for id in &targets {
            let schema = self.schema(*id)?;
            for (name, handler) in &schema.options().handlers {
                if name == event {
                    let context = EventContext {
                        name: event,
                        root: self.root_ref(),
                        node: self.node(*id),
                    };
                    handler(&context);
                }
            }
        }

        if event == CHANGE {
            for id in targets {
                if !self.contains(id) {
                    continue;
                }
                let schema = self.schema(id)?;
                if let Some(compute) = &schema.options().compute {
                    let value = compute(&self.root_ref());
                    self.assign(id, value, Origin::Internal)?;
                }
            }
        }
        Ok(())
    }

    fn post_order(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for child in self.children(id) {
            self.post_order(child, out);
        }
        out.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::schema::Schema;
    use crate::value::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_enqueue_coalesces() {
        let mut queue = EventQueue::default();
        queue.enqueue("change", NodeId(1));
        queue.enqueue("change", NodeId(1));
        queue.enqueue("save", NodeId(1));
        assert_eq!(queue.pending.len(), 2);
    }

    #[test]
    fn test_handlers_skip_origin() {
        let hits = Arc::new(AtomicUsize::new(0));
        let (a_hits, b_hits) = (hits.clone(), hits.clone());
        let mut tree = Tree::new(Schema::object([
            ("a", Schema::int().on("ping", move |_| {
                a_hits.fetch_add(1, Ordering::SeqCst);
            })),
            ("b", Schema::int().on("ping", move |ctx| {
                assert_eq!(ctx.name, "ping");
                b_hits.fetch_add(10, Ordering::SeqCst);
            })),
        ]))
        .unwrap();
        let root = tree.root();
        let a = tree.field(root, "a").unwrap();
        tree.trigger(root, "ping", Some(a)).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_derived_value_follows_source() {
        let mut tree = Tree::new(Schema::object([
            ("a", Schema::int().default(1)),
            ("double", Schema::int().compute(|root| {
                Value::Int(root.value_of("a").as_i64().unwrap_or_default() * 2)
            })),
        ]))
        .unwrap();
        let root = tree.root();
        tree.set(root, Value::map([("a", 4)])).unwrap();
        let double = tree.field(root, "double").unwrap();
        assert_eq!(tree.value(double), Value::Int(8));
        assert!(tree.pending_events().is_empty());
    }

    #[test]
    fn test_cycle_is_reported() {
        let config = crate::config::EngineConfig {
            max_drain_events: 50,
            ..Default::default()
        };
        let mut tree = Tree::with_config(
            Schema::object([
                ("seed", Schema::int()),
                ("a", Schema::int().compute(|root| {
                    Value::Int(root.value_of("b").as_i64().unwrap_or_default() + 1)
                })),
                ("b", Schema::int().compute(|root| {
                    Value::Int(root.value_of("a").as_i64().unwrap_or_default() + 1)
                })),
            ]),
            config,
        )
        .unwrap();
        let root = tree.root();
        let err = tree.set(root, Value::map([("seed", 1)])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CyclicDependency);
        assert!(tree.pending_events().is_empty());
    }
}
