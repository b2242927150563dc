//! Schema templates
//!
//! A [`Schema`] describes one node: its kind (scalar, container, union or
//! extended type) and the options every kind shares (default, allow-list,
//! constraints, transform, derived value, permissions, views, events).
//! Schemas are immutable once built and are shared by reference between the
//! live nodes instantiated from them.
//!
//! ```ignore
//! let person = Schema::object([
//!     ("age", Schema::int().min(0)),
//!     ("discount", Schema::int().compute(|root| {
//!         let young = root.value_of("age").as_i64().map_or(false, |a| a < 18);
//!         Value::Int(if young { 10 } else { 0 })
//!     })),
//! ]);
//! ```

pub mod options;
pub mod pattern;

pub use options::{Allowed, DefaultValue, Exists, SchemaOptions};
pub use pattern::Pattern;

use crate::extended::ExtendCodec;
use crate::permissions::{Right, MODIFY, READ};
use crate::tree::{EventContext, NodeRef};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Kind specific part of a schema
#[derive(Clone)]
pub enum SchemaKind {
    Bool,
    Int {
        min: Option<i64>,
        max: Option<i64>,
    },
    Float {
        min: Option<f64>,
        max: Option<f64>,
    },
    String {
        patterns: Vec<Pattern>,
    },
    /// Seconds since the epoch
    Timestamp,
    Object(Vec<(String, Arc<Schema>)>),
    List {
        element: Arc<Schema>,
        min: Option<usize>,
        max: Option<usize>,
        uniq: bool,
    },
    Tuple(Vec<Arc<Schema>>),
    Union(Vec<Arc<Schema>>),
    Extend(Arc<dyn ExtendCodec>),
}

impl SchemaKind {
    pub fn name(&self) -> &str {
        match self {
            SchemaKind::Bool => "bool",
            SchemaKind::Int { .. } => "int",
            SchemaKind::Float { .. } => "float",
            SchemaKind::String { .. } => "string",
            SchemaKind::Timestamp => "timestamp",
            SchemaKind::Object(_) => "object",
            SchemaKind::List { .. } => "list",
            SchemaKind::Tuple(_) => "tuple",
            SchemaKind::Union(_) => "union",
            SchemaKind::Extend(codec) => codec.type_name(),
        }
    }
}

impl fmt::Debug for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaKind::Object(fields) => f
                .debug_map()
                .entries(fields.iter().map(|(k, v)| (k, v)))
                .finish(),
            SchemaKind::List { element, min, max, uniq } => f
                .debug_struct("List")
                .field("element", element)
                .field("min", min)
                .field("max", max)
                .field("uniq", uniq)
                .finish(),
            SchemaKind::Tuple(items) => f.debug_tuple("Tuple").field(items).finish(),
            SchemaKind::Union(items) => f.debug_tuple("Union").field(items).finish(),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Template of a node
#[derive(Debug, Clone)]
pub struct Schema {
    kind: SchemaKind,
    options: SchemaOptions,
    invalid: Vec<String>,
}

impl Schema {
    fn with_kind(kind: SchemaKind) -> Self {
        Self {
            kind,
            options: SchemaOptions::default(),
            invalid: Vec::new(),
        }
    }

    pub fn boolean() -> Self {
        Self::with_kind(SchemaKind::Bool)
    }

    pub fn int() -> Self {
        Self::with_kind(SchemaKind::Int { min: None, max: None })
    }

    pub fn float() -> Self {
        Self::with_kind(SchemaKind::Float { min: None, max: None })
    }

    pub fn string() -> Self {
        Self::with_kind(SchemaKind::String { patterns: Vec::new() })
    }

    pub fn timestamp() -> Self {
        Self::with_kind(SchemaKind::Timestamp)
    }

    /// Object with named fields, in declaration order.
    pub fn object<I, K, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<Arc<Schema>>,
    {
        let mut invalid = Vec::new();
        let mut list: Vec<(String, Arc<Schema>)> = Vec::new();
        for (name, schema) in fields {
            let name = name.into();
            if list.iter().any(|(k, _)| *k == name) {
                invalid.push(format!("duplicate field '{name}'"));
                continue;
            }
            list.push((name, schema.into()));
        }
        let mut schema = Self::with_kind(SchemaKind::Object(list));
        schema.invalid = invalid;
        schema
    }

    pub fn list<S: Into<Arc<Schema>>>(element: S) -> Self {
        Self::with_kind(SchemaKind::List {
            element: element.into(),
            min: None,
            max: None,
            uniq: false,
        })
    }

    /// Fixed arity sequence, one template per position.
    pub fn tuple<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<Schema>>,
    {
        Self::with_kind(SchemaKind::Tuple(items.into_iter().map(Into::into).collect()))
    }

    /// One of several candidate schemas, tried in order.
    pub fn union<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<Schema>>,
    {
        let candidates: Vec<Arc<Schema>> = candidates.into_iter().map(Into::into).collect();
        let empty = candidates.is_empty();
        let mut schema = Self::with_kind(SchemaKind::Union(candidates));
        if empty {
            schema.invalid.push("union needs at least one candidate".to_string());
        }
        schema
    }

    pub fn extend<C: ExtendCodec + 'static>(codec: C) -> Self {
        Self::with_kind(SchemaKind::Extend(Arc::new(codec)))
    }

    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    pub fn is_computed(&self) -> bool {
        self.options.compute.is_some()
    }

    /// Whether two schemas describe the same kind of node.
    pub fn same_kind(&self, other: &Schema) -> bool {
        match (&self.kind, &other.kind) {
            (SchemaKind::Extend(a), SchemaKind::Extend(b)) => a.type_name() == b.type_name(),
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }

    /// Every builder misuse found in this schema and its sub-schemas.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = self.invalid.clone();
        let nested: Vec<&Arc<Schema>> = match &self.kind {
            SchemaKind::Object(fields) => fields.iter().map(|(_, s)| s).collect(),
            SchemaKind::List { element, .. } => vec![element],
            SchemaKind::Tuple(items) | SchemaKind::Union(items) => items.iter().collect(),
            _ => Vec::new(),
        };
        for schema in nested {
            problems.extend(schema.problems());
        }
        problems
    }

    pub fn description<D: Into<String>>(mut self, description: D) -> Self {
        self.options.description = Some(description.into());
        self
    }

    pub fn default<V: Into<Value>>(mut self, value: V) -> Self {
        self.options.default = Some(DefaultValue::Value(value.into()));
        self
    }

    /// Default produced by `f` each time one is needed.
    pub fn default_with<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.options.default = Some(DefaultValue::Func(Arc::new(f)));
        self
    }

    pub fn required(mut self) -> Self {
        self.options.required = true;
        self
    }

    pub fn allowed<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.options.allowed = Some(Allowed::Values(values.into_iter().map(Into::into).collect()));
        self
    }

    pub fn allowed_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &NodeRef<'_>) -> Value + Send + Sync + 'static,
    {
        self.options.allowed = Some(Allowed::Func(Arc::new(f)));
        self
    }

    pub fn constraint<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &NodeRef<'_>) -> bool + Send + Sync + 'static,
    {
        self.options.constraints.push(Arc::new(f));
        self
    }

    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &NodeRef<'_>) -> Value + Send + Sync + 'static,
    {
        self.options.transform = Some(Arc::new(f));
        self
    }

    pub fn on_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &Value, &NodeRef<'_>) + Send + Sync + 'static,
    {
        self.options.on_change = Some(Arc::new(f));
        self
    }

    pub fn views<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.options.views = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn exists(mut self, flag: bool) -> Self {
        self.options.exists = Some(Exists::Flag(flag));
        self
    }

    /// Field existence decided by `f(value, root)`.
    pub fn exists_if<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &NodeRef<'_>) -> bool + Send + Sync + 'static,
    {
        self.options.exists = Some(Exists::Func(Arc::new(f)));
        self
    }

    /// Derived value recomputed from the root after every change.
    pub fn compute<F>(mut self, f: F) -> Self
    where
        F: Fn(&NodeRef<'_>) -> Value + Send + Sync + 'static,
    {
        self.options.compute = Some(Arc::new(f));
        self
    }

    /// Register a handler for a named event.
    pub fn on<N, F>(mut self, event: N, f: F) -> Self
    where
        N: Into<String>,
        F: Fn(&EventContext<'_>) + Send + Sync + 'static,
    {
        self.options.handlers.push((event.into(), Arc::new(f)));
        self
    }

    /// Declare a right by name.
    pub fn can<N: Into<String>, R: Into<Right>>(mut self, right: N, decision: R) -> Self {
        self.options.rights.set(right, decision.into());
        self
    }

    /// Declare a right decided by `f(right_name, root, other)`.
    pub fn can_if<N, F>(mut self, right: N, f: F) -> Self
    where
        N: Into<String>,
        F: Fn(&str, &NodeRef<'_>, Option<&Value>) -> Option<bool> + Send + Sync + 'static,
    {
        self.options.rights.set(right, Right::Func(Arc::new(f)));
        self
    }

    pub fn can_read(self, flag: bool) -> Self {
        self.can(READ, flag)
    }

    pub fn can_modify(self, flag: bool) -> Self {
        self.can(MODIFY, flag)
    }

    /// Read right decided from the root alone.
    pub fn can_read_if<F>(self, f: F) -> Self
    where
        F: Fn(&NodeRef<'_>) -> bool + Send + Sync + 'static,
    {
        self.can_if(READ, move |_, root, _| Some(f(root)))
    }

    pub fn can_modify_if<F>(self, f: F) -> Self
    where
        F: Fn(&NodeRef<'_>) -> bool + Send + Sync + 'static,
    {
        self.can_if(MODIFY, move |_, root, _| Some(f(root)))
    }

    /// Lower bound: value for numbers, length for lists.
    pub fn min<V: Into<Value>>(mut self, bound: V) -> Self {
        let bound = bound.into();
        match &mut self.kind {
            SchemaKind::Int { min, .. } => match bound.as_i64() {
                Some(b) => *min = Some(b),
                None => self.invalid.push(format!("int min must be an int, got {bound}")),
            },
            SchemaKind::Float { min, .. } => match bound.as_f64() {
                Some(b) => *min = Some(b),
                None => self.invalid.push(format!("float min must be a number, got {bound}")),
            },
            SchemaKind::List { min, .. } => match bound.as_i64().and_then(|b| usize::try_from(b).ok()) {
                Some(b) => *min = Some(b),
                None => self.invalid.push(format!("list min must be a length, got {bound}")),
            },
            other => {
                let name = other.name().to_string();
                self.invalid.push(format!("min is not supported on {name}"));
            }
        }
        self
    }

    /// Upper bound: value for numbers, length for lists.
    pub fn max<V: Into<Value>>(mut self, bound: V) -> Self {
        let bound = bound.into();
        match &mut self.kind {
            SchemaKind::Int { max, .. } => match bound.as_i64() {
                Some(b) => *max = Some(b),
                None => self.invalid.push(format!("int max must be an int, got {bound}")),
            },
            SchemaKind::Float { max, .. } => match bound.as_f64() {
                Some(b) => *max = Some(b),
                None => self.invalid.push(format!("float max must be a number, got {bound}")),
            },
            SchemaKind::List { max, .. } => match bound.as_i64().and_then(|b| usize::try_from(b).ok()) {
                Some(b) => *max = Some(b),
                None => self.invalid.push(format!("list max must be a length, got {bound}")),
            },
            other => {
                let name = other.name().to_string();
                self.invalid.push(format!("max is not supported on {name}"));
            }
        }
        self
    }

    /// Reject lists holding the same value twice.
    pub fn uniq(mut self) -> Self {
        match &mut self.kind {
            SchemaKind::List { uniq, .. } => *uniq = true,
            other => {
                let name = other.name().to_string();
                self.invalid.push(format!("uniq is not supported on {name}"));
            }
        }
        self
    }

    /// String must match `pattern` from its start.
    pub fn regexp<P: Into<String>>(self, pattern: P) -> Self {
        self.push_pattern(Pattern::Literal(pattern.into()))
    }

    pub fn regexp_with<F>(self, f: F) -> Self
    where
        F: Fn(&Value, &NodeRef<'_>) -> String + Send + Sync + 'static,
    {
        self.push_pattern(Pattern::Func(Arc::new(f)))
    }

    fn push_pattern(mut self, pattern: Pattern) -> Self {
        match &mut self.kind {
            SchemaKind::String { patterns } => patterns.push(pattern),
            other => {
                let name = other.name().to_string();
                self.invalid.push(format!("regexp is not supported on {name}"));
            }
        }
        self
    }

    /// Positional concatenation of two tuple schemas.
    pub(crate) fn concat_tuple(&self, other: &Schema) -> Option<Schema> {
        match (&self.kind, &other.kind) {
            (SchemaKind::Tuple(a), SchemaKind::Tuple(b)) => Some(Schema::tuple(
                a.iter().chain(b.iter()).cloned().collect::<Vec<_>>(),
            )),
            _ => None,
        }
    }
}
