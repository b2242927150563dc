//! Options shared by every schema kind.

use crate::permissions::PermissionTable;
use crate::tree::{EventContext, NodeRef};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

pub type ValueFn = Arc<dyn Fn() -> Value + Send + Sync>;
pub type ConstraintFn = Arc<dyn Fn(&Value, &NodeRef<'_>) -> bool + Send + Sync>;
pub type TransformFn = Arc<dyn Fn(&Value, &NodeRef<'_>) -> Value + Send + Sync>;
pub type ChangeFn = Arc<dyn Fn(&Value, &Value, &NodeRef<'_>) + Send + Sync>;
pub type ComputeFn = Arc<dyn Fn(&NodeRef<'_>) -> Value + Send + Sync>;
pub type PredicateFn = Arc<dyn Fn(&Value, &NodeRef<'_>) -> bool + Send + Sync>;
pub type AllowedFn = Arc<dyn Fn(&Value, &NodeRef<'_>) -> Value + Send + Sync>;
pub type HandlerFn = Arc<dyn Fn(&EventContext<'_>) + Send + Sync>;

/// Fallback value, literal or produced on demand
#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Func(ValueFn),
}

impl DefaultValue {
    pub fn resolve(&self) -> Value {
        match self {
            DefaultValue::Value(v) => v.clone(),
            DefaultValue::Func(f) => f(),
        }
    }
}

/// Allow-list of permitted values
#[derive(Clone)]
pub enum Allowed {
    Values(Vec<Value>),
    /// Must produce a list value
    Func(AllowedFn),
}

/// Existence gate of a field
#[derive(Clone)]
pub enum Exists {
    Flag(bool),
    Func(PredicateFn),
}

#[derive(Clone, Default)]
pub struct SchemaOptions {
    pub description: Option<String>,
    pub default: Option<DefaultValue>,
    pub required: bool,
    pub allowed: Option<Allowed>,
    pub constraints: Vec<ConstraintFn>,
    pub transform: Option<TransformFn>,
    pub on_change: Option<ChangeFn>,
    pub views: Vec<String>,
    pub exists: Option<Exists>,
    pub compute: Option<ComputeFn>,
    pub handlers: Vec<(String, HandlerFn)>,
    pub rights: PermissionTable,
}

impl SchemaOptions {
    pub(crate) fn default_value(&self) -> Value {
        self.default
            .as_ref()
            .map(DefaultValue::resolve)
            .unwrap_or(Value::Null)
    }
}

impl fmt::Debug for SchemaOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaOptions")
            .field("description", &self.description)
            .field("required", &self.required)
            .field("constraints", &self.constraints.len())
            .field("views", &self.views)
            .field("computed", &self.compute.is_some())
            .field("handlers", &self.handlers.len())
            .field("rights", &self.rights)
            .finish()
    }
}
