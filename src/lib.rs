//! # Fold Schema
//!
//! Runtime schema validation and constrained mutation for trees of typed
//! values. A [`Schema`] describes every node of a document: its kind, its
//! constraints, derived values, permissions and view tags. A [`Tree`]
//! instantiates a schema and guards every write to it, so a committed value
//! always satisfies its schema.
//!
//! ## Core Components
//!
//! * `schema` - Node templates and their options
//! * `tree` - Live nodes, the check and commit pipeline, events, selection and patching
//! * `value` - Plain values exchanged with a tree, and their arithmetic
//! * `extended` - Extended node types (date-time, bytes, free form maps)
//! * `permissions` - Named rights resolved from a node up to the root
//! * `selector` - Path expressions such as `$.b.l[0:2].i`
//! * `json` - JSON encoding and decoding of trees
//! * `config` - Engine configuration
//! * `error` - Error types and handling
//!
//! ## Example
//!
//! ```ignore
//! use fold_schema::{Schema, Tree, Value};
//!
//! let mut tree = Tree::new(Schema::object([
//!     ("name", Schema::string().required()),
//!     ("age", Schema::int().min(0).max(150)),
//! ]))?;
//! let root = tree.root();
//! tree.set(root, Value::map([("name", Value::from("Ada")), ("age", Value::Int(36))]))?;
//! assert!(tree.set_field(root, "age", -1).is_err());
//! ```

pub mod config;
pub mod error;
pub mod extended;
pub mod json;
pub mod permissions;
pub mod schema;
pub mod selector;
pub mod tree;
pub mod value;

// Re-export main types for convenience
pub use config::EngineConfig;
pub use error::{ErrorKind, SchemaError, SchemaResult};
pub use extended::{BytesCodec, DateTimeCodec, ExtendCodec, FreeMapCodec};
pub use permissions::{PermissionSwitch, Right};
pub use schema::{Schema, SchemaKind};
pub use tree::{
    belongs_to_view, Criteria, EventContext, NodeId, NodeRef, PatchOp, Selection, Tree,
    ViewMembership,
};
pub use value::{BinaryOp, Value};
