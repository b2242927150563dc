//! Extended node types
//!
//! An extend node stores an opaque value behind the usual node contract.
//! The codec decides which values it accepts and how they cross the JSON
//! boundary; string input to such a node is decoded before checking.

pub mod bytes;
pub mod datetime;
pub mod free_map;

pub use bytes::BytesCodec;
pub use datetime::DateTimeCodec;
pub use free_map::FreeMapCodec;

use crate::error::SchemaResult;
use crate::schema::Schema;
use crate::value::Value;
use std::fmt;

/// Encode/decode hooks of an extended type
pub trait ExtendCodec: fmt::Debug + Send + Sync {
    /// Name used in error messages and for same-kind comparisons
    fn type_name(&self) -> &str;

    /// Whether an already decoded value belongs to this type
    fn accepts(&self, value: &Value) -> bool;

    /// JSON representation of a stored value
    fn encode(&self, value: &Value) -> SchemaResult<serde_json::Value>;

    /// Parse the textual form. The error text is kept as the cause.
    fn decode(&self, raw: &str) -> Result<Value, String>;
}

impl Schema {
    pub fn datetime() -> Self {
        Schema::extend(DateTimeCodec)
    }

    pub fn bytes() -> Self {
        Schema::extend(BytesCodec)
    }

    pub fn free_map() -> Self {
        Schema::extend(FreeMapCodec)
    }
}
