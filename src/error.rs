//! Error types for schema validation and tree mutation
//!
//! Every failure raised by a node carries a human readable message, the path of
//! the offending node (`$.b.l[0].i`) and a small map of structured context
//! (`value`, `min`, `expected`, ...) so callers can surface it directly.

use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Kind of a [`SchemaError`], for matching without destructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TypeMismatch,
    Constraint,
    Required,
    Structure,
    Permission,
    ReadOnly,
    NotFound,
    Serialization,
    Syntax,
    CyclicDependency,
}

/// Message, node path and keyword context shared by every error variant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErrorInfo {
    pub message: String,
    pub path: String,
    pub context: BTreeMap<String, Value>,
}

impl ErrorInfo {
    pub fn new<M: Into<String>, P: Into<String>>(message: M, path: P) -> Self {
        Self {
            message: message.into(),
            path: path.into(),
            context: BTreeMap::new(),
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} at {}", self.message, self.path)
        }
    }
}

/// Unified error type for schema checks, commits, selection and patching.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// Wrong scalar or container kind
    #[error("Type mismatch: {0}")]
    TypeMismatch(ErrorInfo),

    /// Range, regexp, uniqueness, allow-list or custom predicate failure
    #[error("Constraint violation: {0}")]
    Constraint(ErrorInfo),

    /// Empty value where one is required
    #[error("Required value missing: {0}")]
    Required(ErrorInfo),

    /// Unknown content, wrong arity or an invalid schema definition
    #[error("Structural violation: {0}")]
    Structure(ErrorInfo),

    /// Read access denied
    #[error("Permission denied: {0}")]
    Permission(ErrorInfo),

    /// Modification denied, or a direct write to a computed value
    #[error("Read-only value: {0}")]
    ReadOnly(ErrorInfo),

    /// Unknown or hidden field, missing patch target
    #[error("Not found: {0}")]
    NotFound(ErrorInfo),

    /// Decode failure on an extended type, with the original cause
    #[error("Serialization error: {info} (caused by: {cause})")]
    Serialization { info: ErrorInfo, cause: String },

    /// Schema-authoring mistake: invalid operator, malformed match expression
    #[error("Syntax error: {0}")]
    Syntax(ErrorInfo),

    /// Derived values kept re-triggering each other
    #[error("Cyclic dependency: {0}")]
    CyclicDependency(ErrorInfo),
}

impl SchemaError {
    pub fn type_mismatch<M: Into<String>, P: Into<String>>(message: M, path: P) -> Self {
        Self::TypeMismatch(ErrorInfo::new(message, path))
    }

    pub fn constraint<M: Into<String>, P: Into<String>>(message: M, path: P) -> Self {
        Self::Constraint(ErrorInfo::new(message, path))
    }

    pub fn required<M: Into<String>, P: Into<String>>(message: M, path: P) -> Self {
        Self::Required(ErrorInfo::new(message, path))
    }

    pub fn structure<M: Into<String>, P: Into<String>>(message: M, path: P) -> Self {
        Self::Structure(ErrorInfo::new(message, path))
    }

    pub fn permission<M: Into<String>, P: Into<String>>(message: M, path: P) -> Self {
        Self::Permission(ErrorInfo::new(message, path))
    }

    pub fn read_only<M: Into<String>, P: Into<String>>(message: M, path: P) -> Self {
        Self::ReadOnly(ErrorInfo::new(message, path))
    }

    pub fn not_found<M: Into<String>, P: Into<String>>(message: M, path: P) -> Self {
        Self::NotFound(ErrorInfo::new(message, path))
    }

    pub fn serialization<M, P, C>(message: M, path: P, cause: C) -> Self
    where
        M: Into<String>,
        P: Into<String>,
        C: fmt::Display,
    {
        Self::Serialization {
            info: ErrorInfo::new(message, path),
            cause: cause.to_string(),
        }
    }

    pub fn syntax<M: Into<String>, P: Into<String>>(message: M, path: P) -> Self {
        Self::Syntax(ErrorInfo::new(message, path))
    }

    pub fn cyclic<M: Into<String>, P: Into<String>>(message: M, path: P) -> Self {
        Self::CyclicDependency(ErrorInfo::new(message, path))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TypeMismatch(_) => ErrorKind::TypeMismatch,
            Self::Constraint(_) => ErrorKind::Constraint,
            Self::Required(_) => ErrorKind::Required,
            Self::Structure(_) => ErrorKind::Structure,
            Self::Permission(_) => ErrorKind::Permission,
            Self::ReadOnly(_) => ErrorKind::ReadOnly,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Serialization { .. } => ErrorKind::Serialization,
            Self::Syntax(_) => ErrorKind::Syntax,
            Self::CyclicDependency(_) => ErrorKind::CyclicDependency,
        }
    }

    pub fn info(&self) -> &ErrorInfo {
        match self {
            Self::TypeMismatch(info)
            | Self::Constraint(info)
            | Self::Required(info)
            | Self::Structure(info)
            | Self::Permission(info)
            | Self::ReadOnly(info)
            | Self::NotFound(info)
            | Self::Syntax(info)
            | Self::CyclicDependency(info) => info,
            Self::Serialization { info, .. } => info,
        }
    }

    fn info_mut(&mut self) -> &mut ErrorInfo {
        match self {
            Self::TypeMismatch(info)
            | Self::Constraint(info)
            | Self::Required(info)
            | Self::Structure(info)
            | Self::Permission(info)
            | Self::ReadOnly(info)
            | Self::NotFound(info)
            | Self::Syntax(info)
            | Self::CyclicDependency(info) => info,
            Self::Serialization { info, .. } => info,
        }
    }

    pub fn message(&self) -> &str {
        &self.info().message
    }

    pub fn path(&self) -> &str {
        &self.info().path
    }

    pub fn context(&self, key: &str) -> Option<&Value> {
        self.info().context.get(key)
    }

    /// Attach a keyword to the error context.
    pub fn with<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.info_mut().context.insert(key.into(), value.into());
        self
    }

    /// Fill in the node path when the error was raised without one.
    pub fn at<P: Into<String>>(mut self, path: P) -> Self {
        let info = self.info_mut();
        if info.path.is_empty() {
            info.path = path.into();
        }
        self
    }
}

impl From<serde_json::Error> for SchemaError {
    fn from(error: serde_json::Error) -> Self {
        SchemaError::serialization("JSON encoding failed", "", error)
    }
}

impl From<toml::de::Error> for SchemaError {
    fn from(error: toml::de::Error) -> Self {
        SchemaError::serialization("TOML parsing failed", "", error)
    }
}

impl From<std::io::Error> for SchemaError {
    fn from(error: std::io::Error) -> Self {
        SchemaError::serialization("IO failure", "", error)
    }
}

/// Result type alias for operations that can fail with a [`SchemaError`]
pub type SchemaResult<T> = Result<T, SchemaError>;
