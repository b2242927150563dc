//! Engine configuration
//!
//! Settings that apply to a whole node tree: the global permission switch,
//! the separator used when building object paths and the event budget a
//! single drain may spend before a derived-value cycle is reported.

use crate::error::{SchemaError, SchemaResult};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration shared by every node of a tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// When false every permission check passes
    pub permissions_enabled: bool,
    /// Joins object field names in node paths (`$.b.l[0].i`)
    pub path_separator: String,
    /// Events a single drain may process before giving up with a cycle error
    pub max_drain_events: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            permissions_enabled: true,
            path_separator: ".".to_string(),
            max_drain_events: 10_000,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> SchemaResult<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> SchemaResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        info!(
            "Loaded engine configuration from {}",
            path.as_ref().display()
        );
        Ok(config)
    }

    pub fn validate(&self) -> SchemaResult<()> {
        if self.path_separator.is_empty() {
            return Err(SchemaError::structure(
                "path separator cannot be empty",
                "",
            ));
        }
        if self.max_drain_events == 0 {
            return Err(SchemaError::structure(
                "max_drain_events must be greater than zero",
                "",
            ));
        }
        Ok(())
    }
}
