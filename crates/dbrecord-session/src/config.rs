//! Record configuration.

use dbrecord_query::PathDefaults;
use serde::Deserialize;

/// Options carried by a [`DbRecord`](crate::DbRecord).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RecordOptions {
    /// Naming conventions for omitted join keys and links.
    pub defaults: PathDefaults,
    /// Register unknown paths on `get`/`set` instead of failing.
    pub auto_register: bool,
}

impl RecordOptions {
    /// Create options with the default naming conventions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the naming conventions.
    pub fn defaults(mut self, defaults: PathDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Set the default primary-key name.
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.defaults.primary_key = name.into();
        self
    }

    /// Set the suffix that turns a table name into its linking column.
    pub fn link_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.defaults.link_suffix = suffix.into();
        self
    }

    /// Enable or disable registration on access.
    pub fn auto_register(mut self, enabled: bool) -> Self {
        self.auto_register = enabled;
        self
    }
}
