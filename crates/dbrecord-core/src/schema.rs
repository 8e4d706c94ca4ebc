//! Column metadata reported by connectors.

use crate::value::Value;
use serde::{Deserialize, Serialize};

/// One column as described by the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Declared default, `Value::Null` when there is none
    #[serde(default)]
    pub default_value: Value,
    #[serde(default)]
    pub primary_key: bool,
}

impl ColumnDescriptor {
    /// A non-key column without a default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_value: Value::Null,
            primary_key: false,
        }
    }

    /// Set the declared default.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = value.into();
        self
    }

    /// Mark the column as the primary key.
    #[must_use]
    pub fn primary_key(mut self, primary_key: bool) -> Self {
        self.primary_key = primary_key;
        self
    }
}
