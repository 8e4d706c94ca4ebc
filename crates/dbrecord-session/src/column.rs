//! Per-column change tracking.
//!
//! A column keeps two values: the one last read from (or written to) storage,
//! and the one last assigned by the caller. Only an assigned column is dirty,
//! and only dirty columns are written.

use crate::graph::RecordId;
use dbrecord_core::Value;

/// One registered column of a record.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    value: Value,
    default_value: Value,
    dirty: bool,
    primary_key: bool,
    record: RecordId,
}

impl Column {
    pub(crate) fn new(name: impl Into<String>, record: RecordId, primary_key: bool) -> Self {
        Self {
            name: name.into(),
            value: Value::Null,
            default_value: Value::Null,
            dirty: false,
            primary_key,
            record,
        }
    }

    /// Column name, unique within its record.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The effective value: the assigned one when dirty, else the known one.
    pub fn value(&self) -> &Value {
        if self.dirty {
            &self.value
        } else {
            &self.default_value
        }
    }

    /// The value last read from or written to storage.
    pub fn default_value(&self) -> &Value {
        &self.default_value
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// The record that owns this column.
    pub fn record(&self) -> RecordId {
        self.record
    }

    /// Assign a value and mark the column dirty.
    pub fn set(&mut self, value: impl Into<Value>) {
        self.value = value.into();
        self.dirty = true;
    }

    /// Drop a pending assignment.
    pub fn discard(&mut self) {
        self.value = Value::Null;
        self.dirty = false;
    }

    /// Store a value read from storage. Pending assignments are kept.
    pub(crate) fn load(&mut self, value: Value) {
        self.default_value = value;
    }

    /// The assigned value reached storage.
    pub(crate) fn mark_written(&mut self) {
        if self.dirty {
            self.default_value = std::mem::take(&mut self.value);
            self.dirty = false;
        }
    }
}
