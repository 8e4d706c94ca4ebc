//! Shared cache of described tables.

use crate::introspect::{Introspector, TableSchema};
use dbrecord_core::{Connector, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Table schemas keyed by table name.
///
/// The cache is explicit: create one, wrap it in an `Arc` and hand it to
/// every record that should share it. Entries live until invalidated.
///
/// # Example
///
/// ```
/// use dbrecord_schema::SchemaCache;
///
/// let cache = SchemaCache::new();
/// assert!(cache.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct SchemaCache {
    tables: Mutex<HashMap<String, Arc<TableSchema>>>,
}

impl SchemaCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<TableSchema>>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached schema for `table`, describing it on a miss.
    ///
    /// The lock is not held while the connector runs.
    #[allow(clippy::result_large_err)]
    pub fn get_or_load<C: Connector + ?Sized>(
        &self,
        conn: &C,
        table: &str,
    ) -> Result<Arc<TableSchema>> {
        if let Some(schema) = self.get(table) {
            tracing::trace!(table = table, "schema cache hit");
            return Ok(schema);
        }
        let schema = Arc::new(Introspector::describe(conn, table)?);
        let mut tables = self.lock();
        let entry = tables
            .entry(table.to_string())
            .or_insert_with(|| Arc::clone(&schema));
        Ok(Arc::clone(entry))
    }

    /// The cached schema for `table`, without loading.
    pub fn get(&self, table: &str) -> Option<Arc<TableSchema>> {
        self.lock().get(table).cloned()
    }

    /// Drop the entry for `table`. Returns whether one was present.
    pub fn invalidate(&self, table: &str) -> bool {
        self.lock().remove(table).is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of cached tables.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
