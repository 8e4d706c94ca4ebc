//! Records that discover their columns from the database.

use crate::config::RecordOptions;
use crate::record::DbRecord;
use dbrecord_core::{Connector, Result, Value};
use dbrecord_schema::{SchemaCache, TableSchema};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// A [`DbRecord`] with every column of its table registered up front.
///
/// The table is described once per [`SchemaCache`]. Declared defaults seed
/// the columns, the described primary key replaces the default key name, and
/// unknown paths passed to `get`/`set` are registered instead of rejected.
#[derive(Debug)]
pub struct ActiveRecord<'c, C: Connector + ?Sized> {
    record: DbRecord<'c, C>,
    schema: Arc<TableSchema>,
}

impl<'c, C: Connector + ?Sized> ActiveRecord<'c, C> {
    /// A new row of `table`.
    #[allow(clippy::result_large_err)]
    pub fn new(conn: &'c C, cache: &SchemaCache, table: &str) -> Result<Self> {
        Self::with_options(conn, cache, table, None, RecordOptions::default())
    }

    /// The row of `table` whose primary key is `key`.
    #[allow(clippy::result_large_err)]
    pub fn existing(
        conn: &'c C,
        cache: &SchemaCache,
        table: &str,
        key: impl Into<Value>,
    ) -> Result<Self> {
        Self::with_options(conn, cache, table, Some(key.into()), RecordOptions::default())
    }

    /// The general constructor. `auto_register` is always switched on.
    #[tracing::instrument(level = "debug", skip(conn, cache, options))]
    #[allow(clippy::result_large_err)]
    pub fn with_options(
        conn: &'c C,
        cache: &SchemaCache,
        table: &str,
        key: Option<Value>,
        options: RecordOptions,
    ) -> Result<Self> {
        let schema = cache.get_or_load(conn, table)?;
        let primary_key = schema
            .primary_key()
            .map_or_else(|| options.defaults.primary_key.clone(), |c| c.name.clone());
        let options = options.auto_register(true);
        let mut record =
            DbRecord::with_options(conn, table, Some(&primary_key), key, options);

        let root = record.root();
        let graph = record.graph_mut();
        for described in schema.columns.iter().filter(|c| c.name != primary_key) {
            let column = graph.ensure_column(root, &described.name);
            graph.column_mut(column).load(described.default_value.clone());
        }
        tracing::debug!(
            table = table,
            primary_key = %primary_key,
            columns = schema.columns.len(),
            "active record ready"
        );
        Ok(Self { record, schema })
    }

    /// The described table.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Give up discovery and keep the plain record.
    pub fn into_inner(self) -> DbRecord<'c, C> {
        self.record
    }
}

impl<'c, C: Connector + ?Sized> Deref for ActiveRecord<'c, C> {
    type Target = DbRecord<'c, C>;

    fn deref(&self) -> &Self::Target {
        &self.record
    }
}

impl<'c, C: Connector + ?Sized> DerefMut for ActiveRecord<'c, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.record
    }
}
