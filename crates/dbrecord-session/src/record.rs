//! Records addressed by column paths.

use crate::column::Column;
use crate::config::RecordOptions;
use crate::flush;
use crate::graph::{ColumnId, RecordGraph, RecordId};
use dbrecord_core::{Connector, Error, Result, Value};
use dbrecord_query::PathExpr;

/// A row of `table` plus every row reachable from it through left joins.
///
/// Columns are registered by path before they are read or written:
///
/// ```ignore
/// let mut record = DbRecord::existing(&conn, "table0", 1);
/// record.register_column("table1.title")?;
/// let title = record.get("table1.title")?;
/// ```
///
/// Reading a registered column of a record that has a row refreshes stale
/// records first. Writes stay local until [`save`](Self::save).
#[derive(Debug)]
pub struct DbRecord<'c, C: Connector + ?Sized> {
    conn: &'c C,
    graph: RecordGraph,
    root: RecordId,
    options: RecordOptions,
}

impl<'c, C: Connector + ?Sized> DbRecord<'c, C> {
    /// A new row of `table`, inserted on first save.
    pub fn new(conn: &'c C, table: &str) -> Self {
        Self::with_options(conn, table, None, None, RecordOptions::default())
    }

    /// The row of `table` whose primary key is `key`.
    pub fn existing(conn: &'c C, table: &str, key: impl Into<Value>) -> Self {
        Self::with_options(conn, table, None, Some(key.into()), RecordOptions::default())
    }

    /// A record with an explicit primary-key column. A `None` or NULL `key`
    /// makes it new.
    pub fn with_primary_key(
        conn: &'c C,
        table: &str,
        primary_key: &str,
        key: Option<Value>,
    ) -> Self {
        Self::with_options(
            conn,
            table,
            Some(primary_key),
            key,
            RecordOptions::default(),
        )
    }

    /// The general constructor. `primary_key` falls back to the configured
    /// default name.
    pub fn with_options(
        conn: &'c C,
        table: &str,
        primary_key: Option<&str>,
        key: Option<Value>,
        options: RecordOptions,
    ) -> Self {
        let mut graph = RecordGraph::new();
        let pk = primary_key.unwrap_or(&options.defaults.primary_key);
        let root = graph.add_root(table, pk, key);
        Self {
            conn,
            graph,
            root,
            options,
        }
    }

    /// Root table name.
    pub fn table(&self) -> &str {
        self.graph.record(self.root).table()
    }

    /// Name of the root's primary-key column.
    pub fn primary_key(&self) -> &str {
        self.graph.key_name(self.root)
    }

    /// The root's primary-key value; NULL while new.
    pub fn id(&self) -> &Value {
        self.graph.key_value(self.root)
    }

    /// True until the root has a row.
    pub fn is_new(&self) -> bool {
        self.graph.is_new(self.root)
    }

    pub fn is_deleted(&self) -> bool {
        self.graph.record(self.root).is_deleted()
    }

    pub fn graph(&self) -> &RecordGraph {
        &self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut RecordGraph {
        &mut self.graph
    }

    pub fn root(&self) -> RecordId {
        self.root
    }

    pub fn options(&self) -> &RecordOptions {
        &self.options
    }

    pub fn connection(&self) -> &'c C {
        self.conn
    }

    #[allow(clippy::result_large_err)]
    fn parse_column(&self, path: &str) -> Result<PathExpr> {
        PathExpr::parse_column_with(path, &self.options.defaults)
    }

    /// Register the column at `path`, creating joins along the way.
    #[allow(clippy::result_large_err)]
    pub fn register_column(&mut self, path: &str) -> Result<ColumnId> {
        let expr = self.parse_column(path)?;
        self.graph.register_column(self.root, &expr)
    }

    /// Register several column paths.
    #[allow(clippy::result_large_err)]
    pub fn register_columns<I, S>(&mut self, paths: I) -> Result<Vec<ColumnId>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        paths
            .into_iter()
            .map(|p| self.register_column(p.as_ref()))
            .collect()
    }

    /// Register the joined table at `path`.
    #[allow(clippy::result_large_err)]
    pub fn register_table(&mut self, path: &str) -> Result<RecordId> {
        let expr = PathExpr::parse_table_with(path, &self.options.defaults)?;
        self.graph.register_table(self.root, &expr)
    }

    #[allow(clippy::result_large_err)]
    fn resolve(&mut self, path: &str) -> Result<ColumnId> {
        let expr = self.parse_column(path)?;
        if let Some(id) = self.graph.lookup_column(self.root, &expr) {
            return Ok(id);
        }
        if self.options.auto_register {
            return self.graph.register_column(self.root, &expr);
        }
        Err(Error::unknown_column(self.table(), path))
    }

    /// The registered column at `path`, without refreshing anything.
    #[allow(clippy::result_large_err)]
    pub fn column(&self, path: &str) -> Result<&Column> {
        let expr = self.parse_column(path)?;
        self.graph
            .lookup_column(self.root, &expr)
            .map(|id| self.graph.column(id))
            .ok_or_else(|| Error::unknown_column(self.table(), path))
    }

    /// Read the column at `path`.
    ///
    /// When a record on the way to the column has a row and is stale, the
    /// graph below it is fetched first.
    #[allow(clippy::result_large_err)]
    pub fn get(&mut self, path: &str) -> Result<Value> {
        let id = self.resolve(path)?;
        let owner = self.graph.column(id).record();
        if let Some(anchor) = self.graph.stale_anchor(owner) {
            tracing::debug!(path = path, table = self.graph.record(anchor).table(), "lazy refresh");
            flush::fetch(self.conn, &mut self.graph, anchor)?;
        }
        Ok(self.graph.column(id).value().clone())
    }

    /// Assign `value` to the column at `path`. Nothing is written until save.
    #[allow(clippy::result_large_err)]
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        let id = self.resolve(path)?;
        self.graph.assign(id, value);
        Ok(())
    }

    /// Write every change under the root, children first.
    ///
    /// Returns the root's primary key, generated by the connector for a new
    /// root.
    #[tracing::instrument(level = "debug", skip(self), fields(table = self.table()))]
    #[allow(clippy::result_large_err)]
    pub fn save(&mut self) -> Result<Value> {
        flush::save(self.conn, &mut self.graph, self.root)?;
        Ok(self.id().clone())
    }

    /// Read every registered, unassigned column under the root.
    #[tracing::instrument(level = "debug", skip(self), fields(table = self.table()))]
    #[allow(clippy::result_large_err)]
    pub fn fetch(&mut self) -> Result<()> {
        flush::fetch(self.conn, &mut self.graph, self.root)
    }

    /// Delete the root row only.
    #[tracing::instrument(level = "debug", skip(self), fields(table = self.table()))]
    #[allow(clippy::result_large_err)]
    pub fn delete(&mut self) -> Result<()> {
        flush::delete(self.conn, &mut self.graph, self.root)
    }

    /// Delete the root row and every joined row, children first.
    ///
    /// Returns the number of rows deleted.
    #[tracing::instrument(level = "debug", skip(self), fields(table = self.table()))]
    #[allow(clippy::result_large_err)]
    pub fn delete_all(&mut self) -> Result<usize> {
        flush::delete_all(self.conn, &mut self.graph, self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockConnection;

    #[test]
    fn unknown_paths_fail_without_auto_register() {
        let conn = MockConnection::new();
        let mut record = DbRecord::existing(&conn, "table0", 1);
        assert!(record.get("title").unwrap_err().is_unknown_column());
        assert!(record.set("title", "x").unwrap_err().is_unknown_column());
        assert!(record.column("title").unwrap_err().is_unknown_column());
        assert!(record.get("table1[").unwrap_err().is_malformed_path());
        assert!(conn.statements().is_empty());
    }

    #[test]
    fn auto_register_registers_on_access() {
        let conn = MockConnection::new();
        let mut record = DbRecord::with_options(
            &conn,
            "table0",
            None,
            None,
            RecordOptions::new().auto_register(true),
        );
        record.set("table1.title", "Joined").unwrap();
        assert_eq!(record.get("table1.title").unwrap(), Value::Text("Joined".into()));
        assert_eq!(record.graph().record_count(), 2);
    }

    #[test]
    fn scenario_lazy_read_through_link() {
        let conn = MockConnection::new();
        conn.respond(
            r#"SELECT "table1_id" FROM "table0" WHERE "id" = 1"#,
            vec![("table1_id", Value::BigInt(7))],
        );
        conn.respond(
            r#"SELECT "title" FROM "table1" WHERE "id" = 7"#,
            vec![("title", Value::Text("Seven".into()))],
        );

        let mut record = DbRecord::existing(&conn, "table0", 1);
        record.register_column("table1.title").unwrap();
        assert_eq!(record.get("table1.title").unwrap(), Value::Text("Seven".into()));
        assert_eq!(
            conn.take_statements(),
            vec![
                r#"SELECT "table1_id" FROM "table0" WHERE "id" = 1"#.to_string(),
                r#"SELECT "title" FROM "table1" WHERE "id" = 7"#.to_string(),
            ]
        );

        // fresh now: no further statements
        record.get("table1.title").unwrap();
        record.get("table1_id").unwrap();
        assert!(conn.statements().is_empty());
    }

    #[test]
    fn scenario_insert_through_join() {
        let conn = MockConnection::new();
        let mut record = DbRecord::new(&conn, "table0");
        record
            .register_columns(["title", "table1.title"])
            .unwrap();
        record.set("title", "Root").unwrap();
        record.set("table1.title", "Joined").unwrap();

        let id = record.save().unwrap();

        assert_eq!(id, Value::BigInt(2));
        assert!(!record.is_new());
        assert_eq!(
            conn.statements(),
            vec![
                r#"INSERT INTO "table1" ("title") VALUES ('Joined')"#.to_string(),
                r#"INSERT INTO "table0" ("title", "table1_id") VALUES ('Root', 1)"#.to_string(),
            ]
        );
    }

    #[test]
    fn scenario_shared_intermediate_join() {
        let conn = MockConnection::new();
        let mut record = DbRecord::existing(&conn, "table0", 1);
        let a = record.register_column("table1.table2.title").unwrap();
        let b = record
            .register_column("table2[table1.table2_id].title")
            .unwrap();
        let c = record
            .register_column("table3[table2[table1.table2_id].table3_id].title")
            .unwrap();
        assert_eq!(a, b);
        assert_ne!(b, c);
        // table0 -> table1 -> table2 -> table3
        assert_eq!(record.graph().record_count(), 4);
        assert_eq!(record.graph().join_count(), 3);
        let table3 = record.graph().column(c).record();
        let chain: Vec<_> = record
            .graph()
            .chain(table3)
            .into_iter()
            .map(|id| record.graph().record(id).table().to_string())
            .collect();
        assert_eq!(chain, vec!["table0", "table1", "table2", "table3"]);
    }

    #[test]
    fn scenario_update_touches_only_changed_column() {
        let conn = MockConnection::new();
        let mut record = DbRecord::existing(&conn, "table0", 1);
        record
            .register_columns(["title", "created_at", "table1_id"])
            .unwrap();
        record.set("title", "Changed").unwrap();
        record.save().unwrap();
        assert_eq!(
            conn.statements(),
            vec![r#"UPDATE "table0" SET "title" = 'Changed' WHERE "id" = 1"#.to_string()]
        );
    }

    #[test]
    fn save_without_changes_is_silent() {
        let conn = MockConnection::new();
        let mut record = DbRecord::existing(&conn, "table0", 1);
        record.register_columns(["title", "table1.title"]).unwrap();
        assert_eq!(record.save().unwrap(), Value::BigInt(1));
        assert!(conn.statements().is_empty());
    }

    #[test]
    fn primary_key_stays_dirty_after_save() {
        let conn = MockConnection::new();
        let mut record = DbRecord::new(&conn, "table0");
        record.register_column("title").unwrap();
        record.set("title", "x").unwrap();
        record.save().unwrap();
        let pk = record.column("id").unwrap();
        assert!(pk.is_dirty());
        assert_eq!(pk.value(), &Value::BigInt(1));
        assert!(!record.column("title").unwrap().is_dirty());
    }

    #[test]
    fn custom_primary_key_name() {
        let conn = MockConnection::new();
        let mut record =
            DbRecord::with_primary_key(&conn, "tableX", "code", Some(Value::Text("A1".into())));
        record.register_column("name").unwrap();
        record.set("name", "Renamed").unwrap();
        record.save().unwrap();
        assert_eq!(record.primary_key(), "code");
        assert_eq!(
            conn.statements(),
            vec![r#"UPDATE "tableX" SET "name" = 'Renamed' WHERE "code" = 'A1'"#.to_string()]
        );
    }

    #[test]
    fn deleted_record_rejects_storage_calls() {
        let conn = MockConnection::new();
        let mut record = DbRecord::existing(&conn, "table0", 1);
        record.delete().unwrap();
        assert!(record.is_deleted());
        assert!(record.delete().unwrap_err().is_not_saved());
        assert!(record.fetch().unwrap_err().is_not_saved());
        assert!(record.save().unwrap_err().is_not_saved());
        assert_eq!(
            conn.statements(),
            vec![r#"DELETE FROM "table0" WHERE "id" = 1"#.to_string()]
        );
    }

    #[test]
    fn relinking_reads_and_writes_the_new_row() {
        let conn = MockConnection::new();
        conn.respond(
            r#"SELECT "table1_id" FROM "table0" WHERE "id" = 1"#,
            vec![("table1_id", Value::BigInt(7))],
        );
        conn.respond(
            r#"SELECT "title" FROM "table1" WHERE "id" = 7"#,
            vec![("title", Value::Text("Seven".into()))],
        );
        conn.respond(
            r#"SELECT "title" FROM "table1" WHERE "id" = 9"#,
            vec![("title", Value::Text("Nine".into()))],
        );
        let mut record = DbRecord::existing(&conn, "table0", 1);
        record.register_column("table1.title").unwrap();
        assert_eq!(record.get("table1.title").unwrap(), Value::Text("Seven".into()));
        conn.take_statements();

        record.set("table1_id", 9).unwrap();
        assert_eq!(record.get("table1.title").unwrap(), Value::Text("Nine".into()));
        record.save().unwrap();

        assert_eq!(
            conn.statements(),
            vec![
                r#"SELECT "title" FROM "table1" WHERE "id" = 9"#.to_string(),
                r#"UPDATE "table0" SET "table1_id" = 9 WHERE "id" = 1"#.to_string(),
            ]
        );
        assert_eq!(record.column("table1_id").unwrap().value(), &Value::BigInt(9));
    }

    #[test]
    fn editing_joined_column_without_reading_updates_linked_row() {
        let conn = MockConnection::new();
        conn.respond(
            r#"SELECT "table1_id" FROM "table0" WHERE "id" = 5"#,
            vec![("table1_id", Value::BigInt(7))],
        );
        let mut record = DbRecord::existing(&conn, "table0", 5);
        record.register_column("table1.title").unwrap();
        record.set("table1.title", "Renamed").unwrap();
        record.save().unwrap();
        assert_eq!(
            conn.statements(),
            vec![
                r#"SELECT "table1_id" FROM "table0" WHERE "id" = 5"#.to_string(),
                r#"UPDATE "table1" SET "title" = 'Renamed' WHERE "id" = 7"#.to_string(),
            ]
        );
    }

    #[test]
    fn registering_after_fetch_triggers_refresh() {
        let conn = MockConnection::new();
        conn.respond(
            r#"SELECT "title" FROM "table0" WHERE "id" = 1"#,
            vec![("title", Value::Text("T".into()))],
        );
        conn.respond(
            r#"SELECT "title", "created_at" FROM "table0" WHERE "id" = 1"#,
            vec![
                ("title", Value::Text("T".into())),
                ("created_at", Value::Text("now".into())),
            ],
        );
        let mut record = DbRecord::existing(&conn, "table0", 1);
        record.register_column("title").unwrap();
        record.fetch().unwrap();
        record.register_column("created_at").unwrap();
        assert_eq!(record.get("created_at").unwrap(), Value::Text("now".into()));
        assert_eq!(conn.statements().len(), 2);
    }
}
