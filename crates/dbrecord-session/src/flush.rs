//! Save, fetch and delete ordering across a record graph.
//!
//! - SAVE child-first, so a parent's linking column can carry the key the
//!   child was just given
//! - FETCH parent-first, so a child learns its key from the parent's row
//! - DELETE child-first
//!
//! Writes are planned as [`PendingWrite`] values before they run. Nothing
//! wraps a cascade in a transaction: a failure part-way leaves the statements
//! already executed in place, and the error is returned unchanged.

use crate::graph::{ColumnId, RecordGraph, RecordId};
use dbrecord_core::{Connector, Error, QueryError, QueryErrorKind, Quoting, Result, Value};
use dbrecord_query::{DeleteBuilder, InsertBuilder, SelectBuilder, UpdateBuilder};

/// A planned statement against one record.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingWrite {
    /// Insert a new row.
    Insert {
        record: RecordId,
        table: String,
        /// Columns written, in registration order.
        columns: Vec<ColumnId>,
        values: Vec<(String, Value)>,
    },
    /// Update dirty columns of an existing row.
    Update {
        record: RecordId,
        table: String,
        primary_key: String,
        key_value: Value,
        columns: Vec<ColumnId>,
        values: Vec<(String, Value)>,
    },
    /// Delete an existing row.
    Delete {
        record: RecordId,
        table: String,
        primary_key: String,
        key_value: Value,
    },
}

impl PendingWrite {
    /// The record this write belongs to.
    pub fn record(&self) -> RecordId {
        match self {
            PendingWrite::Insert { record, .. }
            | PendingWrite::Update { record, .. }
            | PendingWrite::Delete { record, .. } => *record,
        }
    }

    /// Get the table name.
    pub fn table(&self) -> &str {
        match self {
            PendingWrite::Insert { table, .. }
            | PendingWrite::Update { table, .. }
            | PendingWrite::Delete { table, .. } => table,
        }
    }

    /// Render the statement.
    #[allow(clippy::result_large_err)]
    pub fn to_sql<Q: Quoting + ?Sized>(&self, q: &Q) -> Result<(String, Vec<Value>)> {
        match self {
            PendingWrite::Insert { table, values, .. } => InsertBuilder::new(table.as_str())
                .values(values.iter().map(|(c, v)| (c.as_str(), v.clone())))
                .build_with(q),
            PendingWrite::Update {
                table,
                primary_key,
                key_value,
                values,
                ..
            } => UpdateBuilder::new(table.as_str(), primary_key.as_str(), key_value.clone())
                .set_all(values.iter().map(|(c, v)| (c.as_str(), v.clone())))
                .build_with(q),
            PendingWrite::Delete {
                table,
                primary_key,
                key_value,
                ..
            } => DeleteBuilder::new(table.as_str(), primary_key.as_str(), key_value.clone())
                .build_with(q),
        }
    }
}

/// Plan the write that saving `record` needs, if any.
///
/// `direct` is false while cascading from a parent: a new record with nothing
/// assigned is then left alone instead of inserted empty.
pub fn plan_write(graph: &RecordGraph, record: RecordId, direct: bool) -> Option<PendingWrite> {
    let node = graph.record(record);
    let (columns, values): (Vec<ColumnId>, Vec<(String, Value)>) = node
        .columns()
        .iter()
        .copied()
        .filter(|c| {
            let column = graph.column(*c);
            column.is_dirty() && !column.is_primary_key()
        })
        .map(|c| {
            let column = graph.column(c);
            (c, (column.name().to_string(), column.value().clone()))
        })
        .unzip();

    if graph.is_new(record) {
        if columns.is_empty() && !direct {
            return None;
        }
        Some(PendingWrite::Insert {
            record,
            table: node.table().to_string(),
            columns,
            values,
        })
    } else if columns.is_empty() {
        None
    } else {
        Some(PendingWrite::Update {
            record,
            table: node.table().to_string(),
            primary_key: graph.key_name(record).to_string(),
            key_value: graph.key_value(record).clone(),
            columns,
            values,
        })
    }
}

/// Plan one DELETE per bound record under `root`, children first.
pub fn plan_delete_all(graph: &RecordGraph, root: RecordId) -> Vec<PendingWrite> {
    graph
        .post_order(root)
        .into_iter()
        .filter(|id| graph.is_bound(*id))
        .map(|id| delete_of(graph, id))
        .collect()
}

fn delete_of(graph: &RecordGraph, record: RecordId) -> PendingWrite {
    PendingWrite::Delete {
        record,
        table: graph.record(record).table().to_string(),
        primary_key: graph.key_name(record).to_string(),
        key_value: graph.key_value(record).clone(),
    }
}

/// Run a planned write and apply its outcome to the graph.
#[allow(clippy::result_large_err)]
pub fn execute<C: Connector + ?Sized>(
    conn: &C,
    graph: &mut RecordGraph,
    write: &PendingWrite,
) -> Result<()> {
    let (sql, params) = write.to_sql(conn)?;
    tracing::debug!(table = write.table(), sql = %sql, "executing statement");
    conn.execute(&sql, &params)?;

    match write {
        PendingWrite::Insert {
            record, columns, ..
        } => {
            let id = conn.last_insert_id()?;
            if id.is_null() {
                return Err(Error::Query(QueryError {
                    kind: QueryErrorKind::Database,
                    sql: Some(sql),
                    message: "connector reported no generated identifier".to_string(),
                    source: None,
                }));
            }
            for column in columns {
                graph.column_mut(*column).mark_written();
            }
            let pk = graph.record(*record).primary_key();
            graph.column_mut(pk).set(id);
            graph.record_mut(*record).set_updated(false);
        }
        PendingWrite::Update {
            record, columns, ..
        } => {
            for column in columns {
                graph.column_mut(*column).mark_written();
            }
            graph.record_mut(*record).set_updated(false);
        }
        PendingWrite::Delete { record, .. } => {
            graph.record_mut(*record).mark_deleted();
        }
    }
    Ok(())
}

fn not_saved(graph: &RecordGraph, record: RecordId, action: &str) -> Error {
    let node = graph.record(record);
    let state = if node.is_deleted() {
        "was deleted"
    } else {
        "has not been saved"
    };
    Error::not_saved(
        node.table(),
        format!("cannot {action} '{}': record {state}", node.table()),
    )
}

/// Save `root` and everything below it.
#[tracing::instrument(level = "debug", skip(conn, graph))]
#[allow(clippy::result_large_err)]
pub fn save<C: Connector + ?Sized>(
    conn: &C,
    graph: &mut RecordGraph,
    root: RecordId,
) -> Result<()> {
    if graph.record(root).is_deleted() {
        return Err(not_saved(graph, root, "save"));
    }
    resolve_links(conn, graph, root)?;
    save_node(conn, graph, root, true)
}

/// Give new children behind existing rows the key those rows already hold.
///
/// A stale record may link to a row it never read. Only unread links to
/// children with pending changes are selected, and the record stays stale.
#[allow(clippy::result_large_err)]
fn resolve_links<C: Connector + ?Sized>(
    conn: &C,
    graph: &mut RecordGraph,
    record: RecordId,
) -> Result<()> {
    let joins = graph.record(record).joins().to_vec();
    if graph.is_bound(record) && !graph.record(record).is_updated() {
        let mut unread: Vec<ColumnId> = Vec::new();
        for join in &joins {
            let edge = graph.join(*join);
            let child = edge.child();
            if graph.is_new(child)
                && !graph.record(child).is_deleted()
                && !graph.column(edge.link()).is_dirty()
                && has_changes(graph, child)
                && !unread.contains(&edge.link())
            {
                unread.push(edge.link());
            }
        }
        if !unread.is_empty() {
            let (sql, params) = SelectBuilder::new(
                graph.record(record).table(),
                graph.key_name(record),
                graph.key_value(record).clone(),
            )
            .columns(unread.iter().map(|c| graph.column(*c).name()))
            .build_with(conn)?;
            tracing::debug!(table = graph.record(record).table(), sql = %sql, "reading links");
            if let Some(row) = conn.query_one(&sql, &params)? {
                for (index, column) in unread.iter().enumerate() {
                    if let Some(value) = row.get(index) {
                        graph.column_mut(*column).load(value.clone());
                    }
                }
            }
        }
    }

    for join in joins {
        let (child, link) = {
            let edge = graph.join(join);
            (edge.child(), edge.link())
        };
        if graph.record(child).is_deleted() {
            continue;
        }
        seed_child(graph, child, link);
        resolve_links(conn, graph, child)?;
    }
    Ok(())
}

/// True when saving `record` would write something below or at it.
fn has_changes(graph: &RecordGraph, record: RecordId) -> bool {
    graph.pre_order(record).into_iter().any(|id| {
        !graph.record(id).is_deleted()
            && graph.record(id).columns().iter().any(|c| {
                let column = graph.column(*c);
                column.is_dirty() && !column.is_primary_key()
            })
    })
}

/// A new child takes the key its link holds, when there is one.
fn seed_child(graph: &mut RecordGraph, child: RecordId, link: ColumnId) {
    if !graph.is_new(child) {
        return;
    }
    let key = graph.column(link).value().clone();
    if !key.is_null() {
        let pk = graph.record(child).primary_key();
        graph.column_mut(pk).set(key);
    }
}

#[allow(clippy::result_large_err)]
fn save_node<C: Connector + ?Sized>(
    conn: &C,
    graph: &mut RecordGraph,
    record: RecordId,
    direct: bool,
) -> Result<()> {
    let joins = graph.record(record).joins().to_vec();
    for join in joins {
        let (child, link) = {
            let edge = graph.join(join);
            (edge.child(), edge.link())
        };
        if graph.record(child).is_deleted() {
            continue;
        }
        let was_new = graph.is_new(child);
        save_node(conn, graph, child, false)?;
        // An assigned link is kept unless the child row was just created.
        if !graph.is_new(child) && (was_new || !graph.column(link).is_dirty()) {
            let key = graph.key_value(child).clone();
            if graph.column(link).value() != &key {
                tracing::trace!(
                    table = graph.record(record).table(),
                    link = graph.column(link).name(),
                    "link follows saved child"
                );
                graph.column_mut(link).set(key);
            }
        }
    }

    match plan_write(graph, record, direct) {
        Some(write) => execute(conn, graph, &write),
        None => {
            graph.record_mut(record).set_updated(false);
            Ok(())
        }
    }
}

/// Fetch `root` and every bound record below it.
#[tracing::instrument(level = "debug", skip(conn, graph))]
#[allow(clippy::result_large_err)]
pub fn fetch<C: Connector + ?Sized>(
    conn: &C,
    graph: &mut RecordGraph,
    root: RecordId,
) -> Result<()> {
    if !graph.is_bound(root) {
        return Err(not_saved(graph, root, "fetch"));
    }
    fetch_node(conn, graph, root)
}

#[allow(clippy::result_large_err)]
fn fetch_node<C: Connector + ?Sized>(
    conn: &C,
    graph: &mut RecordGraph,
    record: RecordId,
) -> Result<()> {
    let clean: Vec<ColumnId> = graph
        .record(record)
        .columns()
        .iter()
        .copied()
        .filter(|c| !graph.column(*c).is_dirty())
        .collect();

    if !clean.is_empty() {
        let (sql, params) = SelectBuilder::new(
            graph.record(record).table(),
            graph.key_name(record),
            graph.key_value(record).clone(),
        )
        .columns(clean.iter().map(|c| graph.column(*c).name()))
        .build_with(conn)?;
        tracing::debug!(table = graph.record(record).table(), sql = %sql, "fetching record");

        match conn.query_one(&sql, &params)? {
            Some(row) => {
                for (index, column) in clean.iter().enumerate() {
                    if let Some(value) = row.get(index) {
                        graph.column_mut(*column).load(value.clone());
                    }
                }
            }
            None => tracing::warn!(
                table = graph.record(record).table(),
                key = %graph.key_value(record),
                "no row found"
            ),
        }
    }
    graph.record_mut(record).set_updated(true);

    let joins = graph.record(record).joins().to_vec();
    for join in joins {
        let (child, link) = {
            let edge = graph.join(join);
            (edge.child(), edge.link())
        };
        if graph.record(child).is_deleted() {
            continue;
        }
        seed_child(graph, child, link);
        if graph.is_bound(child) {
            fetch_node(conn, graph, child)?;
        }
    }
    Ok(())
}

/// Delete the single row of `record`.
#[tracing::instrument(level = "debug", skip(conn, graph))]
#[allow(clippy::result_large_err)]
pub fn delete<C: Connector + ?Sized>(
    conn: &C,
    graph: &mut RecordGraph,
    record: RecordId,
) -> Result<()> {
    if !graph.is_bound(record) {
        return Err(not_saved(graph, record, "delete"));
    }
    let write = delete_of(graph, record);
    execute(conn, graph, &write)
}

/// Delete `root` and every bound record below it, children first.
///
/// Returns the number of DELETE statements issued.
#[tracing::instrument(level = "debug", skip(conn, graph))]
#[allow(clippy::result_large_err)]
pub fn delete_all<C: Connector + ?Sized>(
    conn: &C,
    graph: &mut RecordGraph,
    root: RecordId,
) -> Result<usize> {
    if !graph.is_bound(root) {
        return Err(not_saved(graph, root, "delete"));
    }
    let stale = graph
        .pre_order(root)
        .into_iter()
        .any(|id| graph.is_bound(id) && !graph.record(id).is_updated());
    if stale {
        fetch_node(conn, graph, root)?;
    }

    let writes = plan_delete_all(graph, root);
    for write in &writes {
        execute(conn, graph, write)?;
    }
    Ok(writes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockConnection;
    use dbrecord_query::PathExpr;

    fn register(graph: &mut RecordGraph, root: RecordId, path: &str) -> ColumnId {
        graph
            .register_column(root, &PathExpr::parse_column(path).unwrap())
            .unwrap()
    }

    #[test]
    fn plan_skips_clean_existing_record() {
        let mut graph = RecordGraph::new();
        let root = graph.add_root("table0", "id", Some(Value::BigInt(1)));
        register(&mut graph, root, "title");
        assert_eq!(plan_write(&graph, root, true), None);
    }

    #[test]
    fn plan_update_lists_only_dirty_columns() {
        let mut graph = RecordGraph::new();
        let root = graph.add_root("table0", "id", Some(Value::BigInt(1)));
        register(&mut graph, root, "created_at");
        let title = register(&mut graph, root, "title");
        graph.column_mut(title).set("Title");

        let write = plan_write(&graph, root, true).unwrap();
        let (sql, params) = write.to_sql(&dbrecord_core::Dialect::Sqlite).unwrap();
        assert_eq!(
            sql,
            r#"UPDATE "table0" SET "title" = 'Title' WHERE "id" = 1"#
        );
        assert!(params.is_empty());
    }

    #[test]
    fn cascade_skips_untouched_new_child() {
        let mut graph = RecordGraph::new();
        let root = graph.add_root("table0", "id", None);
        let title = register(&mut graph, root, "table1.title");
        let child = graph.column(title).record();
        assert_eq!(plan_write(&graph, child, false), None);
        assert!(matches!(
            plan_write(&graph, child, true),
            Some(PendingWrite::Insert { .. })
        ));
    }

    #[test]
    fn insert_then_link_then_parent() {
        let conn = MockConnection::new();
        let mut graph = RecordGraph::new();
        let root = graph.add_root("table0", "id", None);
        let own = register(&mut graph, root, "title");
        let joined = register(&mut graph, root, "table1.title");
        graph.column_mut(own).set("Title");
        graph.column_mut(joined).set("Joined");

        save(&conn, &mut graph, root).unwrap();

        assert_eq!(
            conn.statements(),
            vec![
                r#"INSERT INTO "table1" ("title") VALUES ('Joined')"#.to_string(),
                r#"INSERT INTO "table0" ("title", "table1_id") VALUES ('Title', 1)"#.to_string(),
            ]
        );
        assert_eq!(graph.key_value(root), &Value::BigInt(2));
        assert!(graph.column(graph.record(root).primary_key()).is_dirty());
        assert!(!graph.column(own).is_dirty());
        assert_eq!(graph.column(own).default_value(), &Value::Text("Title".into()));
        assert!(!graph.record(root).is_updated());
    }

    #[test]
    fn direct_save_of_empty_new_record_inserts_defaults() {
        let conn = MockConnection::new();
        let mut graph = RecordGraph::new();
        let root = graph.add_root("table0", "id", None);
        save(&conn, &mut graph, root).unwrap();
        assert_eq!(
            conn.statements(),
            vec![r#"INSERT INTO "table0" DEFAULT VALUES"#.to_string()]
        );
        assert!(!graph.is_new(root));
    }

    #[test]
    fn fetch_requires_existing_record() {
        let conn = MockConnection::new();
        let mut graph = RecordGraph::new();
        let root = graph.add_root("table0", "id", None);
        assert!(fetch(&conn, &mut graph, root).unwrap_err().is_not_saved());
        assert!(conn.statements().is_empty());
    }

    #[test]
    fn fetch_never_touches_dirty_columns() {
        let conn = MockConnection::new();
        conn.respond(
            r#"SELECT "created_at" FROM "table0" WHERE "id" = 1"#,
            vec![("created_at", Value::Text("2024-01-01".into()))],
        );
        let mut graph = RecordGraph::new();
        let root = graph.add_root("table0", "id", Some(Value::BigInt(1)));
        let title = register(&mut graph, root, "title");
        let created = register(&mut graph, root, "created_at");
        graph.column_mut(title).set("Local");

        fetch(&conn, &mut graph, root).unwrap();

        assert_eq!(graph.column(title).value(), &Value::Text("Local".into()));
        assert_eq!(
            graph.column(created).value(),
            &Value::Text("2024-01-01".into())
        );
        assert!(graph.record(root).is_updated());
    }

    #[test]
    fn fetch_without_clean_columns_issues_no_select() {
        let conn = MockConnection::new();
        let mut graph = RecordGraph::new();
        let root = graph.add_root("table0", "id", Some(Value::BigInt(1)));
        fetch(&conn, &mut graph, root).unwrap();
        assert!(conn.statements().is_empty());
        assert!(graph.record(root).is_updated());
    }

    #[test]
    fn missing_row_still_marks_updated() {
        let conn = MockConnection::new();
        let mut graph = RecordGraph::new();
        let root = graph.add_root("table0", "id", Some(Value::BigInt(99)));
        let title = register(&mut graph, root, "title");
        fetch(&conn, &mut graph, root).unwrap();
        assert_eq!(graph.column(title).value(), &Value::Null);
        assert!(graph.record(root).is_updated());
    }

    #[test]
    fn delete_all_goes_children_first() {
        let conn = MockConnection::new();
        conn.respond(
            r#"SELECT "table1_id", "table3_id" FROM "table0" WHERE "id" = 1"#,
            vec![("table1_id", Value::BigInt(7)), ("table3_id", Value::Null)],
        );
        conn.respond(
            r#"SELECT "table2_id" FROM "table1" WHERE "id" = 7"#,
            vec![("table2_id", Value::BigInt(8))],
        );
        let mut graph = RecordGraph::new();
        let root = graph.add_root("table0", "id", Some(Value::BigInt(1)));
        register(&mut graph, root, "table1.table2.id");
        register(&mut graph, root, "table3.title");

        let deleted = delete_all(&conn, &mut graph, root).unwrap();

        // Children go before the rows that reference them. With enforced
        // foreign keys from parent to child this order would be rejected.
        let deletes: Vec<_> = conn
            .statements()
            .into_iter()
            .filter(|s| s.starts_with("DELETE"))
            .collect();
        assert_eq!(
            deletes,
            vec![
                r#"DELETE FROM "table2" WHERE "id" = 8"#.to_string(),
                r#"DELETE FROM "table1" WHERE "id" = 7"#.to_string(),
                r#"DELETE FROM "table0" WHERE "id" = 1"#.to_string(),
            ]
        );
        // table3_id was NULL, so table3 never had a row to delete
        assert_eq!(deleted, 3);
        assert!(graph.record(root).is_deleted());
        assert!(fetch(&conn, &mut graph, root).unwrap_err().is_not_saved());
        assert!(save(&conn, &mut graph, root).unwrap_err().is_not_saved());
    }

    #[test]
    fn delete_all_deletes_shared_child_once() {
        let conn = MockConnection::new();
        conn.respond(
            r#"SELECT "table1_id" FROM "table0" WHERE "id" = 1"#,
            vec![("table1_id", Value::BigInt(7))],
        );
        conn.respond(
            r#"SELECT "table2_id" FROM "table1" WHERE "id" = 7"#,
            vec![("table2_id", Value::BigInt(8))],
        );
        conn.respond(
            r#"SELECT "title" FROM "table2" WHERE "id" = 8"#,
            vec![("title", Value::Text("Eight".into()))],
        );
        let mut graph = RecordGraph::new();
        let root = graph.add_root("table0", "id", Some(Value::BigInt(1)));
        let a = register(&mut graph, root, "table1.table2.title");
        let b = register(&mut graph, root, "table2[table1.table2_id].title");
        assert_eq!(a, b);

        assert_eq!(delete_all(&conn, &mut graph, root).unwrap(), 3);
        let deletes: Vec<_> = conn
            .statements()
            .into_iter()
            .filter(|s| s.starts_with("DELETE"))
            .collect();
        assert_eq!(
            deletes,
            vec![
                r#"DELETE FROM "table2" WHERE "id" = 8"#.to_string(),
                r#"DELETE FROM "table1" WHERE "id" = 7"#.to_string(),
                r#"DELETE FROM "table0" WHERE "id" = 1"#.to_string(),
            ]
        );
    }

    #[test]
    fn save_reads_unread_link_before_writing_child() {
        let conn = MockConnection::new();
        conn.respond(
            r#"SELECT "table1_id" FROM "table0" WHERE "id" = 5"#,
            vec![("table1_id", Value::BigInt(7))],
        );
        let mut graph = RecordGraph::new();
        let root = graph.add_root("table0", "id", Some(Value::BigInt(5)));
        let title = register(&mut graph, root, "table1.title");
        graph.column_mut(title).set("Renamed");

        save(&conn, &mut graph, root).unwrap();

        assert_eq!(
            conn.statements(),
            vec![
                r#"SELECT "table1_id" FROM "table0" WHERE "id" = 5"#.to_string(),
                r#"UPDATE "table1" SET "title" = 'Renamed' WHERE "id" = 7"#.to_string(),
            ]
        );
        let link = graph.find_column(root, "table1_id").unwrap();
        assert_eq!(graph.column(link).value(), &Value::BigInt(7));
        assert!(!graph.column(link).is_dirty());
        assert!(!graph.record(root).is_updated());
    }

    #[test]
    fn save_inserts_child_when_stored_link_is_null() {
        let conn = MockConnection::new();
        conn.respond(
            r#"SELECT "table1_id" FROM "table0" WHERE "id" = 5"#,
            vec![("table1_id", Value::Null)],
        );
        let mut graph = RecordGraph::new();
        let root = graph.add_root("table0", "id", Some(Value::BigInt(5)));
        let title = register(&mut graph, root, "table1.title");
        graph.column_mut(title).set("Fresh");

        save(&conn, &mut graph, root).unwrap();

        assert_eq!(
            conn.statements(),
            vec![
                r#"SELECT "table1_id" FROM "table0" WHERE "id" = 5"#.to_string(),
                r#"INSERT INTO "table1" ("title") VALUES ('Fresh')"#.to_string(),
                r#"UPDATE "table0" SET "table1_id" = 1 WHERE "id" = 5"#.to_string(),
            ]
        );
    }

    #[test]
    fn save_keeps_an_assigned_link() {
        let conn = MockConnection::new();
        let mut graph = RecordGraph::new();
        let root = graph.add_root("table0", "id", Some(Value::BigInt(1)));
        let title = register(&mut graph, root, "table1.title");
        let table1 = graph.column(title).record();
        let link = graph.find_column(root, "table1_id").unwrap();
        graph.column_mut(link).load(Value::BigInt(7));
        graph.column_mut(graph.record(table1).primary_key()).set(7);
        graph.record_mut(root).set_updated(true);

        graph.assign(link, 9);
        graph.column_mut(title).set("Nine");
        save(&conn, &mut graph, root).unwrap();

        assert_eq!(
            conn.statements(),
            vec![
                r#"UPDATE "table1" SET "title" = 'Nine' WHERE "id" = 9"#.to_string(),
                r#"UPDATE "table0" SET "table1_id" = 9 WHERE "id" = 1"#.to_string(),
            ]
        );
    }

    #[test]
    fn delete_all_requires_bound_root() {
        let conn = MockConnection::new();
        let mut graph = RecordGraph::new();
        let root = graph.add_root("table0", "id", None);
        assert!(delete_all(&conn, &mut graph, root).unwrap_err().is_not_saved());
        assert!(delete(&conn, &mut graph, root).unwrap_err().is_not_saved());
    }

    #[test]
    fn connector_errors_propagate_after_partial_writes() {
        let conn = MockConnection::new();
        conn.fail_on(r#"INSERT INTO "table0""#);
        let mut graph = RecordGraph::new();
        let root = graph.add_root("table0", "id", None);
        let title = register(&mut graph, root, "table1.title");
        graph.column_mut(title).set("Joined");

        let err = save(&conn, &mut graph, root).unwrap_err();
        assert!(err.is_connector_failure());
        assert_eq!(err.sql(), Some(r#"INSERT INTO "table0" ("table1_id") VALUES (1)"#));
        // the child insert stays in place
        assert!(!graph.is_new(graph.column(title).record()));
        assert!(graph.is_new(root));
    }
}
