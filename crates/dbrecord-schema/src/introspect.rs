//! Describing tables through a connector.

use dbrecord_core::{
    ColumnDescriptor, Connector, Error, Result, SchemaError, SchemaErrorKind,
};
use serde::Serialize;

/// The columns of one table, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableSchema {
    /// The primary-key column, if the table declares exactly one.
    ///
    /// Composite keys are reported as `None`; records only track a single
    /// key column.
    pub fn primary_key(&self) -> Option<&ColumnDescriptor> {
        let mut keys = self.columns.iter().filter(|c| c.primary_key);
        match (keys.next(), keys.next()) {
            (Some(key), None) => Some(key),
            _ => None,
        }
    }

    /// Look a column up by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// Reads table metadata from a [`Connector`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Introspector;

impl Introspector {
    /// Describe `table`.
    ///
    /// A table with no columns is reported as [`SchemaErrorKind::TableNotFound`]:
    /// SQLite answers `PRAGMA table_info` on a missing table with zero rows.
    #[tracing::instrument(level = "debug", skip(conn))]
    #[allow(clippy::result_large_err)]
    pub fn describe<C: Connector + ?Sized>(conn: &C, table: &str) -> Result<TableSchema> {
        let columns = conn.describe_columns(table)?;
        if columns.is_empty() {
            return Err(Error::Schema(SchemaError {
                kind: SchemaErrorKind::TableNotFound,
                message: format!("table '{table}' has no columns or does not exist"),
                source: None,
            }));
        }
        tracing::debug!(table = table, columns = columns.len(), "described table");
        Ok(TableSchema {
            name: table.to_string(),
            columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbrecord_core::{Dialect, Quoting, Row, Value};

    struct FixedColumns(Vec<ColumnDescriptor>);

    impl Quoting for FixedColumns {
        fn dialect(&self) -> Dialect {
            Dialect::Sqlite
        }
    }

    impl Connector for FixedColumns {
        fn query(&self, _sql: &str, _params: &[Value]) -> Result<Vec<Row>> {
            Ok(Vec::new())
        }

        fn execute(&self, _sql: &str, _params: &[Value]) -> Result<u64> {
            Ok(0)
        }

        fn last_insert_id(&self) -> Result<Value> {
            Ok(Value::Null)
        }

        fn describe_columns(&self, _table: &str) -> Result<Vec<ColumnDescriptor>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn describe_keeps_declaration_order() {
        let conn = FixedColumns(vec![
            ColumnDescriptor::new("id").primary_key(true),
            ColumnDescriptor::new("title").default_value("untitled"),
            ColumnDescriptor::new("table1_id"),
        ]);
        let schema = Introspector::describe(&conn, "table0").unwrap();
        assert_eq!(schema.name, "table0");
        assert_eq!(
            schema.column_names().collect::<Vec<_>>(),
            vec!["id", "title", "table1_id"]
        );
        assert_eq!(schema.primary_key().map(|c| c.name.as_str()), Some("id"));
        assert_eq!(
            schema.column("title").unwrap().default_value,
            Value::Text("untitled".into())
        );
    }

    #[test]
    fn composite_or_missing_keys() {
        let schema = TableSchema {
            name: "link".into(),
            columns: vec![
                ColumnDescriptor::new("a").primary_key(true),
                ColumnDescriptor::new("b").primary_key(true),
            ],
        };
        assert!(schema.primary_key().is_none());

        let schema = TableSchema {
            name: "log".into(),
            columns: vec![ColumnDescriptor::new("line")],
        };
        assert!(schema.primary_key().is_none());
    }

    #[test]
    fn missing_table_is_schema_error() {
        let conn = FixedColumns(Vec::new());
        let err = Introspector::describe(&conn, "nope").unwrap_err();
        assert!(matches!(
            err,
            Error::Schema(SchemaError {
                kind: SchemaErrorKind::TableNotFound,
                ..
            })
        ));
    }

    #[test]
    fn schema_serializes() {
        let schema = TableSchema {
            name: "t".into(),
            columns: vec![ColumnDescriptor::new("id").primary_key(true)],
        };
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["columns"][0]["name"], "id");
        assert_eq!(json["columns"][0]["primary_key"], true);
    }
}
