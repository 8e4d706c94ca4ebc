//! dbrecord - read and write rows across linked tables through column paths.
//!
//! A record is rooted at one row. Column paths name that row's columns
//! (`title`) or columns of rows reached through a linking column
//! (`table1.title`, `table1[id=table1_id].title`,
//! `table3[table2[table1.table2_id].table3_id].title`). Assignments are
//! tracked per column, so saving writes only what changed: joined rows are
//! written first, and their generated keys flow into the linking columns of
//! the rows that reference them.
//!
//! # Quick Start
//!
//! ```ignore
//! use dbrecord::prelude::*;
//! use dbrecord_sqlite::SqliteConnection;
//!
//! let conn = SqliteConnection::open_memory()?;
//!
//! // One-shot calls through the table facade
//! let table = Table::new(&conn, "table0");
//! let id = table.insert([("title", Value::from("Title")), ("table1.title", "Title 1".into())])?;
//! let values = table.select(["title", "table1.title"], id.clone())?;
//! table.update([("title", "New title")], id)?;
//!
//! // Or keep a record around for several edits
//! let mut record = DbRecord::existing(&conn, "table0", 1);
//! record.register_columns(["title", "table1.title"])?;
//! record.set("table1.title", "Renamed")?;
//! record.save()?;
//! ```
//!
//! # Path Syntax
//!
//! | path | reads |
//! |---|---|
//! | `title` | column `title` of the root row |
//! | `table1.title` | `title` of the `table1` row whose `id` equals the root's `table1_id` |
//! | `table1[uid=t1].title` | same, joined on `table1.uid = root.t1` |
//! | `table2[table1.table2_id].title` | joined through a linking column of another joined row |

pub mod table;

pub use dbrecord_core::{
    ColumnDescriptor, Connector, Dialect, Error, Quoting, Result, Row, Value,
};
pub use dbrecord_query::{PathDefaults, PathExpr};
pub use dbrecord_schema::{SchemaCache, TableSchema};
pub use dbrecord_session::{
    ActiveRecord, Column, ColumnId, DbRecord, RecordGraph, RecordId, RecordOptions,
};
pub use table::{PrimaryKey, Table};

/// Everything a caller usually needs.
pub mod prelude {
    pub use crate::{
        // Records
        ActiveRecord,
        // Core types
        Connector,
        DbRecord,
        Error,
        PrimaryKey,
        RecordOptions,
        Result,
        SchemaCache,
        // Facade
        Table,
        Value,
    };
}
