//! Shared schema for the SQLite integration tests.

#![allow(dead_code)]

use dbrecord::{Connector, Value};
use dbrecord_sqlite::SqliteConnection;

const SCHEMA: &str = "
    CREATE TABLE table3 (id INTEGER PRIMARY KEY, title TEXT);
    CREATE TABLE table2 (id INTEGER PRIMARY KEY, title TEXT, table3_id INTEGER);
    CREATE TABLE table1 (id INTEGER PRIMARY KEY, title TEXT, table2_id INTEGER);
    CREATE TABLE table0 (
        id INTEGER PRIMARY KEY,
        title TEXT DEFAULT 'untitled',
        created_at TEXT,
        table1_id INTEGER,
        table3_id INTEGER
    );
";

const SCHEMA_WITH_FOREIGN_KEYS: &str = "
    PRAGMA foreign_keys = ON;
    CREATE TABLE table1 (id INTEGER PRIMARY KEY, title TEXT);
    CREATE TABLE table0 (
        id INTEGER PRIMARY KEY,
        title TEXT,
        table1_id INTEGER REFERENCES table1(id)
    );
";

pub fn open() -> SqliteConnection {
    let conn = SqliteConnection::open_memory().expect("open sqlite memory db");
    conn.execute_raw(SCHEMA).expect("create schema");
    conn
}

pub fn open_with_foreign_keys() -> SqliteConnection {
    let conn = SqliteConnection::open_memory().expect("open sqlite memory db");
    conn.execute_raw(SCHEMA_WITH_FOREIGN_KEYS)
        .expect("create schema");
    conn
}

/// The single value selected by `sql`.
pub fn scalar(conn: &SqliteConnection, sql: &str) -> Value {
    let row = conn
        .query_one(sql, &[])
        .expect("query")
        .expect("one row");
    row.get(0).cloned().unwrap_or(Value::Null)
}

pub fn count(conn: &SqliteConnection, table: &str) -> i64 {
    match scalar(conn, &format!("SELECT COUNT(*) FROM {table}")) {
        Value::BigInt(n) => n,
        other => panic!("unexpected count: {other:?}"),
    }
}

pub fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}
