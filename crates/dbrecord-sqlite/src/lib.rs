//! SQLite connector for dbrecord.
//!
// FFI bindings require unsafe code - this is expected for database drivers
#![allow(unsafe_code)]
//!
//! [`SqliteConnection`] implements [`Connector`](dbrecord_core::Connector)
//! over libsqlite3, so record graphs can be saved to and fetched from a file
//! or in-memory database.
//!
//! # Example
//!
//! ```rust,ignore
//! use dbrecord_sqlite::SqliteConnection;
//! use dbrecord_core::{Connector, Value};
//!
//! let conn = SqliteConnection::open_memory()?;
//! conn.execute_raw("CREATE TABLE table0 (id INTEGER PRIMARY KEY, title TEXT)")?;
//! conn.execute("INSERT INTO table0 (title) VALUES (?1)", &[Value::from("Title")])?;
//! assert_eq!(conn.last_insert_id()?, Value::BigInt(1));
//! ```
//!
//! # Type Mapping
//!
//! | Value | SQLite storage class |
//! |-------|----------------------|
//! | `Null` | NULL |
//! | `Bool` | INTEGER (0/1) |
//! | `BigInt` | INTEGER |
//! | `Double` | REAL |
//! | `Text` | TEXT |
//! | `Bytes` | BLOB |
//!
//! INTEGER columns always read back as `BigInt`.
//!
//! # Thread Safety
//!
//! `SqliteConnection` is both `Send` and `Sync`; every call goes through an
//! internal mutex around the SQLite handle.

// Links the bundled libsqlite3 that ffi.rs declares against.
use libsqlite3_sys as _;

pub mod connection;
pub mod ffi;
pub mod types;

pub use connection::{OpenFlags, SqliteConfig, SqliteConnection};

/// Re-export the SQLite library version.
pub fn sqlite_version() -> &'static str {
    ffi::version()
}

/// Re-export the SQLite library version number.
pub fn sqlite_version_number() -> i32 {
    ffi::version_number()
}
