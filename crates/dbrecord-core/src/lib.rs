//! Core types and traits for dbrecord.
//!
//! This crate provides the pieces every other dbrecord crate builds on:
//!
//! - [`Value`] and [`Row`] for dynamically typed column data
//! - [`Error`] and [`Result`] shared by the whole workspace
//! - [`Dialect`] and [`Quoting`] for rendering literals and identifiers
//! - [`Connector`], the synchronous storage seam

pub mod connection;
pub mod dialect;
pub mod error;
pub mod identifiers;
pub mod row;
pub mod schema;
pub mod value;

pub use connection::Connector;
pub use dialect::{Dialect, Quoting};
pub use error::{
    ConnectionError, ConnectionErrorKind, Error, PathError, QueryError, QueryErrorKind,
    RecordError, RecordErrorKind, Result, SchemaError, SchemaErrorKind, TypeError,
};
pub use identifiers::{quote_ident, quote_ident_mysql};
pub use row::{ColumnInfo, FromValue, Row};
pub use schema::ColumnDescriptor;
pub use value::Value;
