//! Table introspection for dbrecord.
//!
//! Active records discover their columns from the database. This crate wraps
//! [`Connector::describe_columns`](dbrecord_core::Connector::describe_columns)
//! in a [`TableSchema`] and keeps described tables in a shareable
//! [`SchemaCache`] so repeated records over one table describe it once.

pub mod cache;
pub mod introspect;

pub use cache::SchemaCache;
pub use introspect::{Introspector, TableSchema};
