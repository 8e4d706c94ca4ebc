//! The storage connector seam.
//!
//! Record graphs never talk to a driver directly; they render statements and
//! hand them to a [`Connector`]. Calls are synchronous and block the caller.

use crate::dialect::Quoting;
use crate::error::Result;
use crate::row::Row;
use crate::schema::ColumnDescriptor;
use crate::value::Value;

/// A synchronous database connection able to run rendered statements.
///
/// Implementations must report failures as [`Error::Connection`] or
/// [`Error::Query`](crate::Error::Query); callers propagate them untouched.
///
/// [`Error::Connection`]: crate::Error::Connection
pub trait Connector: Quoting {
    /// Run a query and return every row.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Run a query and return the first row, if any.
    fn query_one(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        Ok(self.query(sql, params)?.into_iter().next())
    }

    /// Execute a statement and return the number of affected rows.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// The identifier generated by the most recent INSERT on this connection.
    fn last_insert_id(&self) -> Result<Value>;

    /// Describe the columns of `table`.
    fn describe_columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>>;
}
