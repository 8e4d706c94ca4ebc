//! Error types for dbrecord operations.

use std::fmt;

/// The primary error type for all dbrecord operations.
#[derive(Debug)]
pub enum Error {
    /// A path expression could not be parsed
    Path(PathError),
    /// A record operation was rejected (unsaved record, unknown column)
    Record(RecordError),
    /// Connection-related errors (open, busy, closed)
    Connection(ConnectionError),
    /// Query execution errors
    Query(QueryError),
    /// Type conversion errors
    Type(TypeError),
    /// Schema introspection errors
    Schema(SchemaError),
}

/// A malformed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathError {
    /// The full input that failed to parse
    pub path: String,
    /// Byte offset of the offending character
    pub position: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordError {
    pub kind: RecordErrorKind,
    pub table: String,
    /// The path or column the operation referred to, if any
    pub column: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordErrorKind {
    /// The record has no row in storage (never saved, or deleted)
    NotSaved,
    /// The path names a column that was never registered
    UnknownColumn,
}

#[derive(Debug)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Failed to establish connection
    Connect,
}

#[derive(Debug)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub sql: Option<String>,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Syntax error in SQL
    Syntax,
    /// Constraint violation (unique, foreign key, etc.)
    Constraint,
    /// Table or column not found
    NotFound,
    /// Permission denied
    Permission,
    /// Data too large for column
    DataTruncation,
    /// Database is locked or busy
    Busy,
    /// Other database error
    Database,
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

#[derive(Debug)]
pub struct SchemaError {
    pub kind: SchemaErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorKind {
    /// Table not found
    TableNotFound,
}

impl Error {
    /// Build a malformed-path error at `position` within `path`.
    pub fn malformed_path(
        path: impl Into<String>,
        position: usize,
        message: impl Into<String>,
    ) -> Self {
        Error::Path(PathError {
            path: path.into(),
            position,
            message: message.into(),
        })
    }

    /// Build a `NotSaved` error for `table`.
    pub fn not_saved(table: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Record(RecordError {
            kind: RecordErrorKind::NotSaved,
            table: table.into(),
            column: None,
            message: message.into(),
        })
    }

    /// Build an `UnknownColumn` error for `path` resolved from `table`.
    pub fn unknown_column(table: impl Into<String>, path: impl Into<String>) -> Self {
        let table = table.into();
        let path = path.into();
        Error::Record(RecordError {
            kind: RecordErrorKind::UnknownColumn,
            message: format!("column '{path}' is not registered on '{table}'"),
            table,
            column: Some(path),
        })
    }

    /// Is this a malformed path expression?
    pub fn is_malformed_path(&self) -> bool {
        matches!(self, Error::Path(_))
    }

    /// Was a storage operation attempted on a record without a row?
    pub fn is_not_saved(&self) -> bool {
        matches!(self, Error::Record(r) if r.kind == RecordErrorKind::NotSaved)
    }

    /// Did a lookup name an unregistered column?
    pub fn is_unknown_column(&self) -> bool {
        matches!(self, Error::Record(r) if r.kind == RecordErrorKind::UnknownColumn)
    }

    /// Did the error come from the connector (connection or statement)?
    pub fn is_connector_failure(&self) -> bool {
        matches!(self, Error::Connection(_) | Error::Query(_))
    }

    /// Get the SQL that caused this error, if available
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sql.as_deref(),
            _ => None,
        }
    }
}

impl QueryError {
    /// Is this a constraint violation?
    pub fn is_constraint_violation(&self) -> bool {
        self.kind == QueryErrorKind::Constraint
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Path(e) => write!(f, "Malformed path: {}", e),
            Error::Record(e) => write!(f, "Record error: {}", e.message),
            Error::Connection(e) => write!(f, "Connection error: {}", e.message),
            Error::Query(e) => {
                if let Some(sql) = &e.sql {
                    write!(f, "Query error: {} (in `{}`)", e.message, sql)
                } else {
                    write!(f, "Query error: {}", e.message)
                }
            }
            Error::Type(e) => {
                if let Some(col) = &e.column {
                    write!(
                        f,
                        "Type error in column '{}': expected {}, found {}",
                        col, e.expected, e.actual
                    )
                } else {
                    write!(f, "Type error: expected {}, found {}", e.expected, e.actual)
                }
            }
            Error::Schema(e) => write!(f, "Schema error: {}", e.message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Connection(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Query(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Schema(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at position {} in '{}'",
            self.message, self.position, self.path
        )
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<PathError> for Error {
    fn from(err: PathError) -> Self {
        Error::Path(err)
    }
}

impl From<RecordError> for Error {
    fn from(err: RecordError) -> Self {
        Error::Record(err)
    }
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Error::Schema(err)
    }
}

/// Result type alias for dbrecord operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_accessor() {
        let err = Error::Query(QueryError {
            kind: QueryErrorKind::Constraint,
            sql: Some("DELETE FROM t WHERE id = 1".to_string()),
            message: "FOREIGN KEY constraint failed".to_string(),
            source: None,
        });
        assert_eq!(err.sql(), Some("DELETE FROM t WHERE id = 1"));
        assert!(err.is_connector_failure());
        assert!(err.to_string().contains("FOREIGN KEY"));
    }

    #[test]
    fn record_predicates() {
        let not_saved = Error::not_saved("table0", "record has no row");
        assert!(not_saved.is_not_saved());
        assert!(!not_saved.is_unknown_column());
        assert!(!not_saved.is_connector_failure());

        let unknown = Error::unknown_column("table0", "table1.title");
        assert!(unknown.is_unknown_column());
        assert_eq!(
            unknown.to_string(),
            "Record error: column 'table1.title' is not registered on 'table0'"
        );
    }

    #[test]
    fn connector_and_schema_errors_keep_their_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = Error::Connection(ConnectionError {
            kind: ConnectionErrorKind::Connect,
            message: "unable to open database".to_string(),
            source: Some(Box::new(io)),
        });
        assert!(err.is_connector_failure());
        assert!(std::error::Error::source(&err).is_some());

        let err = Error::Schema(SchemaError {
            kind: SchemaErrorKind::TableNotFound,
            message: "table 'missing' not found".to_string(),
            source: None,
        });
        assert!(!err.is_connector_failure());
        assert!(std::error::Error::source(&err).is_none());
        assert_eq!(err.to_string(), "Schema error: table 'missing' not found");
    }

    #[test]
    fn path_error_display() {
        let err = Error::malformed_path("a[b", 3, "expected ']'");
        assert!(err.is_malformed_path());
        assert_eq!(
            err.to_string(),
            "Malformed path: expected ']' at position 3 in 'a[b'"
        );
    }
}
