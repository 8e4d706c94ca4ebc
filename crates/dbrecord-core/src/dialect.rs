//! SQL dialects and literal quoting.
//!
//! Statements are rendered with their values inlined as literals, so every
//! connector exposes its quoting rules through [`Quoting`].

use crate::error::{Error, Result, TypeError};
use crate::identifiers::{quote_ident, quote_ident_mysql};
use crate::value::Value;
use std::fmt::Write as _;

/// SQL dialect for generating dialect-specific SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dialect {
    /// PostgreSQL dialect
    #[default]
    Postgres,
    /// SQLite dialect
    Sqlite,
    /// MySQL dialect
    Mysql,
}

impl Dialect {
    /// Quote an identifier for this dialect.
    pub fn quote_identifier(self, name: &str) -> String {
        match self {
            Dialect::Postgres | Dialect::Sqlite => quote_ident(name),
            Dialect::Mysql => quote_ident_mysql(name),
        }
    }

    /// Render a value as a SQL literal for this dialect.
    ///
    /// Non-finite doubles have no literal form and are rejected.
    #[allow(clippy::result_large_err)]
    pub fn quote_value(self, value: &Value) -> Result<String> {
        let literal = match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => match (self, *b) {
                (Dialect::Sqlite, true) => "1".to_string(),
                (Dialect::Sqlite, false) => "0".to_string(),
                (_, true) => "TRUE".to_string(),
                (_, false) => "FALSE".to_string(),
            },
            Value::BigInt(n) => n.to_string(),
            Value::Double(f) => format_double(*f)?,
            Value::Text(s) => self.quote_text(s),
            Value::Bytes(b) => quote_bytes(b),
        };
        Ok(literal)
    }

    fn quote_text(self, s: &str) -> String {
        let mut result = String::with_capacity(s.len() + 2);
        result.push('\'');
        for ch in s.chars() {
            match (self, ch) {
                (_, '\'') => result.push_str("''"),
                (Dialect::Mysql, '\\') => result.push_str("\\\\"),
                (Dialect::Mysql, '\0') => result.push_str("\\0"),
                (Dialect::Mysql, '\n') => result.push_str("\\n"),
                (Dialect::Mysql, '\r') => result.push_str("\\r"),
                (Dialect::Mysql, '\x1a') => result.push_str("\\Z"),
                _ => result.push(ch),
            }
        }
        result.push('\'');
        result
    }
}

/// Shortest round-tripping form, always with a fraction or exponent so the
/// literal stays a REAL.
#[allow(clippy::result_large_err)]
fn format_double(f: f64) -> Result<String> {
    if !f.is_finite() {
        return Err(Error::Type(TypeError {
            expected: "finite double",
            actual: f.to_string(),
            column: None,
        }));
    }
    let mut text = format!("{f:?}");
    if !text.contains(['.', 'e', 'E']) {
        text.push_str(".0");
    }
    Ok(text)
}

fn quote_bytes(data: &[u8]) -> String {
    let mut result = String::with_capacity(data.len() * 2 + 3);
    result.push_str("X'");
    for byte in data {
        let _ = write!(result, "{byte:02X}");
    }
    result.push('\'');
    result
}

/// Quoting rules used when rendering statements.
///
/// Only [`dialect`](Quoting::dialect) is required; connectors with unusual
/// escaping may override the provided methods.
pub trait Quoting {
    /// The dialect this implementation speaks.
    fn dialect(&self) -> Dialect;

    /// Render `value` as a SQL literal.
    #[allow(clippy::result_large_err)]
    fn quote(&self, value: &Value) -> Result<String> {
        self.dialect().quote_value(value)
    }

    /// Quote a table or column name.
    fn quote_identifier(&self, name: &str) -> String {
        self.dialect().quote_identifier(name)
    }
}

impl Quoting for Dialect {
    fn dialect(&self) -> Dialect {
        *self
    }
}
