//! Statement builders for SELECT, INSERT, UPDATE and DELETE.
//!
//! Each builder targets one row of one table. Values are rendered inline as
//! literals through a [`Quoting`] implementation, so the returned parameter
//! list is always empty; it is kept so callers can hand the pair straight to
//! a [`Connector`](dbrecord_core::Connector). Building fails only when a
//! value has no literal form.

use dbrecord_core::{Dialect, Quoting, Result, Value};

/// SELECT of chosen columns from the row identified by its primary key.
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    table: String,
    primary_key: String,
    key_value: Value,
    columns: Vec<String>,
}

impl SelectBuilder {
    /// Create a new SELECT builder for the row `primary_key = key_value`.
    pub fn new(table: impl Into<String>, primary_key: impl Into<String>, key_value: Value) -> Self {
        Self {
            table: table.into(),
            primary_key: primary_key.into(),
            key_value,
            columns: Vec::new(),
        }
    }

    /// Add a column to the select list.
    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.columns.push(name.into());
        self
    }

    /// Add several columns, keeping their order.
    pub fn columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(names.into_iter().map(Into::into));
        self
    }

    /// Build the SELECT SQL with default dialect (Postgres).
    #[allow(clippy::result_large_err)]
    pub fn build(&self) -> Result<(String, Vec<Value>)> {
        self.build_with(&Dialect::default())
    }

    /// Build the SELECT SQL with the given quoting rules.
    #[allow(clippy::result_large_err)]
    pub fn build_with<Q: Quoting + ?Sized>(&self, q: &Q) -> Result<(String, Vec<Value>)> {
        let columns: Vec<_> = self
            .columns
            .iter()
            .map(|c| q.quote_identifier(c))
            .collect();
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = {}",
            columns.join(", "),
            q.quote_identifier(&self.table),
            q.quote_identifier(&self.primary_key),
            q.quote(&self.key_value)?
        );
        Ok((sql, Vec::new()))
    }
}

/// INSERT of one row.
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    table: String,
    values: Vec<(String, Value)>,
}

impl InsertBuilder {
    /// Create a new INSERT builder for `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            values: Vec::new(),
        }
    }

    /// Add a column value.
    pub fn value(mut self, column: impl Into<String>, value: Value) -> Self {
        self.values.push((column.into(), value));
        self
    }

    /// Add several column values, keeping their order.
    pub fn values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        self.values
            .extend(values.into_iter().map(|(c, v)| (c.into(), v)));
        self
    }

    /// Build the INSERT SQL with default dialect (Postgres).
    #[allow(clippy::result_large_err)]
    pub fn build(&self) -> Result<(String, Vec<Value>)> {
        self.build_with(&Dialect::default())
    }

    /// Build the INSERT SQL with the given quoting rules.
    ///
    /// A row with no values becomes `DEFAULT VALUES`, or `() VALUES ()` for
    /// MySQL which lacks that form.
    #[allow(clippy::result_large_err)]
    pub fn build_with<Q: Quoting + ?Sized>(&self, q: &Q) -> Result<(String, Vec<Value>)> {
        let table = q.quote_identifier(&self.table);
        if self.values.is_empty() {
            let sql = match q.dialect() {
                Dialect::Mysql => format!("INSERT INTO {table} () VALUES ()"),
                Dialect::Postgres | Dialect::Sqlite => {
                    format!("INSERT INTO {table} DEFAULT VALUES")
                }
            };
            return Ok((sql, Vec::new()));
        }

        let columns: Vec<_> = self
            .values
            .iter()
            .map(|(c, _)| q.quote_identifier(c))
            .collect();
        let literals = self
            .values
            .iter()
            .map(|(_, v)| q.quote(v))
            .collect::<Result<Vec<_>>>()?;
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            literals.join(", ")
        );
        Ok((sql, Vec::new()))
    }
}

/// UPDATE of chosen columns on the row identified by its primary key.
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    table: String,
    primary_key: String,
    key_value: Value,
    set: Vec<(String, Value)>,
}

impl UpdateBuilder {
    /// Create a new UPDATE builder for the row `primary_key = key_value`.
    pub fn new(table: impl Into<String>, primary_key: impl Into<String>, key_value: Value) -> Self {
        Self {
            table: table.into(),
            primary_key: primary_key.into(),
            key_value,
            set: Vec::new(),
        }
    }

    /// Add a `column = value` assignment.
    pub fn set(mut self, column: impl Into<String>, value: Value) -> Self {
        self.set.push((column.into(), value));
        self
    }

    /// Add several assignments, keeping their order.
    pub fn set_all<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        self.set.extend(values.into_iter().map(|(c, v)| (c.into(), v)));
        self
    }

    /// True when there is nothing to assign.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Build the UPDATE SQL with default dialect (Postgres).
    #[allow(clippy::result_large_err)]
    pub fn build(&self) -> Result<(String, Vec<Value>)> {
        self.build_with(&Dialect::default())
    }

    /// Build the UPDATE SQL with the given quoting rules.
    #[allow(clippy::result_large_err)]
    pub fn build_with<Q: Quoting + ?Sized>(&self, q: &Q) -> Result<(String, Vec<Value>)> {
        let assignments = self
            .set
            .iter()
            .map(|(c, v)| Ok(format!("{} = {}", q.quote_identifier(c), q.quote(v)?)))
            .collect::<Result<Vec<_>>>()?;
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            q.quote_identifier(&self.table),
            assignments.join(", "),
            q.quote_identifier(&self.primary_key),
            q.quote(&self.key_value)?
        );
        Ok((sql, Vec::new()))
    }
}

/// DELETE of the row identified by its primary key.
#[derive(Debug, Clone)]
pub struct DeleteBuilder {
    table: String,
    primary_key: String,
    key_value: Value,
}

impl DeleteBuilder {
    /// Create a new DELETE builder for the row `primary_key = key_value`.
    pub fn new(table: impl Into<String>, primary_key: impl Into<String>, key_value: Value) -> Self {
        Self {
            table: table.into(),
            primary_key: primary_key.into(),
            key_value,
        }
    }

    /// Build the DELETE SQL with default dialect (Postgres).
    #[allow(clippy::result_large_err)]
    pub fn build(&self) -> Result<(String, Vec<Value>)> {
        self.build_with(&Dialect::default())
    }

    /// Build the DELETE SQL with the given quoting rules.
    #[allow(clippy::result_large_err)]
    pub fn build_with<Q: Quoting + ?Sized>(&self, q: &Q) -> Result<(String, Vec<Value>)> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = {}",
            q.quote_identifier(&self.table),
            q.quote_identifier(&self.primary_key),
            q.quote(&self.key_value)?
        );
        Ok((sql, Vec::new()))
    }
}
