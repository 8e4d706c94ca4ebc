//! One-call access to a table through column paths.

use dbrecord_core::{Connector, Result, Value};
use dbrecord_session::{DbRecord, RecordOptions};

/// Identifies one row: a key value, optionally with the key column's name.
///
/// Without a name the table's configured default (`id`) is used.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryKey {
    pub name: Option<String>,
    pub value: Value,
}

impl PrimaryKey {
    /// A key value in an explicitly named column.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: Some(name.into()),
            value: value.into(),
        }
    }
}

macro_rules! impl_from_key_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for PrimaryKey {
                fn from(value: $ty) -> Self {
                    Self { name: None, value: value.into() }
                }
            }
        )*
    };
}

impl_from_key_value!(i32, i64, u32, &str, String, Value);

impl<N: Into<String>, V: Into<Value>> From<(N, V)> for PrimaryKey {
    fn from((name, value): (N, V)) -> Self {
        Self::new(name, value)
    }
}

/// A stateless facade over one table.
///
/// Every call builds a fresh [`DbRecord`], registers the paths it was given
/// and drives one save, fetch or delete. Nothing is kept between calls.
///
/// ```ignore
/// let table = Table::new(&conn, "table0");
/// let id = table.insert([("title", "Title"), ("table1.title", "Title 1")])?;
/// let values = table.select(["title", "table1.title"], id)?;
/// ```
#[derive(Debug)]
pub struct Table<'c, C: Connector + ?Sized> {
    conn: &'c C,
    name: String,
    options: RecordOptions,
}

impl<'c, C: Connector + ?Sized> Table<'c, C> {
    pub fn new(conn: &'c C, name: impl Into<String>) -> Self {
        Self::with_options(conn, name, RecordOptions::default())
    }

    pub fn with_options(conn: &'c C, name: impl Into<String>, options: RecordOptions) -> Self {
        Self {
            conn,
            name: name.into(),
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn record(&self, key: Option<PrimaryKey>) -> DbRecord<'c, C> {
        let (name, value) = match key {
            Some(key) => (key.name, Some(key.value)),
            None => (None, None),
        };
        DbRecord::with_options(
            self.conn,
            &self.name,
            name.as_deref(),
            value,
            self.options.clone(),
        )
    }

    /// Read the values at `paths` from the row identified by `key`, in order.
    #[tracing::instrument(level = "debug", skip(self, paths, key), fields(table = %self.name))]
    #[allow(clippy::result_large_err)]
    pub fn select<I, S>(&self, paths: I, key: impl Into<PrimaryKey>) -> Result<Vec<Value>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut record = self.record(Some(key.into()));
        let paths: Vec<S> = paths.into_iter().collect();
        for path in &paths {
            record.register_column(path.as_ref())?;
        }
        paths.iter().map(|p| record.get(p.as_ref())).collect()
    }

    /// Insert a row and return its generated key.
    #[allow(clippy::result_large_err)]
    pub fn insert<I, K, V>(&self, fields: I) -> Result<Value>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.save(fields, None)
    }

    /// Update the row identified by `key` and return its key.
    #[allow(clippy::result_large_err)]
    pub fn update<I, K, V>(&self, fields: I, key: impl Into<PrimaryKey>) -> Result<Value>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.save(fields, Some(key.into()))
    }

    /// Delete the row identified by `key`. Joined rows are left alone.
    #[tracing::instrument(level = "debug", skip(self, key), fields(table = %self.name))]
    #[allow(clippy::result_large_err)]
    pub fn delete(&self, key: impl Into<PrimaryKey>) -> Result<()> {
        self.record(Some(key.into())).delete()
    }

    /// Assign `fields` and save. Without a key, or with a NULL one, the row
    /// is inserted.
    #[tracing::instrument(level = "debug", skip(self, fields, key), fields(table = %self.name))]
    #[allow(clippy::result_large_err)]
    pub fn save<I, K, V>(&self, fields: I, key: Option<PrimaryKey>) -> Result<Value>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut record = self.record(key);
        for (path, value) in fields {
            let path = path.as_ref();
            record.register_column(path)?;
            record.set(path, value)?;
        }
        record.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_key_conversions() {
        assert_eq!(
            PrimaryKey::from(17),
            PrimaryKey {
                name: None,
                value: Value::BigInt(17)
            }
        );
        assert_eq!(
            PrimaryKey::from(("pk", 17)),
            PrimaryKey::new("pk", Value::BigInt(17))
        );
        assert_eq!(PrimaryKey::from("abc").value, Value::Text("abc".into()));
        assert_eq!(PrimaryKey::from(Value::Null).value, Value::Null);
    }
}
