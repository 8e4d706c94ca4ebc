//! Recording connector shared by the unit tests.

use dbrecord_core::{
    ColumnDescriptor, Connector, Dialect, Error, QueryError, QueryErrorKind, Quoting, Result, Row,
    Value,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub(crate) struct MockState {
    pub statements: Vec<String>,
    pub responses: HashMap<String, Vec<Row>>,
    pub described: HashMap<String, Vec<ColumnDescriptor>>,
    pub describe_calls: usize,
    pub fail_on: Option<String>,
    pub last_id: i64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MockConnection {
    pub state: Arc<Mutex<MockState>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the exact query `sql` with one row.
    pub fn respond<N: Into<String>>(&self, sql: &str, row: Vec<(N, Value)>) {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(sql.to_string(), vec![Row::from_pairs(row)]);
    }

    pub fn describe(&self, table: &str, columns: Vec<ColumnDescriptor>) {
        self.state
            .lock()
            .unwrap()
            .described
            .insert(table.to_string(), columns);
    }

    /// Fail every statement containing `needle`.
    pub fn fail_on(&self, needle: &str) {
        self.state.lock().unwrap().fail_on = Some(needle.to_string());
    }

    pub fn statements(&self) -> Vec<String> {
        self.state.lock().unwrap().statements.clone()
    }

    pub fn take_statements(&self) -> Vec<String> {
        std::mem::take(&mut self.state.lock().unwrap().statements)
    }

    fn record(&self, sql: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.statements.push(sql.to_string());
        match &state.fail_on {
            Some(needle) if sql.contains(needle.as_str()) => Err(Error::Query(QueryError {
                kind: QueryErrorKind::Constraint,
                sql: Some(sql.to_string()),
                message: "mock failure".to_string(),
                source: None,
            })),
            _ => Ok(()),
        }
    }
}

impl Quoting for MockConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }
}

impl Connector for MockConnection {
    fn query(&self, sql: &str, _params: &[Value]) -> Result<Vec<Row>> {
        self.record(sql)?;
        let state = self.state.lock().unwrap();
        Ok(state.responses.get(sql).cloned().unwrap_or_default())
    }

    fn execute(&self, sql: &str, _params: &[Value]) -> Result<u64> {
        self.record(sql)?;
        if sql.starts_with("INSERT") {
            self.state.lock().unwrap().last_id += 1;
        }
        Ok(1)
    }

    fn last_insert_id(&self) -> Result<Value> {
        Ok(Value::BigInt(self.state.lock().unwrap().last_id))
    }

    fn describe_columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let mut state = self.state.lock().unwrap();
        state.describe_calls += 1;
        Ok(state.described.get(table).cloned().unwrap_or_default())
    }
}
