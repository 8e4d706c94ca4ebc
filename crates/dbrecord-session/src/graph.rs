//! The record graph.
//!
//! Records, their columns and the left-join edges between them live in one
//! arena and refer to each other through copyable handles. Every record but
//! the root is reached through exactly one edge, so the graph is a tree.
//!
//! An edge hangs off the record that owns its linking column. Resolving
//! `table1.table2.title` and `table2[table1.table2_id].title` therefore lands
//! on the same `table2` node: both link through `table1.table2_id`.

use crate::column::Column;
use dbrecord_core::{Error, Result, Value};
use dbrecord_query::PathExpr;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            /// Position in the owning arena.
            pub const fn index(self) -> usize {
                self.0
            }

            #[allow(dead_code)]
            pub(crate) const fn from_index(index: usize) -> Self {
                Self(index)
            }
        }
    };
}

handle!(
    /// Handle to a record in a [`RecordGraph`].
    RecordId
);
handle!(
    /// Handle to a column in a [`RecordGraph`].
    ColumnId
);
handle!(
    /// Handle to a left-join edge in a [`RecordGraph`].
    JoinId
);

/// One row of one table.
#[derive(Debug, Clone)]
pub struct RecordNode {
    table: String,
    primary_key: ColumnId,
    columns: Vec<ColumnId>,
    joins: Vec<JoinId>,
    updated: bool,
    deleted: bool,
    parent: Option<JoinId>,
}

impl RecordNode {
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The primary-key column, created with the record.
    pub fn primary_key(&self) -> ColumnId {
        self.primary_key
    }

    /// Columns in registration order, primary key first.
    pub fn columns(&self) -> &[ColumnId] {
        &self.columns
    }

    /// Edges owned by this record, in creation order.
    pub fn joins(&self) -> &[JoinId] {
        &self.joins
    }

    /// True once contents reflect storage.
    ///
    /// Cleared by registering a column and by saving.
    pub fn is_updated(&self) -> bool {
        self.updated
    }

    /// True after the row was deleted. A deleted record never reaches
    /// storage again.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// The edge this record was reached through; `None` for the root.
    pub fn parent(&self) -> Option<JoinId> {
        self.parent
    }

    pub(crate) fn set_updated(&mut self, updated: bool) {
        self.updated = updated;
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.deleted = true;
        self.updated = false;
    }
}

/// What makes two edges from one record the same edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinKey {
    pub table: String,
    pub primary_key: String,
    pub link_column: String,
}

/// A left join from the record owning `link` into `child`.
#[derive(Debug, Clone)]
pub struct LeftJoin {
    owner: RecordId,
    child: RecordId,
    link: ColumnId,
    key: JoinKey,
}

impl LeftJoin {
    pub fn owner(&self) -> RecordId {
        self.owner
    }

    pub fn child(&self) -> RecordId {
        self.child
    }

    /// The owner's column holding the child's primary key.
    pub fn link(&self) -> ColumnId {
        self.link
    }

    pub fn key(&self) -> &JoinKey {
        &self.key
    }
}

/// Arena of records, columns and edges.
#[derive(Debug, Clone, Default)]
pub struct RecordGraph {
    records: Vec<RecordNode>,
    columns: Vec<Column>,
    joins: Vec<LeftJoin>,
}

impl RecordGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parentless record.
    ///
    /// A known `key_value` makes the record existing; `None` or `Null` leaves it
    /// new.
    pub fn add_root(
        &mut self,
        table: impl Into<String>,
        primary_key: impl Into<String>,
        key_value: Option<Value>,
    ) -> RecordId {
        self.add_record(table.into(), primary_key.into(), key_value, None)
    }

    fn add_record(
        &mut self,
        table: String,
        primary_key: String,
        key_value: Option<Value>,
        parent: Option<JoinId>,
    ) -> RecordId {
        let id = RecordId(self.records.len());
        let pk = ColumnId(self.columns.len());
        let mut column = Column::new(primary_key, id, true);
        if let Some(value) = key_value.filter(|v| !v.is_null()) {
            column.set(value);
        }
        self.columns.push(column);
        tracing::trace!(table = %table, record = id.0, "record created");
        self.records.push(RecordNode {
            table,
            primary_key: pk,
            columns: vec![pk],
            joins: Vec::new(),
            updated: false,
            deleted: false,
            parent,
        });
        id
    }

    pub fn record(&self, id: RecordId) -> &RecordNode {
        &self.records[id.0]
    }

    pub(crate) fn record_mut(&mut self, id: RecordId) -> &mut RecordNode {
        &mut self.records[id.0]
    }

    pub fn column(&self, id: ColumnId) -> &Column {
        &self.columns[id.0]
    }

    pub fn column_mut(&mut self, id: ColumnId) -> &mut Column {
        &mut self.columns[id.0]
    }

    pub fn join(&self, id: JoinId) -> &LeftJoin {
        &self.joins[id.0]
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn join_count(&self) -> usize {
        self.joins.len()
    }

    /// A record is new while its primary key was never assigned.
    pub fn is_new(&self, id: RecordId) -> bool {
        !self.column(self.record(id).primary_key).is_dirty()
    }

    /// Existing and not deleted: the record has a row to read or write.
    pub fn is_bound(&self, id: RecordId) -> bool {
        !self.is_new(id) && !self.record(id).deleted
    }

    /// The record's primary-key value.
    pub fn key_value(&self, id: RecordId) -> &Value {
        self.column(self.record(id).primary_key).value()
    }

    /// The record's primary-key column name.
    pub fn key_name(&self, id: RecordId) -> &str {
        self.column(self.record(id).primary_key).name()
    }

    pub fn find_column(&self, record: RecordId, name: &str) -> Option<ColumnId> {
        self.record(record)
            .columns
            .iter()
            .copied()
            .find(|c| self.column(*c).name() == name)
    }

    pub fn find_join(&self, owner: RecordId, key: &JoinKey) -> Option<JoinId> {
        self.record(owner)
            .joins
            .iter()
            .copied()
            .find(|j| &self.join(*j).key == key)
    }

    /// Get or create the column `name` on `record`.
    ///
    /// Creating a column makes the record stale.
    pub fn ensure_column(&mut self, record: RecordId, name: &str) -> ColumnId {
        if let Some(id) = self.find_column(record, name) {
            return id;
        }
        let id = ColumnId(self.columns.len());
        self.columns.push(Column::new(name, record, false));
        let node = &mut self.records[record.0];
        node.columns.push(id);
        node.updated = false;
        tracing::trace!(table = %node.table, column = name, "column registered");
        id
    }

    /// Get or create the edge leaving through `link` into `table`.
    ///
    /// A new child takes the link's current value as its primary key when that
    /// value is known.
    pub fn ensure_join(&mut self, link: ColumnId, table: &str, primary_key: &str) -> RecordId {
        let owner = self.column(link).record();
        let key = JoinKey {
            table: table.to_string(),
            primary_key: primary_key.to_string(),
            link_column: self.column(link).name().to_string(),
        };
        if let Some(join) = self.find_join(owner, &key) {
            tracing::trace!(table = table, link = %key.link_column, "join reused");
            return self.join(join).child;
        }

        let join = JoinId(self.joins.len());
        let seed = Some(self.column(link).value().clone());
        let child = self.add_record(
            table.to_string(),
            primary_key.to_string(),
            seed,
            Some(join),
        );
        tracing::trace!(table = table, link = %key.link_column, "join created");
        self.joins.push(LeftJoin {
            owner,
            child,
            link,
            key,
        });
        self.records[owner.0].joins.push(join);
        child
    }

    /// Assign `value` to `column`.
    ///
    /// When the column links to a child and its value changes, the child is
    /// rebound: it takes the new key, or becomes new when the value is `Null`.
    pub fn assign(&mut self, column: ColumnId, value: impl Into<Value>) {
        let value = value.into();
        let changed = self.column(column).value() != &value;
        self.columns[column.0].set(value.clone());
        if !changed {
            return;
        }
        let owner = self.column(column).record();
        let children: Vec<RecordId> = self
            .record(owner)
            .joins
            .iter()
            .map(|j| self.join(*j))
            .filter(|j| j.link == column)
            .map(|j| j.child)
            .collect();
        for child in children {
            self.rebind(child, value.clone());
        }
    }

    /// Point `record` at another row, forgetting what was read for the old one.
    fn rebind(&mut self, record: RecordId, key: Value) {
        let node = &mut self.records[record.0];
        node.updated = false;
        node.deleted = false;
        let pk = node.primary_key;
        let columns = node.columns.clone();
        let joins = node.joins.clone();
        tracing::debug!(table = %node.table, key = %key, "record rebound");

        if key.is_null() {
            self.columns[pk.0].discard();
        } else {
            self.columns[pk.0].set(key);
        }
        for id in columns {
            if id != pk {
                self.columns[id.0].load(Value::Null);
            }
        }
        // Children hanging off a forgotten link lose their row too.
        for join in joins {
            let (link, child) = (self.joins[join.0].link, self.joins[join.0].child);
            if !self.column(link).is_dirty() {
                self.rebind(child, Value::Null);
            }
        }
    }

    /// Resolve a column path against `record`, registering what is missing.
    ///
    /// Idempotent: resolving the same path again returns the same column and
    /// creates nothing. A path ending at a table is rejected before anything
    /// is registered.
    #[allow(clippy::result_large_err)]
    pub fn register_column(&mut self, record: RecordId, path: &PathExpr) -> Result<ColumnId> {
        if !path.ends_in_column() {
            return Err(ends_at_table(path));
        }
        self.register_column_unchecked(record, path)
    }

    #[allow(clippy::result_large_err)]
    fn register_column_unchecked(&mut self, record: RecordId, path: &PathExpr) -> Result<ColumnId> {
        match path {
            PathExpr::Column(name) => Ok(self.ensure_column(record, name)),
            PathExpr::Join {
                table,
                primary_key,
                link,
                inner,
            } => {
                let link = self.register_column_unchecked(record, link)?;
                let child = self.ensure_join(link, table, primary_key);
                match inner.as_deref() {
                    Some(inner) => self.register_column_unchecked(child, inner),
                    None => Err(ends_at_table(path)),
                }
            }
        }
    }

    /// Resolve a table path against `record`, registering what is missing.
    #[allow(clippy::result_large_err)]
    pub fn register_table(&mut self, record: RecordId, path: &PathExpr) -> Result<RecordId> {
        if let Some(name) = path.leaf() {
            return Err(Error::malformed_path(
                path.to_string(),
                0,
                format!("'{name}' is a column, expected a table"),
            ));
        }
        self.register_table_unchecked(record, path)
    }

    #[allow(clippy::result_large_err)]
    fn register_table_unchecked(&mut self, record: RecordId, path: &PathExpr) -> Result<RecordId> {
        match path {
            PathExpr::Column(name) => Err(Error::malformed_path(
                path.to_string(),
                0,
                format!("'{name}' is a column, expected a table"),
            )),
            PathExpr::Join {
                table,
                primary_key,
                link,
                inner,
            } => {
                let link = self.register_column_unchecked(record, link)?;
                let child = self.ensure_join(link, table, primary_key);
                match inner.as_deref() {
                    Some(inner) => self.register_table_unchecked(child, inner),
                    None => Ok(child),
                }
            }
        }
    }

    /// Resolve a column path without registering anything.
    pub fn lookup_column(&self, record: RecordId, path: &PathExpr) -> Option<ColumnId> {
        match path {
            PathExpr::Column(name) => self.find_column(record, name),
            PathExpr::Join {
                table,
                primary_key,
                link,
                inner,
            } => {
                let child = self.lookup_child(record, table, primary_key, link)?;
                self.lookup_column(child, inner.as_deref()?)
            }
        }
    }

    /// Resolve a table path without registering anything.
    pub fn lookup_table(&self, record: RecordId, path: &PathExpr) -> Option<RecordId> {
        match path {
            PathExpr::Column(_) => None,
            PathExpr::Join {
                table,
                primary_key,
                link,
                inner,
            } => {
                let child = self.lookup_child(record, table, primary_key, link)?;
                match inner.as_deref() {
                    Some(inner) => self.lookup_table(child, inner),
                    None => Some(child),
                }
            }
        }
    }

    fn lookup_child(
        &self,
        record: RecordId,
        table: &str,
        primary_key: &str,
        link: &PathExpr,
    ) -> Option<RecordId> {
        let link = self.lookup_column(record, link)?;
        let column = self.column(link);
        let key = JoinKey {
            table: table.to_string(),
            primary_key: primary_key.to_string(),
            link_column: column.name().to_string(),
        };
        self.find_join(column.record(), &key)
            .map(|j| self.join(j).child)
    }

    /// Records reachable from `root`, parents before children.
    pub fn pre_order(&self, root: RecordId) -> Vec<RecordId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            for join in self.record(id).joins.iter().rev() {
                stack.push(self.join(*join).child);
            }
        }
        out
    }

    /// Records reachable from `root`, children before parents.
    pub fn post_order(&self, root: RecordId) -> Vec<RecordId> {
        let mut out = Vec::new();
        self.visit_post(root, &mut out);
        out
    }

    fn visit_post(&self, id: RecordId, out: &mut Vec<RecordId>) {
        for join in &self.record(id).joins {
            self.visit_post(self.join(*join).child, out);
        }
        out.push(id);
    }

    /// Records from `root` down to `record` along parent edges.
    pub fn chain(&self, record: RecordId) -> Vec<RecordId> {
        let mut chain = vec![record];
        let mut current = record;
        while let Some(join) = self.record(current).parent {
            current = self.join(join).owner;
            chain.push(current);
        }
        chain.reverse();
        chain
    }

    /// The topmost record on the way to `record` that has a row but is stale.
    pub fn stale_anchor(&self, record: RecordId) -> Option<RecordId> {
        self.chain(record)
            .into_iter()
            .find(|id| self.is_bound(*id) && !self.record(*id).updated)
    }
}

fn ends_at_table(path: &PathExpr) -> Error {
    let text = path.to_string();
    let position = text.len();
    Error::malformed_path(text, position, "path must end with a column")
}
