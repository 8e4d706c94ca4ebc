//! Change-tracked record graphs for dbrecord.
//!
//! `dbrecord-session` is the **unit of work** layer. A [`DbRecord`] owns a
//! [`RecordGraph`] rooted at one row: column paths registered on it grow the
//! graph with left-joined rows, assignments mark single columns dirty, and the
//! [`flush`] module turns the graph into ordered statements.
//!
//! # Ordering
//!
//! | operation | order | statements |
//! |---|---|---|
//! | save | children first | INSERT for new rows, UPDATE of dirty columns for existing ones |
//! | fetch | parents first | one SELECT of the unassigned columns per bound row |
//! | delete_all | children first | one DELETE per bound row |
//!
//! [`ActiveRecord`] adds schema discovery through `dbrecord-schema`.

pub mod active;
pub mod column;
pub mod config;
pub mod flush;
pub mod graph;
pub mod record;

#[cfg(test)]
mod test_support;

pub use active::ActiveRecord;
pub use column::Column;
pub use config::RecordOptions;
pub use flush::PendingWrite;
pub use graph::{ColumnId, JoinId, JoinKey, LeftJoin, RecordGraph, RecordId, RecordNode};
pub use record::DbRecord;
