//! Path expressions and statement builders for dbrecord.
//!
//! `dbrecord-query` is the **rendering layer**: it turns path strings such as
//! `table2[table1.table2_id].title` into a [`PathExpr`] tree, and turns a table,
//! a key and a column list into SQL text through [`SelectBuilder`],
//! [`InsertBuilder`], [`UpdateBuilder`] and [`DeleteBuilder`].
//!
//! Nothing here touches a connection; execution lives in `dbrecord-session`.

pub mod builder;
pub mod path;

pub use builder::{DeleteBuilder, InsertBuilder, SelectBuilder, UpdateBuilder};
pub use path::{PathDefaults, PathExpr};
