//! Path expressions.
//!
//! A path names a column reachable from a root record through a chain of
//! left joins:
//!
//! ```text
//! path      := segment ("." segment)*
//! segment   := identifier ( "[" join_spec "]" )?
//! join_spec := (identifier "=")? path
//! ```
//!
//! Every segment but the last is a joined table. Inside brackets the optional
//! `name =` prefix is the joined table's primary key, and the remaining path is
//! resolved against the *enclosing* record to find the linking column. Both
//! parts fall back to [`PathDefaults`] when omitted, so `table1.title` reads as
//! `table1[id=table1_id].title`.

use dbrecord_core::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Naming conventions applied when a join leaves out its key or link.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PathDefaults {
    /// Primary-key column of a joined table (`id`)
    pub primary_key: String,
    /// Suffix appended to a table name to get its linking column (`_id`)
    pub link_suffix: String,
}

impl Default for PathDefaults {
    fn default() -> Self {
        Self {
            primary_key: "id".to_string(),
            link_suffix: "_id".to_string(),
        }
    }
}

impl PathDefaults {
    /// The linking column implied for `table`.
    pub fn link_column(&self, table: &str) -> String {
        format!("{table}{}", self.link_suffix)
    }
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathExpr {
    /// A column of the record the path is resolved against.
    Column(String),
    /// A left join into `table`, then `inner` resolved against the joined row.
    Join {
        table: String,
        primary_key: String,
        /// Column path, relative to the enclosing record, holding the joined key
        link: Box<PathExpr>,
        /// `None` when the path ends at the joined table itself
        inner: Option<Box<PathExpr>>,
    },
}

impl PathExpr {
    /// Parse a path that ends in a column.
    #[allow(clippy::result_large_err)]
    pub fn parse_column(input: &str) -> Result<Self> {
        Self::parse_column_with(input, &PathDefaults::default())
    }

    /// Parse a path that ends in a column, using custom naming defaults.
    #[allow(clippy::result_large_err)]
    pub fn parse_column_with(input: &str, defaults: &PathDefaults) -> Result<Self> {
        Parser::new(input, defaults).parse(Target::Column)
    }

    /// Parse a path whose last segment is a table.
    #[allow(clippy::result_large_err)]
    pub fn parse_table(input: &str) -> Result<Self> {
        Self::parse_table_with(input, &PathDefaults::default())
    }

    /// Parse a path whose last segment is a table, using custom naming defaults.
    #[allow(clippy::result_large_err)]
    pub fn parse_table_with(input: &str, defaults: &PathDefaults) -> Result<Self> {
        Parser::new(input, defaults).parse(Target::Table)
    }

    /// Convenience constructor for a column leaf.
    pub fn column(name: impl Into<String>) -> Self {
        PathExpr::Column(name.into())
    }

    /// Convenience constructor for a join.
    pub fn join(
        table: impl Into<String>,
        primary_key: impl Into<String>,
        link: PathExpr,
        inner: Option<PathExpr>,
    ) -> Self {
        PathExpr::Join {
            table: table.into(),
            primary_key: primary_key.into(),
            link: Box::new(link),
            inner: inner.map(Box::new),
        }
    }

    /// Does this path end in a column?
    pub fn ends_in_column(&self) -> bool {
        match self {
            PathExpr::Column(_) => true,
            PathExpr::Join { inner, .. } => inner.as_deref().is_some_and(PathExpr::ends_in_column),
        }
    }

    /// Name of the final column, if the path ends in one.
    pub fn leaf(&self) -> Option<&str> {
        match self {
            PathExpr::Column(name) => Some(name),
            PathExpr::Join { inner, .. } => inner.as_deref().and_then(PathExpr::leaf),
        }
    }
}

impl FromStr for PathExpr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_column(s)
    }
}

/// Renders the fully expanded form, e.g. `table1[id=table1_id].title`.
impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathExpr::Column(name) => f.write_str(name),
            PathExpr::Join {
                table,
                primary_key,
                link,
                inner,
            } => {
                write!(f, "{table}[{primary_key}={link}]")?;
                if let Some(inner) = inner {
                    write!(f, ".{inner}")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Column,
    Table,
}

struct Segment {
    name: String,
    spec: Option<JoinSpec>,
}

struct JoinSpec {
    primary_key: Option<String>,
    link: PathExpr,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$' || (!c.is_ascii() && c.is_alphanumeric())
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    defaults: &'a PathDefaults,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, defaults: &'a PathDefaults) -> Self {
        Self {
            input,
            pos: 0,
            defaults,
        }
    }

    #[allow(clippy::result_large_err)]
    fn parse(mut self, target: Target) -> Result<PathExpr> {
        self.skip_ws();
        if self.peek().is_none() {
            return Err(self.error("empty path"));
        }
        let segments = self.segments()?;
        let expr = self.assemble(segments, target)?;
        self.skip_ws();
        if let Some(c) = self.peek() {
            return Err(self.error(format!("unexpected character '{c}'")));
        }
        tracing::trace!(input = self.input, path = %expr, "parsed path");
        Ok(expr)
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::malformed_path(self.input, self.pos, message)
    }

    #[allow(clippy::result_large_err)]
    fn identifier(&mut self) -> Result<String> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !is_ident_char(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        if self.pos == start {
            return Err(match self.peek() {
                None => self.error("expected identifier, found end of input"),
                Some(c) => self.error(format!("expected identifier, found '{c}'")),
            });
        }
        Ok(self.input[start..self.pos].to_string())
    }

    #[allow(clippy::result_large_err)]
    fn segments(&mut self) -> Result<Vec<Segment>> {
        let mut segments = Vec::new();
        loop {
            let name = self.identifier()?;
            self.skip_ws();
            let spec = if self.eat('[') {
                Some(self.join_spec()?)
            } else {
                None
            };
            segments.push(Segment { name, spec });
            self.skip_ws();
            if !self.eat('.') {
                break;
            }
        }
        Ok(segments)
    }

    /// Parses the bracket body and the closing `]`.
    #[allow(clippy::result_large_err)]
    fn join_spec(&mut self) -> Result<JoinSpec> {
        self.skip_ws();
        let checkpoint = self.pos;
        let mut primary_key = None;
        if let Ok(name) = self.identifier() {
            self.skip_ws();
            if self.eat('=') {
                primary_key = Some(name);
            } else {
                self.pos = checkpoint;
            }
        }
        let segments = self.segments()?;
        let link = self.assemble(segments, Target::Column)?;
        self.skip_ws();
        match self.peek() {
            Some(']') => {
                self.pos += 1;
                Ok(JoinSpec { primary_key, link })
            }
            None => Err(self.error("unbalanced '[': expected ']'")),
            Some(c) => Err(self.error(format!("expected ']', found '{c}'"))),
        }
    }

    #[allow(clippy::result_large_err)]
    fn assemble(&self, mut segments: Vec<Segment>, target: Target) -> Result<PathExpr> {
        let mut acc = match target {
            Target::Column => {
                let last = segments
                    .pop()
                    .ok_or_else(|| self.error("expected identifier"))?;
                if last.spec.is_some() {
                    return Err(self.error(format!(
                        "path must end with a column, '{}' is a joined table",
                        last.name
                    )));
                }
                Some(PathExpr::Column(last.name))
            }
            Target::Table => None,
        };
        while let Some(segment) = segments.pop() {
            acc = Some(self.join(segment, acc));
        }
        acc.ok_or_else(|| self.error("expected identifier"))
    }

    fn join(&self, segment: Segment, inner: Option<PathExpr>) -> PathExpr {
        let (primary_key, link) = match segment.spec {
            Some(JoinSpec { primary_key, link }) => (
                primary_key.unwrap_or_else(|| self.defaults.primary_key.clone()),
                link,
            ),
            None => (
                self.defaults.primary_key.clone(),
                PathExpr::Column(self.defaults.link_column(&segment.name)),
            ),
        };
        PathExpr::Join {
            table: segment.name,
            primary_key,
            link: Box::new(link),
            inner: inner.map(Box::new),
        }
    }
}
