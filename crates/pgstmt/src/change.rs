//! Column assignments for UPDATE `SET` lists, and data-modifying CTEs that
//! run alongside them.

use crate::column::Column;
use crate::error::{DbError, DbResult};
use crate::statement::StatementBuilder;
use crate::value::{Arg, Instruction, Value};
use std::fmt;
use std::sync::Arc;

type WriteFn = dyn Fn(&mut StatementBuilder) + Send + Sync;

#[derive(Debug, Clone, PartialEq)]
enum ChangeInner {
    Set {
        column: Column,
        value: Arg,
    },
    Increment {
        column: Column,
        source: Column,
    },
    SetJson {
        column: Column,
        path: Vec<String>,
        value: serde_json::Value,
    },
    Cte(CteChange),
}

/// A statement written into a `WITH` clause ahead of the UPDATE, plus an
/// optional assignment for the SET list.
#[derive(Clone)]
struct CteChange {
    write: Arc<WriteFn>,
    change: Option<Box<Change>>,
}

impl CteChange {
    fn render(&self) -> (String, Vec<Value>) {
        let mut builder = StatementBuilder::default();
        (self.write)(&mut builder);
        let stmt = builder.build();
        (stmt.sql, stmt.args)
    }
}

impl PartialEq for CteChange {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.write, &other.write) && self.change == other.change
    }
}

impl fmt::Debug for CteChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CteChange")
            .field("sql", &self.render().0)
            .field("change", &self.change)
            .finish()
    }
}

/// A single `col = <value>` assignment. Columns render unqualified.
#[derive(Debug, Clone, PartialEq)]
pub struct Change(ChangeInner);

impl Change {
    pub fn new(column: Column, value: impl Into<Arg>) -> Self {
        Self(ChangeInner::Set {
            column,
            value: value.into(),
        })
    }

    /// `col = $k` for `Some`, `col = NULL` for `None`. `None` binds nothing.
    pub fn from_option<T: Into<Arg>>(column: Column, value: Option<T>) -> Self {
        match value {
            Some(value) => Self::new(column, value),
            None => Self::to_null(column),
        }
    }

    pub fn to_null(column: Column) -> Self {
        Self::new(column, Instruction::Null)
    }

    /// `col = col + 1`
    pub fn increment(column: Column) -> Self {
        Self::increment_from(column.clone(), column)
    }

    /// `col = <source> + 1`, e.g. with `source` a
    /// [`Column::coalesce`] over `col`.
    pub fn increment_from(column: Column, source: Column) -> Self {
        Self(ChangeInner::Increment { column, source })
    }

    /// `col = jsonb_set(col, ARRAY[$path...], $value)`. Path segments and the
    /// value are bound as arguments.
    pub fn set_json<P>(column: Column, path: P, value: impl Into<serde_json::Value>) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self(ChangeInner::SetJson {
            column,
            path: path.into_iter().map(Into::into).collect(),
            value: value.into(),
        })
    }

    /// A change that writes a whole statement into the UPDATE's `WITH`
    /// clause, sharing the outer builder's placeholders. `change`, if
    /// given, is written into the SET list as usual.
    pub fn cte<F>(write: F, change: Option<Change>) -> Self
    where
        F: Fn(&mut StatementBuilder) + Send + Sync + 'static,
    {
        Self(ChangeInner::Cte(CteChange {
            write: Arc::new(write),
            change: change.map(Box::new),
        }))
    }

    /// The assigned column. `None` for a CTE change without a SET assignment.
    pub fn column(&self) -> Option<&Column> {
        match &self.0 {
            ChangeInner::Set { column, .. }
            | ChangeInner::Increment { column, .. }
            | ChangeInner::SetJson { column, .. } => Some(column),
            ChangeInner::Cte(cte) => cte.change.as_deref().and_then(Change::column),
        }
    }

    pub fn is_cte(&self) -> bool {
        matches!(self.0, ChangeInner::Cte(_))
    }

    /// Whether [`Change::write`] renders anything.
    fn has_assignment(&self) -> bool {
        match &self.0 {
            ChangeInner::Cte(cte) => cte.change.as_ref().is_some_and(|c| c.has_assignment()),
            _ => true,
        }
    }

    /// Write the SET assignment.
    pub fn write(&self, builder: &mut StatementBuilder) {
        match &self.0 {
            ChangeInner::Set { column, value } => {
                column.write_unqualified(builder);
                builder.write_str(" = ");
                builder.write_arg_ref(value);
            }
            ChangeInner::Increment { column, source } => {
                column.write_unqualified(builder);
                builder.write_str(" = ");
                source.write_unqualified(builder);
                builder.write_str(" + 1");
            }
            ChangeInner::SetJson {
                column,
                path,
                value,
            } => {
                column.write_unqualified(builder);
                builder.write_str(" = jsonb_set(");
                column.write_unqualified(builder);
                if path.is_empty() {
                    builder.write_str(", ARRAY[]::TEXT[], ");
                } else {
                    builder.write_str(", ARRAY[");
                    builder.write_args(path.iter().map(String::as_str));
                    builder.write_str("], ");
                }
                builder.write_arg(value.clone());
                builder.write_char(')');
            }
            ChangeInner::Cte(cte) => {
                if let Some(change) = &cte.change {
                    change.write(builder);
                }
            }
        }
    }

    /// Write the CTE statement. Other changes write nothing.
    pub fn write_cte(&self, builder: &mut StatementBuilder) {
        if let ChangeInner::Cte(cte) = &self.0 {
            (cte.write)(builder);
        }
    }

    /// Structural match against an expected change. CTE changes match when
    /// they render the same statement and arguments.
    pub fn matches(&self, other: &Change) -> bool {
        match (&self.0, &other.0) {
            (ChangeInner::Cte(a), ChangeInner::Cte(b)) => {
                let change_matches = match (&a.change, &b.change) {
                    (Some(a), Some(b)) => a.matches(b),
                    (None, None) => true,
                    _ => false,
                };
                change_matches && a.render() == b.render()
            }
            _ => self == other,
        }
    }
}

/// An ordered list of changes rendered comma-separated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes(Vec<Change>);

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: Change) -> &mut Self {
        self.0.push(change);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.0.iter()
    }

    /// Whether any change assigns `column`.
    pub fn is_on_column(&self, column: &Column) -> bool {
        self.0.iter().any(|c| c.column() == Some(column))
    }

    /// UPDATE without SET is rejected.
    pub fn require_any(&self) -> DbResult<()> {
        if self.0.is_empty() {
            return Err(DbError::NoChanges);
        }
        Ok(())
    }

    pub fn matches(&self, other: &Changes) -> bool {
        self.0.len() == other.0.len() && self.0.iter().zip(&other.0).all(|(a, b)| a.matches(b))
    }

    pub fn has_ctes(&self) -> bool {
        self.0.iter().any(Change::is_cte)
    }

    /// Append `, cte_<i> AS (<statement>)` for every CTE change, `i` being its
    /// position in the list. Expects an open `WITH` clause.
    pub fn write_ctes(&self, builder: &mut StatementBuilder) {
        for (i, change) in self.0.iter().enumerate().filter(|(_, c)| c.is_cte()) {
            builder.write_str(", cte_");
            builder.write_str(&i.to_string());
            builder.write_str(" AS (");
            change.write_cte(builder);
            builder.write_char(')');
        }
    }

    /// Write the SET list. CTE changes without an assignment are skipped.
    pub fn write(&self, builder: &mut StatementBuilder) {
        for (i, change) in self.0.iter().filter(|c| c.has_assignment()).enumerate() {
            if i > 0 {
                builder.write_str(", ");
            }
            change.write(builder);
        }
    }
}

impl From<Change> for Changes {
    fn from(change: Change) -> Self {
        Self(vec![change])
    }
}

impl From<Vec<Change>> for Changes {
    fn from(changes: Vec<Change>) -> Self {
        Self(changes)
    }
}

impl FromIterator<Change> for Changes {
    fn from_iter<I: IntoIterator<Item = Change>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Changes {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
