//! Column references.
//!
//! A [`Column`] is either a table-qualified name, a function applied to an
//! inner column, or an inner column with a `COALESCE` fallback. Wrapping nests
//! freely: `Column::lower(Column::sha256(c))` renders `LOWER(SHA256(t.c))`.

use crate::statement::StatementBuilder;
use crate::value::Arg;
use std::borrow::Cow;

/// SQL functions that can wrap both columns and argument values, so that
/// both sides of a comparison get the same transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlFunction {
    Lower,
    Sha256,
}

impl SqlFunction {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Lower => "LOWER",
            Self::Sha256 => "SHA256",
        }
    }
}

/// A column reference.
///
/// Equality is structural: a plain column never equals a function-wrapped
/// column, even over the same name.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// `table.name`
    Table {
        table: Cow<'static, str>,
        name: Cow<'static, str>,
    },
    /// `FUNCTION(inner)`
    Function {
        function: SqlFunction,
        inner: Box<Column>,
    },
    /// `COALESCE(inner, fallback)`
    Coalesce {
        inner: Box<Column>,
        fallback: Box<Arg>,
    },
}

impl Column {
    pub fn new(table: impl Into<Cow<'static, str>>, name: impl Into<Cow<'static, str>>) -> Self {
        Self::Table {
            table: table.into(),
            name: name.into(),
        }
    }

    /// Wrap a column in `LOWER(...)`.
    pub fn lower(inner: Column) -> Self {
        Self::wrap(SqlFunction::Lower, inner)
    }

    /// Wrap a column in `SHA256(...)`.
    pub fn sha256(inner: Column) -> Self {
        Self::wrap(SqlFunction::Sha256, inner)
    }

    /// `COALESCE(inner, fallback)`; the fallback is bound like any argument.
    pub fn coalesce(inner: Column, fallback: impl Into<Arg>) -> Self {
        Self::Coalesce {
            inner: Box::new(inner),
            fallback: Box::new(fallback.into()),
        }
    }

    pub fn wrap(function: SqlFunction, inner: Column) -> Self {
        Self::Function {
            function,
            inner: Box::new(inner),
        }
    }

    /// The table qualifier of the innermost column.
    pub fn table(&self) -> &str {
        match self {
            Self::Table { table, .. } => table,
            Self::Function { inner, .. } | Self::Coalesce { inner, .. } => inner.table(),
        }
    }

    /// The name of the innermost column.
    pub fn name(&self) -> &str {
        match self {
            Self::Table { name, .. } => name,
            Self::Function { inner, .. } | Self::Coalesce { inner, .. } => inner.name(),
        }
    }

    /// Write `table.name` (wrapped in any functions).
    pub fn write_qualified(&self, builder: &mut StatementBuilder) {
        match self {
            Self::Table { table, name } => {
                builder.write_str(table);
                builder.write_char('.');
                builder.write_str(name);
            }
            Self::Function { function, inner } => {
                builder.write_str(function.name());
                builder.write_char('(');
                inner.write_qualified(builder);
                builder.write_char(')');
            }
            Self::Coalesce { inner, fallback } => {
                builder.write_str("COALESCE(");
                inner.write_qualified(builder);
                builder.write_str(", ");
                builder.write_arg_ref(fallback);
                builder.write_char(')');
            }
        }
    }

    /// Write `name` (wrapped in any functions).
    pub fn write_unqualified(&self, builder: &mut StatementBuilder) {
        match self {
            Self::Table { name, .. } => {
                builder.write_str(name);
            }
            Self::Function { function, inner } => {
                builder.write_str(function.name());
                builder.write_char('(');
                inner.write_unqualified(builder);
                builder.write_char(')');
            }
            Self::Coalesce { inner, fallback } => {
                builder.write_str("COALESCE(");
                inner.write_unqualified(builder);
                builder.write_str(", ");
                builder.write_arg_ref(fallback);
                builder.write_char(')');
            }
        }
    }

    /// Compare against an optional column. A present column never equals an
    /// absent one.
    pub fn equals(&self, other: Option<&Column>) -> bool {
        other.is_some_and(|other| self == other)
    }
}

/// Optional column equality: two absent columns are equal, an absent and a
/// present column never are.
pub fn columns_equal(a: Option<&Column>, b: Option<&Column>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), b) => a.equals(b),
        (None, Some(_)) => false,
    }
}

/// An ordered list of columns rendered comma-separated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Columns(pub Vec<Column>);

impl Columns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: Column) -> &mut Self {
        self.0.push(column);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, column: &Column) -> bool {
        self.0.contains(column)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.0.iter()
    }

    pub fn write_qualified(&self, builder: &mut StatementBuilder) {
        for (i, column) in self.0.iter().enumerate() {
            if i > 0 {
                builder.write_str(", ");
            }
            column.write_qualified(builder);
        }
    }

    pub fn write_unqualified(&self, builder: &mut StatementBuilder) {
        for (i, column) in self.0.iter().enumerate() {
            if i > 0 {
                builder.write_str(", ");
            }
            column.write_unqualified(builder);
        }
    }
}

impl From<Vec<Column>> for Columns {
    fn from(columns: Vec<Column>) -> Self {
        Self(columns)
    }
}

impl FromIterator<Column> for Columns {
    fn from_iter<I: IntoIterator<Item = Column>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Columns {
    type Item = &'a Column;
    type IntoIter = std::slice::Iter<'a, Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
