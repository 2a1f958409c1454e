//! Boolean condition trees.
//!
//! A [`Condition`] is immutable once built and performs no semantic
//! validation: conditions over columns of other tables are legal and are
//! rendered as-is.

use crate::column::Column;
use crate::operation::{
    BooleanOperation, BytesOperation, NumberOperation, Operation, TextOperation,
};
use crate::statement::StatementBuilder;
use crate::value::Arg;
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq)]
enum ConditionInner {
    And(Vec<Condition>),
    Or(Vec<Condition>),
    IsNull(Column),
    IsNotNull(Column),
    Compare {
        column: Column,
        operation: Operation,
        value: Arg,
    },
    ColumnsEqual(Column, Column),
    Exists {
        table: Cow<'static, str>,
        condition: Box<Condition>,
    },
}

/// A node of a WHERE / ON expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition(ConditionInner);

impl Condition {
    /// Conjunction. Parenthesized only with two or more children.
    pub fn and(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self(ConditionInner::And(conditions.into_iter().collect()))
    }

    /// Disjunction. Parenthesized only with two or more children.
    pub fn or(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self(ConditionInner::Or(conditions.into_iter().collect()))
    }

    pub fn is_null(column: Column) -> Self {
        Self(ConditionInner::IsNull(column))
    }

    pub fn is_not_null(column: Column) -> Self {
        Self(ConditionInner::IsNotNull(column))
    }

    /// Compare a column against a value with an operator of the value's family.
    /// Text operators also take byte sequences.
    ///
    /// # Panics
    ///
    /// Panics if the value does not belong to the operator's family.
    pub fn compare(column: Column, operation: impl Into<Operation>, value: impl Into<Arg>) -> Self {
        let operation = operation.into();
        let value = value.into();
        let family = operation.family();
        assert!(
            operation.accepts(value.family()),
            "{family} operation {operation:?} cannot compare {value:?}"
        );
        Self(ConditionInner::Compare {
            column,
            operation,
            value,
        })
    }

    pub fn text(column: Column, operation: TextOperation, value: impl Into<Arg>) -> Self {
        Self::compare(column, operation, value)
    }

    pub fn number(column: Column, operation: NumberOperation, value: impl Into<Arg>) -> Self {
        Self::compare(column, operation, value)
    }

    /// `col = $k` with the boolean bound.
    pub fn boolean(column: Column, value: bool) -> Self {
        let operation = if value {
            BooleanOperation::IsTrue
        } else {
            BooleanOperation::IsFalse
        };
        Self::compare(column, operation, value)
    }

    pub fn bytes(column: Column, operation: BytesOperation, value: impl Into<Arg>) -> Self {
        Self::compare(column, operation, value)
    }

    /// `a = b`, typically a join's ON clause.
    pub fn columns_equal(a: Column, b: Column) -> Self {
        Self(ConditionInner::ColumnsEqual(a, b))
    }

    /// `EXISTS (SELECT 1 FROM <table> WHERE <condition>)`, usually correlated
    /// with the outer query through [`Condition::columns_equal`].
    pub fn exists(table: impl Into<Cow<'static, str>>, condition: Condition) -> Self {
        Self(ConditionInner::Exists {
            table: table.into(),
            condition: Box::new(condition),
        })
    }

    /// Whether this condition renders nothing: an AND/OR whose children are
    /// all empty, recursively.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            ConditionInner::And(children) | ConditionInner::Or(children) => {
                children.iter().all(Condition::is_empty)
            }
            _ => false,
        }
    }

    /// Whether this condition pins `column` to a single value (by equality or
    /// `IS NULL`) in every row it matches.
    ///
    /// An AND restricts if any child does; an OR only if it has children and
    /// all of them do.
    pub fn is_restricting_column(&self, column: &Column) -> bool {
        match &self.0 {
            ConditionInner::And(children) => children.iter().any(|c| c.is_restricting_column(column)),
            ConditionInner::Or(children) => {
                !children.is_empty() && children.iter().all(|c| c.is_restricting_column(column))
            }
            ConditionInner::IsNull(c) => c == column,
            ConditionInner::IsNotNull(_) => false,
            ConditionInner::Compare {
                column: c,
                operation,
                ..
            } => c == column && operation.is_equality(),
            ConditionInner::ColumnsEqual(a, b) => a == column || b == column,
            ConditionInner::Exists { .. } => false,
        }
    }

    pub fn write(&self, builder: &mut StatementBuilder) {
        match &self.0 {
            ConditionInner::And(children) => write_group(builder, children, " AND "),
            ConditionInner::Or(children) => write_group(builder, children, " OR "),
            ConditionInner::IsNull(column) => {
                column.write_qualified(builder);
                builder.write_str(" IS NULL");
            }
            ConditionInner::IsNotNull(column) => {
                column.write_qualified(builder);
                builder.write_str(" IS NOT NULL");
            }
            ConditionInner::Compare {
                column,
                operation,
                value,
            } => operation.write(builder, column, value),
            ConditionInner::ColumnsEqual(a, b) => {
                a.write_qualified(builder);
                builder.write_str(" = ");
                b.write_qualified(builder);
            }
            ConditionInner::Exists { table, condition } => {
                builder.write_str("EXISTS (SELECT 1 FROM ");
                builder.write_str(table);
                condition.write_where(builder);
                builder.write_char(')');
            }
        }
    }

    /// Write ` WHERE <condition>`, or nothing if the condition is empty.
    pub fn write_where(&self, builder: &mut StatementBuilder) {
        if !self.is_empty() {
            builder.write_str(" WHERE ");
            self.write(builder);
        }
    }
}

fn write_group(builder: &mut StatementBuilder, children: &[Condition], separator: &str) {
    // Empty children render nothing and must not leave a dangling separator.
    let children: Vec<&Condition> = children.iter().filter(|c| !c.is_empty()).collect();
    match children.as_slice() {
        [] => {}
        [only] => only.write(builder),
        _ => {
            builder.write_char('(');
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    builder.write_str(separator);
                }
                child.write(builder);
            }
            builder.write_char(')');
        }
    }
}
