//! Per-family comparison operators.
//!
//! Each [`Family`] has its own closed operator set. Rendering is exhaustive:
//! there is no fallback operator.

use crate::column::Column;
use crate::statement::StatementBuilder;
use crate::value::{Arg, Family};

/// Text comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextOperation {
    /// `col = $k`
    Equal,
    /// `col <> $k`
    NotEqual,
    /// `col LIKE $k || '%'`
    StartsWith,
    /// `col LIKE '%' || $k || '%'`
    Contains,
    EqualIgnoreCase,
    NotEqualIgnoreCase,
    StartsWithIgnoreCase,
    ContainsIgnoreCase,
}

impl TextOperation {
    fn ignores_case(self) -> bool {
        matches!(
            self,
            Self::EqualIgnoreCase
                | Self::NotEqualIgnoreCase
                | Self::StartsWithIgnoreCase
                | Self::ContainsIgnoreCase
        )
    }

    fn write(self, builder: &mut StatementBuilder, column: &Column, value: &Arg) {
        // Ignore-case variants lower both the column and the value.
        if self.ignores_case() {
            Column::lower(column.clone()).write_qualified(builder);
        } else {
            column.write_qualified(builder);
        }
        match self {
            Self::Equal | Self::EqualIgnoreCase => {
                builder.write_str(" = ");
                self.write_value(builder, value);
            }
            Self::NotEqual | Self::NotEqualIgnoreCase => {
                builder.write_str(" <> ");
                self.write_value(builder, value);
            }
            Self::StartsWith | Self::StartsWithIgnoreCase => {
                builder.write_str(" LIKE ");
                self.write_value(builder, value);
                builder.write_str(" || '%'");
            }
            Self::Contains | Self::ContainsIgnoreCase => {
                builder.write_str(" LIKE '%' || ");
                self.write_value(builder, value);
                builder.write_str(" || '%'");
            }
        }
    }

    fn write_value(self, builder: &mut StatementBuilder, value: &Arg) {
        if self.ignores_case() {
            builder.write_arg(Arg::lower(value.clone()));
        } else {
            builder.write_arg_ref(value);
        }
    }
}

/// Numeric, timestamp and interval comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberOperation {
    Equal,
    NotEqual,
    LessThan,
    /// Renders `<=`.
    AtLeast,
    GreaterThan,
    /// Renders `>=`.
    AtMost,
}

impl NumberOperation {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::LessThan => "<",
            Self::AtLeast => "<=",
            Self::GreaterThan => ">",
            Self::AtMost => ">=",
        }
    }
}

/// Boolean comparison. The operator only documents intent: the bound value
/// decides what is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanOperation {
    IsTrue,
    IsFalse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BytesOperation {
    Equal,
    NotEqual,
}

impl BytesOperation {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "<>",
        }
    }
}

/// An operator of any family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Text(TextOperation),
    Number(NumberOperation),
    Boolean(BooleanOperation),
    Bytes(BytesOperation),
}

impl Operation {
    pub const fn family(self) -> Family {
        match self {
            Self::Text(_) => Family::Text,
            Self::Number(_) => Family::Number,
            Self::Boolean(_) => Family::Boolean,
            Self::Bytes(_) => Family::Bytes,
        }
    }

    /// Whether a value of `family` can be compared with this operator.
    pub const fn accepts(self, family: Option<Family>) -> bool {
        matches!(
            (self, family),
            (Self::Text(_), Some(Family::Text | Family::Bytes))
                | (Self::Number(_), Some(Family::Number))
                | (Self::Boolean(_), Some(Family::Boolean))
                | (Self::Bytes(_), Some(Family::Bytes))
        )
    }

    /// Whether a match pins the column to a single value.
    pub(crate) const fn is_equality(self) -> bool {
        matches!(
            self,
            Self::Text(TextOperation::Equal)
                | Self::Number(NumberOperation::Equal)
                | Self::Boolean(_)
                | Self::Bytes(BytesOperation::Equal)
        )
    }

    /// Write `<column> <op> <value>`.
    pub fn write(self, builder: &mut StatementBuilder, column: &Column, value: &Arg) {
        let symbol = match self {
            Self::Text(op) => return op.write(builder, column, value),
            Self::Number(op) => op.symbol(),
            Self::Boolean(_) => "=",
            Self::Bytes(op) => op.symbol(),
        };
        column.write_qualified(builder);
        builder.write_char(' ');
        builder.write_str(symbol);
        builder.write_char(' ');
        builder.write_arg_ref(value);
    }
}

impl From<TextOperation> for Operation {
    fn from(op: TextOperation) -> Self {
        Self::Text(op)
    }
}

impl From<NumberOperation> for Operation {
    fn from(op: NumberOperation) -> Self {
        Self::Number(op)
    }
}

impl From<BooleanOperation> for Operation {
    fn from(op: BooleanOperation) -> Self {
        Self::Boolean(op)
    }
}

impl From<BytesOperation> for Operation {
    fn from(op: BytesOperation) -> Self {
        Self::Bytes(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(op: impl Into<Operation>, value: impl Into<Arg>) -> (String, usize) {
        let mut builder = StatementBuilder::default();
        op.into()
            .write(&mut builder, &Column::new("users", "name"), &value.into());
        (builder.sql().to_string(), builder.args().len())
    }

    #[test]
    fn text_operations() {
        assert_eq!(render(TextOperation::Equal, "a").0, "users.name = $1");
        assert_eq!(render(TextOperation::NotEqual, "a").0, "users.name <> $1");
        assert_eq!(
            render(TextOperation::StartsWith, "a").0,
            "users.name LIKE $1 || '%'"
        );
        assert_eq!(
            render(TextOperation::Contains, "a").0,
            "users.name LIKE '%' || $1 || '%'"
        );
    }

    #[test]
    fn ignore_case_lowers_both_sides() {
        assert_eq!(
            render(TextOperation::EqualIgnoreCase, "A"),
            ("LOWER(users.name) = LOWER($1)".to_string(), 1)
        );
        assert_eq!(
            render(TextOperation::NotEqualIgnoreCase, "A").0,
            "LOWER(users.name) <> LOWER($1)"
        );
        assert_eq!(
            render(TextOperation::StartsWithIgnoreCase, "A").0,
            "LOWER(users.name) LIKE LOWER($1) || '%'"
        );
        assert_eq!(
            render(TextOperation::ContainsIgnoreCase, "A").0,
            "LOWER(users.name) LIKE '%' || LOWER($1) || '%'"
        );
    }

    #[test]
    fn number_symbols() {
        let cases = [
            (NumberOperation::Equal, "="),
            (NumberOperation::NotEqual, "<>"),
            (NumberOperation::LessThan, "<"),
            (NumberOperation::AtLeast, "<="),
            (NumberOperation::GreaterThan, ">"),
            (NumberOperation::AtMost, ">="),
        ];
        for (op, symbol) in cases {
            assert_eq!(render(op, 1_i32).0, format!("users.name {symbol} $1"));
        }
    }

    #[test]
    fn boolean_binds_value() {
        assert_eq!(
            render(BooleanOperation::IsTrue, true),
            ("users.name = $1".to_string(), 1)
        );
        assert_eq!(render(BooleanOperation::IsFalse, false).0, "users.name = $1");
    }

    #[test]
    fn bytes_operations() {
        assert_eq!(render(BytesOperation::Equal, vec![1_u8]).0, "users.name = $1");
        assert_eq!(render(BytesOperation::NotEqual, vec![1_u8]).0, "users.name <> $1");
    }

    #[test]
    fn accepted_families() {
        let text = Operation::from(TextOperation::StartsWith);
        assert!(text.accepts(Some(Family::Text)));
        assert!(text.accepts(Some(Family::Bytes)));
        assert!(!text.accepts(Some(Family::Number)));
        assert!(!text.accepts(None));

        let bytes = Operation::from(BytesOperation::Equal);
        assert!(bytes.accepts(Some(Family::Bytes)));
        assert!(!bytes.accepts(Some(Family::Text)));
        assert!(Operation::from(NumberOperation::LessThan).accepts(Some(Family::Number)));
        assert!(!Operation::from(BooleanOperation::IsTrue).accepts(Some(Family::Number)));
    }

    #[test]
    fn families_and_equality() {
        assert_eq!(Operation::from(TextOperation::Contains).family(), Family::Text);
        assert_eq!(Operation::from(NumberOperation::AtMost).family(), Family::Number);
        assert!(Operation::from(TextOperation::Equal).is_equality());
        assert!(!Operation::from(TextOperation::EqualIgnoreCase).is_equality());
        assert!(Operation::from(BooleanOperation::IsFalse).is_equality());
        assert!(!Operation::from(NumberOperation::LessThan).is_equality());
    }
}
