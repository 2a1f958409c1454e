//! Statement assembly: SQL text plus ordered, deduplicated arguments.

use crate::value::{Arg, ArgKey, Value};
use std::collections::HashMap;
use std::fmt;
use tokio_postgres::types::ToSql;

/// Accumulates SQL text and bound arguments, minting `$1, $2, ...`.
///
/// A value equal in both value and concrete type to one written earlier reuses
/// its placeholder. Instructions (`NOW()`, `NULL`, `DEFAULT`) are written
/// inline and never consume a position.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct StatementBuilder {
    sql: String,
    args: Vec<Value>,
    positions: HashMap<ArgKey, usize>,
}

impl StatementBuilder {
    /// Create a builder with an initial SQL fragment.
    pub fn new(initial_sql: impl Into<String>) -> Self {
        Self {
            sql: initial_sql.into(),
            ..Self::default()
        }
    }

    /// Append raw SQL.
    pub fn write_str(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    pub fn write_char(&mut self, c: char) -> &mut Self {
        self.sql.push(c);
        self
    }

    /// Write an argument, binding it as a placeholder when it is a value.
    pub fn write_arg(&mut self, arg: impl Into<Arg>) -> &mut Self {
        let arg = arg.into();
        self.write_arg_ref(&arg)
    }

    pub fn write_arg_ref(&mut self, arg: &Arg) -> &mut Self {
        match arg {
            Arg::Value(value) => {
                let position = self.bind(value);
                self.sql.push('$');
                self.sql.push_str(&position.to_string());
            }
            Arg::Instruction(instruction) => {
                self.sql.push_str(instruction.as_sql());
            }
            Arg::Function(function, inner) => {
                self.sql.push_str(function.name());
                self.sql.push('(');
                self.write_arg_ref(inner);
                self.sql.push(')');
            }
            Arg::Coalesce(arg, fallback) => {
                self.sql.push_str("COALESCE(");
                self.write_arg_ref(arg);
                self.sql.push_str(", ");
                self.write_arg_ref(fallback);
                self.sql.push(')');
            }
        }
        self
    }

    /// Write several arguments, comma-separated.
    pub fn write_args<I>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        for (i, arg) in args.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.write_arg(arg);
        }
        self
    }

    fn bind(&mut self, value: &Value) -> usize {
        let key = value.dedup_key();
        if let Some(&position) = self.positions.get(&key) {
            return position;
        }
        self.args.push(value.clone());
        let position = self.args.len();
        self.positions.insert(key, position);
        position
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn build(self) -> Statement {
        Statement {
            sql: self.sql,
            args: self.args,
        }
    }
}

impl fmt::Write for StatementBuilder {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.sql.push_str(s);
        Ok(())
    }
}

/// Rendered SQL and its arguments, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
}

impl Statement {
    /// Arguments borrowed in the shape the driver expects.
    pub fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.args.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

#[cfg(test)]
mod tests;
