//! Declarative table metadata and a typed SELECT builder.
//!
//! Tables are `const` [`TableDef`]s. Which tables may be joined, and on
//! which columns, is recorded once in a [`JoinRegistry`]; a [`Query`] then
//! assembles a full SELECT for an [`Object`] type and scans the results.
//!
//! ```ignore
//! let registry = JoinRegistry::standard()?;
//! let users: Vec<User> = Query::<User>::new(USERS, &registry)
//!     .join(&ORGS)
//!     .filter(Condition::text(ORGS.column("name"), TextOperation::Equal, "acme"))
//!     .order_by(USERS.column("username"), OrderDirection::Ascending)
//!     .limit(20)
//!     .results(&pool)
//!     .await?
//!     .collect()
//!     .await?;
//! ```

mod query;
mod registry;

pub use query::{Object, Query, Results};
pub use registry::JoinRegistry;

use crate::column::{Column, Columns};
use crate::condition::Condition;
use crate::statement::StatementBuilder;

/// Static metadata for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableDef {
    pub schema: &'static str,
    pub name: &'static str,
    pub alias: Option<&'static str>,
    pub columns: &'static [&'static str],
}

impl TableDef {
    pub const fn new(
        schema: &'static str,
        name: &'static str,
        columns: &'static [&'static str],
    ) -> Self {
        Self {
            schema,
            name,
            alias: None,
            columns,
        }
    }

    pub const fn with_alias(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }

    /// The name columns are qualified with: the alias if set, else the table name.
    pub fn qualifier(&self) -> &'static str {
        self.alias.unwrap_or(self.name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(&name)
    }

    /// A column of this table, qualified with [`TableDef::qualifier`].
    pub fn column(&self, name: &'static str) -> Column {
        Column::new(self.qualifier(), name)
    }

    /// Whether `column` is one of this table's declared columns, under its qualifier.
    pub fn owns(&self, column: &Column) -> bool {
        column.table() == self.qualifier() && self.has_column(column.name())
    }

    /// Every declared column, in declaration order.
    pub fn all_columns(&self) -> Columns {
        self.columns.iter().map(|name| self.column(name)).collect()
    }

    /// `schema.name[ AS alias]`
    /// `EXISTS (SELECT 1 FROM <this table> WHERE <condition>)`.
    pub fn exists(&self, condition: Condition) -> Condition {
        Condition::exists(self.from_clause(), condition)
    }

    pub fn from_clause(&self) -> String {
        match self.alias {
            Some(alias) => format!("{}.{} AS {alias}", self.schema, self.name),
            None => format!("{}.{}", self.schema, self.name),
        }
    }

    pub fn write_from(&self, builder: &mut StatementBuilder) {
        builder.write_str(&self.from_clause());
    }
}

pub const INSTANCES: TableDef = TableDef::new(
    "core",
    "instances",
    &["id", "name", "default_org_id", "created_at", "updated_at"],
);

pub const ORGS: TableDef = TableDef::new(
    "core",
    "orgs",
    &["id", "instance_id", "name", "state", "created_at", "updated_at"],
);

pub const USERS: TableDef = TableDef::new(
    "core",
    "users",
    &[
        "id",
        "instance_id",
        "org_id",
        "username",
        "state",
        "created_at",
        "updated_at",
    ],
);

#[cfg(test)]
mod tests;
