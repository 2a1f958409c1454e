//! Trailing SELECT clauses: joins, filter, grouping, ordering, paging, locking.

use crate::column::{Column, Columns};
use crate::condition::Condition;
use crate::statement::StatementBuilder;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: Column,
    pub direction: OrderDirection,
}

impl OrderBy {
    pub fn asc(column: Column) -> Self {
        Self {
            column,
            direction: OrderDirection::Ascending,
        }
    }

    pub fn desc(column: Column) -> Self {
        Self {
            column,
            direction: OrderDirection::Descending,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Full,
}

impl JoinType {
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
        }
    }
}

/// `<kind> <table> ON <condition>`
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinType,
    pub table: String,
    pub on: Condition,
}

impl Join {
    pub fn new(kind: JoinType, table: impl Into<String>, on: Condition) -> Self {
        Self {
            kind,
            table: table.into(),
            on,
        }
    }

    fn write(&self, builder: &mut StatementBuilder) {
        builder.write_char(' ');
        builder.write_str(self.kind.as_sql());
        builder.write_char(' ');
        builder.write_str(&self.table);
        builder.write_str(" ON ");
        if self.on.is_empty() {
            builder.write_str("TRUE");
        } else {
            self.on.write(builder);
        }
    }
}

/// Options appended after the FROM clause of a SELECT.
///
/// Clauses are emitted in this order, each with a leading space:
/// JOIN, WHERE, GROUP BY, ORDER BY, LIMIT, OFFSET, FOR UPDATE. Unset parts
/// are omitted, so default options render nothing. A zero limit or offset
/// counts as unset.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use]
pub struct QueryOptions {
    pub condition: Option<Condition>,
    pub joins: Vec<Join>,
    pub order_by: Vec<OrderBy>,
    pub group_by: Columns,
    pub limit: u32,
    pub offset: u32,
    pub lock: bool,
    /// Carried for the caller; never rendered.
    pub permission_check: Option<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the WHERE condition, replacing any previous one.
    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn left_join(self, table: impl Into<String>, on: Condition) -> Self {
        self.join(Join::new(JoinType::Left, table, on))
    }

    pub fn order_by(mut self, column: Column, direction: OrderDirection) -> Self {
        self.order_by.push(OrderBy { column, direction });
        self
    }

    pub fn group_by(mut self, column: Column) -> Self {
        self.group_by.push(column);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Append `FOR UPDATE`.
    pub fn lock(mut self) -> Self {
        self.lock = true;
        self
    }

    pub fn permission_check(mut self, permission: impl Into<String>) -> Self {
        self.permission_check = Some(permission.into());
        self
    }

    pub fn write(&self, builder: &mut StatementBuilder) {
        for join in &self.joins {
            join.write(builder);
        }
        if let Some(condition) = &self.condition {
            condition.write_where(builder);
        }
        if !self.group_by.is_empty() {
            builder.write_str(" GROUP BY ");
            self.group_by.write_qualified(builder);
        }
        if !self.order_by.is_empty() {
            builder.write_str(" ORDER BY ");
            for (i, order) in self.order_by.iter().enumerate() {
                if i > 0 {
                    builder.write_str(", ");
                }
                order.column.write_qualified(builder);
                if order.direction == OrderDirection::Descending {
                    builder.write_str(" DESC");
                }
            }
        }
        if self.limit > 0 {
            builder.write_str(" LIMIT ");
            builder.write_arg(i64::from(self.limit));
        }
        if self.offset > 0 {
            builder.write_str(" OFFSET ");
            builder.write_arg(i64::from(self.offset));
        }
        if self.lock {
            builder.write_str(" FOR UPDATE");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::NumberOperation;
    use crate::value::Value;

    fn render(options: &QueryOptions) -> (String, Vec<Value>) {
        let mut builder = StatementBuilder::default();
        options.write(&mut builder);
        let stmt = builder.build();
        (stmt.sql, stmt.args)
    }

    #[test]
    fn empty_options_render_nothing() {
        let (sql, args) = render(&QueryOptions::default());
        assert_eq!(sql, "");
        assert!(args.is_empty());
    }

    #[test]
    fn full_options() {
        let column = Column::new("table", "column");
        let options = QueryOptions::new()
            .left_join(
                "other_table",
                Condition::columns_equal(
                    Column::new("table", "id"),
                    Column::new("other_table", "table_id"),
                ),
            )
            .condition(Condition::number(
                column.clone(),
                NumberOperation::Equal,
                123_i32,
            ))
            .order_by(column, OrderDirection::Descending)
            .limit(10)
            .offset(5)
            .lock();

        let (sql, args) = render(&options);
        assert_eq!(
            sql,
            " LEFT JOIN other_table ON table.id = other_table.table_id WHERE table.column = $1 ORDER BY table.column DESC LIMIT $2 OFFSET $3 FOR UPDATE"
        );
        assert_eq!(
            args,
            vec![Value::from(123_i32), Value::from(10_i64), Value::from(5_i64)]
        );
    }

    #[test]
    fn group_by_precedes_order_by() {
        let options = QueryOptions::new()
            .group_by(Column::new("users", "org_id"))
            .group_by(Column::new("users", "state"))
            .order_by(Column::new("users", "org_id"), OrderDirection::Ascending);
        assert_eq!(
            render(&options).0,
            " GROUP BY users.org_id, users.state ORDER BY users.org_id"
        );
    }

    #[test]
    fn limit_and_offset_share_placeholder_when_equal() {
        let (sql, args) = render(&QueryOptions::new().limit(5).offset(5));
        assert_eq!(sql, " LIMIT $1 OFFSET $1");
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn join_kinds() {
        let on = Condition::columns_equal(Column::new("a", "id"), Column::new("b", "a_id"));
        for (kind, sql) in [
            (JoinType::Inner, " INNER JOIN b ON a.id = b.a_id"),
            (JoinType::Right, " RIGHT JOIN b ON a.id = b.a_id"),
            (JoinType::Full, " FULL JOIN b ON a.id = b.a_id"),
        ] {
            let options = QueryOptions::new().join(Join::new(kind, "b", on.clone()));
            assert_eq!(render(&options).0, sql);
        }
    }

    #[test]
    fn empty_condition_omits_where() {
        let mut builder = StatementBuilder::new("SELECT 1 FROM users");
        QueryOptions::new()
            .condition(Condition::and([]))
            .limit(1)
            .write(&mut builder);
        assert_eq!(builder.sql(), "SELECT 1 FROM users LIMIT $1");

        let options = QueryOptions::new()
            .condition(Condition::or([Condition::and([])]))
            .order_by(Column::new("users", "id"), OrderDirection::Ascending);
        assert_eq!(render(&options).0, " ORDER BY users.id");
    }

    #[test]
    fn empty_join_condition_joins_unconditionally() {
        let options = QueryOptions::new().left_join("orgs", Condition::and([]));
        assert_eq!(render(&options).0, " LEFT JOIN orgs ON TRUE");
    }

    #[test]
    fn permission_check_is_not_rendered() {
        let options = QueryOptions::new().permission_check("org.read");
        assert_eq!(render(&options).0, "");
        assert_eq!(options.permission_check.as_deref(), Some("org.read"));
    }
}
