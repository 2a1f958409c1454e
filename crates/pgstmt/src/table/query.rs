use super::{JoinRegistry, TableDef};
use crate::client::{QueryExecutor, Rows};
use crate::column::{Column, Columns};
use crate::condition::Condition;
use crate::error::DbResult;
use crate::options::{Join, JoinType, OrderDirection, QueryOptions};
use crate::statement::{Statement, StatementBuilder};
use futures_core::Stream;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_postgres::Row;

/// A type that can be selected from a table.
pub trait Object: Sized + Send + 'static {
    /// Columns to select, qualified for `table`.
    fn columns(table: &TableDef) -> Columns;

    /// Build one object from a row whose columns follow [`Object::columns`].
    fn scan(row: &Row) -> DbResult<Self>;
}

/// A typed SELECT over one table and its registered joins.
#[must_use]
pub struct Query<'r, O> {
    table: TableDef,
    registry: &'r JoinRegistry,
    filters: Vec<Condition>,
    options: QueryOptions,
    _marker: PhantomData<fn() -> O>,
}

impl<'r, O: Object> Query<'r, O> {
    pub fn new(table: TableDef, registry: &'r JoinRegistry) -> Self {
        Self {
            table,
            registry,
            filters: Vec::new(),
            options: QueryOptions::default(),
            _marker: PhantomData,
        }
    }

    /// `INNER JOIN other ON ...` using the registered column pairs.
    ///
    /// # Panics
    ///
    /// Panics if no join between the two tables is registered.
    pub fn join(self, other: &TableDef) -> Self {
        self.join_with(JoinType::Inner, other)
    }

    /// `LEFT JOIN other ON ...`, see [`Query::join`].
    pub fn left_join(self, other: &TableDef) -> Self {
        self.join_with(JoinType::Left, other)
    }

    fn join_with(mut self, kind: JoinType, other: &TableDef) -> Self {
        let Some(on) = self.registry.on(&self.table, other) else {
            panic!(
                "no join registered between {} and {}",
                self.table.name, other.name
            );
        };
        self.options = self
            .options
            .join(Join::new(kind, other.from_clause(), on));
        self
    }

    /// Add a WHERE condition. Several filters are combined with AND.
    pub fn filter(mut self, condition: Condition) -> Self {
        self.filters.push(condition);
        self
    }

    /// Order by a column of this table. Columns the table does not declare
    /// are ignored.
    pub fn order_by(mut self, column: Column, direction: OrderDirection) -> Self {
        if self.table.owns(&column) {
            self.options = self.options.order_by(column, direction);
        }
        self
    }

    pub fn group_by(mut self, column: Column) -> Self {
        self.options = self.options.group_by(column);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.options = self.options.limit(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.options = self.options.offset(offset);
        self
    }

    /// Append `FOR UPDATE`.
    pub fn lock(mut self) -> Self {
        self.options = self.options.lock();
        self
    }

    /// `SELECT <columns> FROM <table> <options>`
    pub fn build(&self) -> Statement {
        let mut builder = StatementBuilder::new("SELECT ");
        O::columns(&self.table).write_qualified(&mut builder);
        builder.write_str(" FROM ");
        self.table.write_from(&mut builder);

        let mut options = self.options.clone();
        let filter = Condition::and(self.filters.iter().cloned());
        if !filter.is_empty() {
            options.condition = Some(filter);
        }
        options.write(&mut builder);
        builder.build()
    }

    /// Run the query, requiring exactly one row.
    pub async fn result<E: QueryExecutor>(&self, executor: &E) -> DbResult<O> {
        let statement = self.build();
        let row = executor.query_row(&statement.sql, &statement.args).await?;
        O::scan(&row)
    }

    /// Run the query and stream scanned objects.
    pub async fn results<E: QueryExecutor>(&self, executor: &E) -> DbResult<Results<O>> {
        let statement = self.build();
        let rows = executor.query(&statement.sql, &statement.args).await?;
        Ok(Results::new(rows))
    }
}

impl<O> std::fmt::Debug for Query<'_, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("table", &self.table)
            .field("filters", &self.filters)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Scanned objects of a [`Query`].
///
/// A scan error is yielded for its row and the stream continues; a driver
/// error is yielded once and ends the stream.
#[must_use]
pub struct Results<O> {
    rows: Rows,
    done: bool,
    _marker: PhantomData<fn() -> O>,
}

impl<O: Object> Results<O> {
    pub fn new(rows: Rows) -> Self {
        Self {
            rows,
            done: false,
            _marker: PhantomData,
        }
    }

    /// Collect every object, stopping at the first error.
    pub async fn collect(self) -> DbResult<Vec<O>> {
        let mut objects = Vec::new();
        let mut rows = self.rows;
        while let Some(row) = rows.next().await {
            objects.push(O::scan(&row?)?);
        }
        Ok(objects)
    }
}

impl<O: Object> Stream for Results<O> {
    type Item = DbResult<O>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        match Pin::new(&mut this.rows).poll_next(cx) {
            Poll::Ready(Some(Ok(row))) => Poll::Ready(Some(O::scan(&row))),
            Poll::Ready(Some(Err(e))) => {
                this.done = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
