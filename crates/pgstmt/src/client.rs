//! Driver contracts.
//!
//! Statements produced by this crate run against anything implementing
//! [`QueryExecutor`]: a single connection ([`PgClient`](crate::PgClient)), a
//! pool ([`PgPool`](crate::PgPool)), a transaction or a savepoint.

use crate::error::{DbError, DbResult};
use crate::monitor;
use crate::statement::Statement;
use crate::value::Value;
use futures_core::Stream;
use futures_util::StreamExt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio_postgres::Row;

/// Executes rendered statements.
pub trait QueryExecutor: Send + Sync {
    /// Run a query and stream its rows.
    fn query(&self, sql: &str, args: &[Value]) -> impl Future<Output = DbResult<Rows>> + Send;

    /// Run a query that must return exactly one row.
    ///
    /// - 0 rows: [`DbError::NoRowFound`]
    /// - more than one row: [`DbError::MultipleRowsFound`]
    fn query_row(&self, sql: &str, args: &[Value]) -> impl Future<Output = DbResult<Row>> + Send {
        async move { self.query(sql, args).await?.exactly_one().await }
    }

    /// Run a statement and return the number of affected rows.
    fn exec(&self, sql: &str, args: &[Value]) -> impl Future<Output = DbResult<u64>> + Send;

    fn query_statement(&self, statement: &Statement) -> impl Future<Output = DbResult<Rows>> + Send {
        self.query(&statement.sql, &statement.args)
    }

    fn exec_statement(&self, statement: &Statement) -> impl Future<Output = DbResult<u64>> + Send {
        self.exec(&statement.sql, &statement.args)
    }
}

/// A connection that transactions can be opened on.
pub trait Connection: QueryExecutor {
    /// Run one or more parameterless statements.
    fn batch_execute(&self, sql: &str) -> impl Future<Output = DbResult<()>> + Send;

    /// Called when a transaction on this connection is dropped unfinished.
    /// The connection must roll it back before its next use.
    fn mark_abandoned(&self) {}
}

impl<C: QueryExecutor> QueryExecutor for &C {
    fn query(&self, sql: &str, args: &[Value]) -> impl Future<Output = DbResult<Rows>> + Send {
        (**self).query(sql, args)
    }

    fn query_row(&self, sql: &str, args: &[Value]) -> impl Future<Output = DbResult<Row>> + Send {
        (**self).query_row(sql, args)
    }

    fn exec(&self, sql: &str, args: &[Value]) -> impl Future<Output = DbResult<u64>> + Send {
        (**self).exec(sql, args)
    }
}

impl<C: Connection> Connection for &C {
    fn batch_execute(&self, sql: &str) -> impl Future<Output = DbResult<()>> + Send {
        (**self).batch_execute(sql)
    }

    fn mark_abandoned(&self) {
        (**self).mark_abandoned();
    }
}

/// A lazy, finite stream of rows. Driver errors are translated.
#[must_use]
pub struct Rows {
    inner: Pin<Box<dyn Stream<Item = DbResult<Row>> + Send>>,
}

impl Rows {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = DbResult<Row>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    pub fn empty() -> Self {
        Self::new(futures_util::stream::empty())
    }

    pub async fn next(&mut self) -> Option<DbResult<Row>> {
        self.inner.next().await
    }

    /// Require exactly one row. Remaining rows are drained to report a count.
    pub async fn exactly_one(mut self) -> DbResult<Row> {
        let first = match self.next().await {
            Some(row) => row?,
            None => return Err(DbError::no_row_found(None)),
        };
        let mut count = 1;
        while let Some(row) = self.next().await {
            row?;
            count += 1;
        }
        if count > 1 {
            return Err(DbError::multiple_rows_found(Some(count)));
        }
        Ok(first)
    }

    /// Collect every row, stopping at the first error.
    pub async fn collect(mut self) -> DbResult<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next().await {
            rows.push(row?);
        }
        Ok(rows)
    }
}

impl Stream for Rows {
    type Item = DbResult<Row>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for Rows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rows").finish_non_exhaustive()
    }
}

async fn with_timeout<T>(
    timeout: Option<Duration>,
    fut: impl Future<Output = DbResult<T>>,
) -> DbResult<T> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| DbError::Timeout(limit))?,
        None => fut.await,
    }
}

pub(crate) async fn query_client(
    client: &tokio_postgres::Client,
    timeout: Option<Duration>,
    sql: &str,
    args: &[Value],
) -> DbResult<Rows> {
    monitor::log_statement(sql, args.len());
    with_timeout(timeout, async {
        let stream = client
            .query_raw(sql, args.iter())
            .await
            .map_err(DbError::from_db_error)?;
        Ok(Rows::new(
            stream.map(|row| row.map_err(DbError::from_db_error)),
        ))
    })
    .await
}

pub(crate) async fn exec_client(
    client: &tokio_postgres::Client,
    timeout: Option<Duration>,
    sql: &str,
    args: &[Value],
) -> DbResult<u64> {
    monitor::log_statement(sql, args.len());
    with_timeout(timeout, async {
        client
            .execute_raw(sql, args.iter())
            .await
            .map_err(DbError::from_db_error)
    })
    .await
}

pub(crate) async fn batch_client(
    client: &tokio_postgres::Client,
    timeout: Option<Duration>,
    sql: &str,
) -> DbResult<()> {
    monitor::log_statement(sql, 0);
    with_timeout(timeout, async {
        client
            .batch_execute(sql)
            .await
            .map_err(DbError::from_db_error)
    })
    .await
}

impl QueryExecutor for tokio_postgres::Client {
    async fn query(&self, sql: &str, args: &[Value]) -> DbResult<Rows> {
        query_client(self, None, sql, args).await
    }

    async fn exec(&self, sql: &str, args: &[Value]) -> DbResult<u64> {
        exec_client(self, None, sql, args).await
    }
}

impl Connection for tokio_postgres::Client {
    async fn batch_execute(&self, sql: &str) -> DbResult<()> {
        batch_client(self, None, sql).await
    }
}
