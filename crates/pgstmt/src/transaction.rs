//! Transactions and single-level nesting through a savepoint.
//!
//! [`Beginner::begin`] on a connection or pool issues `BEGIN` and yields a
//! [`PgTransaction`]. Calling `begin` again on that transaction issues
//! `SAVEPOINT pgstmt_nested` and yields a [`Savepoint`] whose commit and
//! rollback release or roll back to that fixed name.
//!
//! Only one savepoint can be open at a time. Beginning another one, including
//! through the savepoint's own `begin`, fails with
//! [`DbError::SavepointActive`].
//!
//! # Example
//!
//! ```ignore
//! let mut tx = client.begin(TransactionOptions::default()).await?;
//! let result = tx.exec(&stmt.sql, &stmt.args).await;
//! tx.end(result).await?;
//! ```
//!
//! A transaction or savepoint dropped without `commit`, `rollback` or `end` is
//! logged and rolled back before its connection runs anything else.

use crate::client::{Connection, QueryExecutor, Rows};
use crate::error::{DbError, DbResult};
use crate::monitor;
use crate::value::Value;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

/// The name every nested transaction uses.
pub const SAVEPOINT_NAME: &str = "pgstmt_nested";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IsolationLevel {
    #[default]
    Serializable,
    RepeatableRead,
    ReadCommitted,
}

impl IsolationLevel {
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Serializable => "SERIALIZABLE",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::ReadCommitted => "READ COMMITTED",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AccessMode {
    #[default]
    ReadWrite,
    ReadOnly,
}

impl AccessMode {
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::ReadWrite => "READ WRITE",
            Self::ReadOnly => "READ ONLY",
        }
    }
}

/// Options for `BEGIN`. Ignored when beginning a savepoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TransactionOptions {
    pub isolation_level: IsolationLevel,
    pub access_mode: AccessMode,
}

impl TransactionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn isolation_level(mut self, level: IsolationLevel) -> Self {
        self.isolation_level = level;
        self
    }

    pub fn access_mode(mut self, mode: AccessMode) -> Self {
        self.access_mode = mode;
        self
    }

    pub fn read_only(self) -> Self {
        self.access_mode(AccessMode::ReadOnly)
    }

    /// e.g. `BEGIN ISOLATION LEVEL SERIALIZABLE, READ WRITE`
    pub fn begin_sql(&self) -> String {
        format!(
            "BEGIN ISOLATION LEVEL {}, {}",
            self.isolation_level.as_sql(),
            self.access_mode.as_sql()
        )
    }
}

/// Something a transaction can be started on.
pub trait Beginner: Send {
    type Transaction<'a>: Transaction
    where
        Self: 'a;

    fn begin(
        &mut self,
        options: TransactionOptions,
    ) -> impl Future<Output = DbResult<Self::Transaction<'_>>> + Send;
}

/// An open transaction or savepoint.
pub trait Transaction: QueryExecutor + Sized {
    fn commit(self) -> impl Future<Output = DbResult<()>> + Send;

    fn rollback(self) -> impl Future<Output = DbResult<()>> + Send;

    /// Commit on `Ok`, roll back on `Err`.
    ///
    /// If the rollback fails too, both errors are returned as
    /// [`DbError::RollbackFailed`].
    fn end<T: Send>(self, result: DbResult<T>) -> impl Future<Output = DbResult<T>> + Send {
        async move {
            match result {
                Ok(value) => {
                    self.commit().await?;
                    Ok(value)
                }
                Err(err) => match self.rollback().await {
                    Ok(()) => Err(err),
                    Err(rollback) => Err(DbError::RollbackFailed {
                        source: Box::new(err),
                        rollback: Box::new(rollback),
                    }),
                },
            }
        }
    }
}

/// A transaction on one connection.
pub struct PgTransaction<C: Connection> {
    conn: C,
    finished: bool,
    savepoint_active: bool,
    savepoint_abandoned: AtomicBool,
}

impl<C: Connection> PgTransaction<C> {
    /// Issue `BEGIN` on `conn`.
    pub async fn start(conn: C, options: TransactionOptions) -> DbResult<Self> {
        let sql = options.begin_sql();
        monitor::log_tx("begin", &sql);
        conn.batch_execute(&sql).await?;
        Ok(Self {
            conn,
            finished: false,
            savepoint_active: false,
            savepoint_abandoned: AtomicBool::new(false),
        })
    }

    /// Roll back and release a savepoint that was dropped unfinished.
    async fn settle(&self) -> DbResult<()> {
        if !self.savepoint_abandoned.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        let sql = format!("ROLLBACK TO SAVEPOINT {SAVEPOINT_NAME}; RELEASE SAVEPOINT {SAVEPOINT_NAME}");
        monitor::log_tx("settle savepoint", &sql);
        if let Err(err) = self.conn.batch_execute(&sql).await {
            self.savepoint_abandoned.store(true, Ordering::Release);
            return Err(err);
        }
        Ok(())
    }

    async fn finish(&mut self, sql: &'static str) -> DbResult<()> {
        self.finished = true;
        monitor::log_tx(sql, sql);
        if let Err(err) = self.conn.batch_execute(sql).await {
            // The server-side state is unknown; have the connection clean up.
            self.conn.mark_abandoned();
            return Err(err);
        }
        Ok(())
    }
}

impl<C: Connection> QueryExecutor for PgTransaction<C> {
    async fn query(&self, sql: &str, args: &[Value]) -> DbResult<Rows> {
        self.settle().await?;
        self.conn.query(sql, args).await
    }

    async fn exec(&self, sql: &str, args: &[Value]) -> DbResult<u64> {
        self.settle().await?;
        self.conn.exec(sql, args).await
    }
}

impl<C: Connection> Transaction for PgTransaction<C> {
    async fn commit(mut self) -> DbResult<()> {
        if let Err(err) = self.settle().await {
            return match self.finish("ROLLBACK").await {
                Ok(()) => Err(err),
                Err(rollback) => Err(DbError::RollbackFailed {
                    source: Box::new(err),
                    rollback: Box::new(rollback),
                }),
            };
        }
        self.finish("COMMIT").await
    }

    async fn rollback(mut self) -> DbResult<()> {
        // ROLLBACK discards any abandoned savepoint as well.
        self.savepoint_abandoned.store(false, Ordering::Release);
        self.finish("ROLLBACK").await
    }
}

impl<C: Connection> Beginner for PgTransaction<C> {
    type Transaction<'a>
        = Savepoint<'a, C>
    where
        Self: 'a;

    async fn begin(&mut self, _options: TransactionOptions) -> DbResult<Self::Transaction<'_>> {
        if self.savepoint_active {
            return Err(DbError::SavepointActive(SAVEPOINT_NAME));
        }
        self.settle().await?;
        let sql = format!("SAVEPOINT {SAVEPOINT_NAME}");
        monitor::log_tx("savepoint", &sql);
        self.conn.batch_execute(&sql).await?;
        self.savepoint_active = true;
        Ok(Savepoint {
            parent: self,
            finished: false,
        })
    }
}

impl<C: Connection> Drop for PgTransaction<C> {
    fn drop(&mut self) {
        if !self.finished {
            monitor::warn_abandoned("transaction");
            self.conn.mark_abandoned();
        }
    }
}

impl<C: Connection> std::fmt::Debug for PgTransaction<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgTransaction")
            .field("finished", &self.finished)
            .field("savepoint_active", &self.savepoint_active)
            .finish_non_exhaustive()
    }
}

/// A nested transaction, emulated with [`SAVEPOINT_NAME`].
pub struct Savepoint<'t, C: Connection> {
    parent: &'t mut PgTransaction<C>,
    finished: bool,
}

impl<C: Connection> Savepoint<'_, C> {
    async fn finish(&mut self, sql: String) -> DbResult<()> {
        self.finished = true;
        self.parent.savepoint_active = false;
        monitor::log_tx("end savepoint", &sql);
        self.parent.conn.batch_execute(&sql).await
    }
}

impl<C: Connection> QueryExecutor for Savepoint<'_, C> {
    async fn query(&self, sql: &str, args: &[Value]) -> DbResult<Rows> {
        self.parent.conn.query(sql, args).await
    }

    async fn exec(&self, sql: &str, args: &[Value]) -> DbResult<u64> {
        self.parent.conn.exec(sql, args).await
    }
}

impl<C: Connection> Transaction for Savepoint<'_, C> {
    async fn commit(mut self) -> DbResult<()> {
        self.finish(format!("RELEASE SAVEPOINT {SAVEPOINT_NAME}"))
            .await
    }

    async fn rollback(mut self) -> DbResult<()> {
        let result = self
            .finish(format!("ROLLBACK TO SAVEPOINT {SAVEPOINT_NAME}"))
            .await;
        if result.is_err() {
            // Still open on the server; the parent settles it.
            self.parent
                .savepoint_abandoned
                .store(true, Ordering::Release);
        }
        result
    }
}

impl<'t, C: Connection> Beginner for Savepoint<'t, C> {
    type Transaction<'a>
        = Savepoint<'a, C>
    where
        Self: 'a;

    /// Delegates to the parent, which rejects a second open savepoint.
    async fn begin(&mut self, options: TransactionOptions) -> DbResult<Self::Transaction<'_>> {
        self.parent.begin(options).await
    }
}

impl<C: Connection> Drop for Savepoint<'_, C> {
    fn drop(&mut self) {
        if !self.finished {
            monitor::warn_abandoned("savepoint");
            self.parent.savepoint_active = false;
            self.parent
                .savepoint_abandoned
                .store(true, Ordering::Release);
        }
    }
}

impl<C: Connection> std::fmt::Debug for Savepoint<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Savepoint")
            .field("name", &SAVEPOINT_NAME)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}
