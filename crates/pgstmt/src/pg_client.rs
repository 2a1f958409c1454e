//! Single-connection adapter over `tokio_postgres::Client`.

use crate::client::{self, Connection, QueryExecutor, Rows};
use crate::config::DatabaseConfig;
use crate::error::DbResult;
use crate::monitor;
use crate::transaction::{Beginner, PgTransaction, TransactionOptions};
use crate::value::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio_postgres::NoTls;

/// One native-protocol connection.
///
/// If a transaction on this client is dropped unfinished, the next statement
/// is preceded by a `ROLLBACK`.
pub struct PgClient {
    client: tokio_postgres::Client,
    timeout: Option<Duration>,
    abandoned: AtomicBool,
}

impl PgClient {
    /// Wrap an existing client.
    pub fn new(client: tokio_postgres::Client) -> Self {
        Self {
            client,
            timeout: None,
            abandoned: AtomicBool::new(false),
        }
    }

    /// Connect without TLS and drive the connection on a spawned task.
    pub async fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        let (client, connection) = config
            .pg_config()?
            .connect(NoTls)
            .await
            .map_err(|e| crate::DbError::Connection(e.to_string()))?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                #[cfg(feature = "tracing")]
                tracing::error!(target: "pgstmt.sql", error = %e, "connection error");
                #[cfg(not(feature = "tracing"))]
                let _ = e;
            }
        });
        Ok(Self::new(client).with_timeout(config.timeout()))
    }

    /// Fail statements that run longer than `timeout` with
    /// [`DbError::Timeout`](crate::DbError::Timeout).
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn inner(&self) -> &tokio_postgres::Client {
        &self.client
    }

    pub fn into_inner(self) -> tokio_postgres::Client {
        self.client
    }

    async fn settle(&self) -> DbResult<()> {
        if !self.abandoned.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        monitor::log_tx("settle transaction", "ROLLBACK");
        if let Err(err) = client::batch_client(&self.client, self.timeout, "ROLLBACK").await {
            self.abandoned.store(true, Ordering::Release);
            return Err(err);
        }
        Ok(())
    }
}

impl QueryExecutor for PgClient {
    async fn query(&self, sql: &str, args: &[Value]) -> DbResult<Rows> {
        self.settle().await?;
        client::query_client(&self.client, self.timeout, sql, args).await
    }

    async fn exec(&self, sql: &str, args: &[Value]) -> DbResult<u64> {
        self.settle().await?;
        client::exec_client(&self.client, self.timeout, sql, args).await
    }
}

impl Connection for PgClient {
    async fn batch_execute(&self, sql: &str) -> DbResult<()> {
        self.settle().await?;
        client::batch_client(&self.client, self.timeout, sql).await
    }

    fn mark_abandoned(&self) {
        self.abandoned.store(true, Ordering::Release);
    }
}

impl Beginner for PgClient {
    type Transaction<'a> = PgTransaction<&'a PgClient>;

    async fn begin(&mut self, options: TransactionOptions) -> DbResult<Self::Transaction<'_>> {
        PgTransaction::start(&*self, options).await
    }
}

impl std::fmt::Debug for PgClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgClient")
            .field("timeout", &self.timeout)
            .field("abandoned", &self.abandoned.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
