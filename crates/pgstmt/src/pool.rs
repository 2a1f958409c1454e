//! Pooled adapter over `deadpool_postgres`.

use crate::client::{self, Connection, QueryExecutor, Rows};
use crate::config::DatabaseConfig;
use crate::error::{DbError, DbResult};
use crate::transaction::{Beginner, PgTransaction, TransactionOptions};
use crate::value::Value;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use std::time::Duration;
use tokio_postgres::NoTls;

/// A connection pool. Each statement run directly on the pool checks out a
/// connection for its duration; a transaction keeps one until it ends.
#[derive(Clone)]
pub struct PgPool {
    pool: Pool,
    timeout: Option<Duration>,
}

impl PgPool {
    /// Build a pool without TLS. Connections are opened lazily.
    pub fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        let manager = Manager::from_config(config.pg_config()?, NoTls, manager_config());
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .build()
            .map_err(|e| DbError::Pool(e.to_string()))?;
        Ok(Self::new(pool).with_timeout(config.timeout()))
    }

    /// Wrap an existing pool.
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn inner(&self) -> &Pool {
        &self.pool
    }

    /// Check out one connection.
    pub async fn acquire(&self) -> DbResult<PooledClient> {
        let object = self.pool.get().await?;
        Ok(PooledClient {
            object,
            timeout: self.timeout,
        })
    }
}

/// Connections returned to the pool are rolled back before reuse, so a
/// transaction dropped unfinished never leaks into the next checkout.
fn manager_config() -> ManagerConfig {
    ManagerConfig {
        recycling_method: RecyclingMethod::Custom("ROLLBACK".to_string()),
    }
}

impl QueryExecutor for PgPool {
    async fn query(&self, sql: &str, args: &[Value]) -> DbResult<Rows> {
        // The row stream owns its response channel; the connection can go
        // back to the pool before the rows are consumed.
        self.acquire().await?.query(sql, args).await
    }

    async fn exec(&self, sql: &str, args: &[Value]) -> DbResult<u64> {
        self.acquire().await?.exec(sql, args).await
    }
}

impl Beginner for PgPool {
    type Transaction<'a> = PgTransaction<PooledClient>;

    async fn begin(&mut self, options: TransactionOptions) -> DbResult<Self::Transaction<'_>> {
        PgTransaction::start(self.acquire().await?, options).await
    }
}

impl std::fmt::Debug for PgPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgPool")
            .field("status", &self.pool.status())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// A connection checked out of a [`PgPool`].
pub struct PooledClient {
    object: Object,
    timeout: Option<Duration>,
}

impl QueryExecutor for PooledClient {
    async fn query(&self, sql: &str, args: &[Value]) -> DbResult<Rows> {
        client::query_client(&self.object, self.timeout, sql, args).await
    }

    async fn exec(&self, sql: &str, args: &[Value]) -> DbResult<u64> {
        client::exec_client(&self.object, self.timeout, sql, args).await
    }
}

impl Connection for PooledClient {
    async fn batch_execute(&self, sql: &str) -> DbResult<()> {
        client::batch_client(&self.object, self.timeout, sql).await
    }
}

impl std::fmt::Debug for PooledClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
