//! # pgstmt
//!
//! Typed PostgreSQL statement construction.
//!
//! ## Features
//!
//! - **Parameterized**: every literal is bound as `$N`; identical literals of
//!   the same type share one placeholder
//! - **Typed operators**: text, number, boolean and bytes comparisons each have
//!   their own operator set
//! - **Composable conditions**: nested AND/OR trees with minimal parentheses
//! - **Nested transactions**: one level, emulated with a savepoint
//! - **Stable errors**: driver failures mapped to not-found, multiple-rows,
//!   integrity-violation kinds and unknown
//!
//! ## Building a statement
//!
//! ```
//! use pgstmt::{Column, Condition, QueryOptions, StatementBuilder, TextOperation, OrderDirection};
//!
//! let username = Column::new("users", "username");
//! let options = QueryOptions::new()
//!     .condition(Condition::or([
//!         Condition::text(username.clone(), TextOperation::Equal, "alice"),
//!         Condition::text(Column::new("users", "email"), TextOperation::Equal, "alice"),
//!     ]))
//!     .order_by(username, OrderDirection::Ascending)
//!     .limit(10);
//!
//! let mut builder = StatementBuilder::new("SELECT users.id FROM users");
//! options.write(&mut builder);
//! let stmt = builder.build();
//!
//! assert_eq!(
//!     stmt.sql,
//!     "SELECT users.id FROM users WHERE (users.username = $1 OR users.email = $1) \
//!      ORDER BY users.username LIMIT $2"
//! );
//! assert_eq!(stmt.args.len(), 2);
//! ```
//!
//! ## Running it
//!
//! ```ignore
//! use pgstmt::{DatabaseConfig, PgPool, QueryExecutor, Beginner, Transaction, TransactionOptions};
//!
//! let mut pool = PgPool::connect(&DatabaseConfig::from_env()?)?;
//! let mut tx = pool.begin(TransactionOptions::default()).await?;
//! let result = tx.exec(&stmt.sql, &stmt.args).await;
//! tx.end(result).await?;
//! ```

pub mod change;
pub mod client;
pub mod column;
pub mod condition;
pub mod config;
pub mod error;
pub mod monitor;
pub mod operation;
pub mod options;
pub mod pg_client;
pub mod prelude;
pub mod statement;
pub mod table;
pub mod transaction;
pub mod value;

pub use change::{Change, Changes};
pub use client::{Connection, QueryExecutor, Rows};
pub use column::{Column, Columns, SqlFunction, columns_equal};
pub use condition::Condition;
pub use config::DatabaseConfig;
pub use error::{DbError, DbResult, ErrorKind, IntegrityKind, IntegrityViolation};
pub use operation::{BooleanOperation, BytesOperation, NumberOperation, Operation, TextOperation};
pub use options::{Join, JoinType, OrderBy, OrderDirection, QueryOptions};
pub use pg_client::PgClient;
pub use statement::{Statement, StatementBuilder};
pub use table::{JoinRegistry, Object, Query, Results, TableDef};
pub use transaction::{
    AccessMode, Beginner, IsolationLevel, PgTransaction, SAVEPOINT_NAME, Savepoint, Transaction,
    TransactionOptions,
};
pub use value::{Arg, Family, Instruction, Interval, Number, Value};

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{PgPool, PooledClient};
