//! Convenient imports for typical `pgstmt` usage.
//!
//! ```ignore
//! use pgstmt::prelude::*;
//! ```

pub use crate::{
    Arg, Beginner, Change, Changes, Column, Condition, DbError, DbResult, ErrorKind, Instruction,
    NumberOperation, Object, OrderDirection, PgClient, Query, QueryExecutor, QueryOptions,
    StatementBuilder, TextOperation, Transaction, TransactionOptions, Value,
};

#[cfg(feature = "pool")]
pub use crate::PgPool;
