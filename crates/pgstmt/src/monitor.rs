//! Statement and transaction logging.
//!
//! Events are emitted through `tracing` when the `tracing` feature is enabled
//! (the default) and compile to nothing otherwise.
//!
//! - target `pgstmt.sql`: one debug event per executed statement
//! - target `pgstmt.tx`: transaction lifecycle events, warnings for abandoned
//!   transactions and savepoints

/// Longest SQL prefix logged per statement, in bytes.
pub const MAX_LOGGED_SQL: usize = 200;

pub(crate) fn truncate_sql(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

pub(crate) fn log_statement(sql: &str, arg_count: usize) {
    #[cfg(feature = "tracing")]
    {
        let shown = truncate_sql(sql, MAX_LOGGED_SQL);
        let truncated = shown.len() < sql.len();
        tracing::debug!(
            target: "pgstmt.sql",
            arg_count,
            truncated,
            sql = %shown,
        );
    }
    #[cfg(not(feature = "tracing"))]
    let _ = (sql, arg_count);
}

pub(crate) fn log_tx(event: &'static str, sql: &str) {
    #[cfg(feature = "tracing")]
    tracing::debug!(target: "pgstmt.tx", event, sql);
    #[cfg(not(feature = "tracing"))]
    let _ = (event, sql);
}

pub(crate) fn warn_abandoned(what: &'static str) {
    #[cfg(feature = "tracing")]
    tracing::warn!(
        target: "pgstmt.tx",
        "{what} dropped without commit or rollback; it will be rolled back before the connection is reused",
    );
    #[cfg(not(feature = "tracing"))]
    let _ = what;
}
