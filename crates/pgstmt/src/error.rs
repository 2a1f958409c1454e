//! Error types for pgstmt
//!
//! Driver failures are translated into [`DbError`] at the adapter boundary, so
//! callers only ever match on this taxonomy. The original driver error stays
//! reachable through [`std::error::Error::source`].

use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio_postgres::error::SqlState;

/// Boxed original cause carried by translated errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for pgstmt operations
pub type DbResult<T> = Result<T, DbError>;

/// The kind of constraint an [`IntegrityViolation`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegrityKind {
    Check,
    Unique,
    ForeignKey,
    NotNull,
    Unknown,
}

impl IntegrityKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::Unique => "unique",
            Self::ForeignKey => "foreign",
            Self::NotNull => "not-null",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for IntegrityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A constraint failure reported by the database.
#[derive(Debug, Error)]
#[error("integrity violation of type \"{kind}\" on table \"{table}\" (constraint: {constraint})")]
pub struct IntegrityViolation {
    pub kind: IntegrityKind,
    pub table: String,
    pub constraint: String,
    #[source]
    pub source: Option<BoxError>,
}

/// Error kinds used for payload-free matching via [`DbError::is`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NoRowFound,
    MultipleRowsFound,
    /// Matches every constraint violation regardless of its concrete kind.
    IntegrityViolation,
    CheckViolation,
    UniqueViolation,
    ForeignKeyViolation,
    NotNullViolation,
    Unknown,
    MissingCondition,
    NoChanges,
    SavepointActive,
    InvalidJoin,
    RollbackFailed,
    Timeout,
    Cancelled,
    Decode,
    Connection,
    Config,
    Pool,
}

/// Error types for database operations
#[derive(Debug, Error)]
pub enum DbError {
    /// A single-row query matched zero rows.
    #[error("no row found{}", cause_suffix(.source))]
    NoRowFound { source: Option<BoxError> },

    /// A single-row query matched more than one row.
    #[error("multiple rows found{}", count_suffix(.count))]
    MultipleRowsFound { count: Option<usize> },

    /// Constraint violation (check, unique, foreign key, not null).
    #[error(transparent)]
    IntegrityViolation(#[from] IntegrityViolation),

    /// Any driver failure without a more specific translation.
    #[error("unknown database error: {0}")]
    Unknown(#[source] BoxError),

    /// A statement was built without a condition on a required column.
    #[error("missing condition for column {column}")]
    MissingCondition { column: String },

    /// An update was requested without any change.
    #[error("no changes to apply")]
    NoChanges,

    /// A second savepoint was requested while one is still open.
    #[error("savepoint \"{0}\" is already active, only one nesting level is supported")]
    SavepointActive(&'static str),

    /// A join registration referenced columns the tables do not declare.
    #[error("invalid join between {left} and {right}: {reason}")]
    InvalidJoin {
        left: String,
        right: String,
        reason: String,
    },

    /// The work failed and so did the rollback that followed.
    #[error("{source} (rollback failed: {rollback})")]
    RollbackFailed {
        source: Box<DbError>,
        rollback: Box<DbError>,
    },

    /// The statement did not finish within the configured timeout.
    #[error("statement timeout after {0:?}")]
    Timeout(Duration),

    /// The server cancelled the statement.
    #[error("statement cancelled: {0}")]
    Cancelled(#[source] BoxError),

    /// Row decode/scan error
    #[error("decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Database connection error
    #[error("connection error: {0}")]
    Connection(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("pool error: {0}")]
    Pool(String),
}

fn cause_suffix(source: &Option<BoxError>) -> String {
    source
        .as_ref()
        .map(|err| format!(": {err}"))
        .unwrap_or_default()
}

fn count_suffix(count: &Option<usize>) -> String {
    count.map(|n| format!(" ({n} rows)")).unwrap_or_default()
}

impl DbError {
    /// Create a no-row-found error, optionally wrapping the original cause.
    pub fn no_row_found(source: Option<BoxError>) -> Self {
        Self::NoRowFound { source }
    }

    /// Create a multiple-rows-found error.
    pub fn multiple_rows_found(count: Option<usize>) -> Self {
        Self::MultipleRowsFound { count }
    }

    /// Create an integrity violation of the given kind.
    pub fn integrity_violation(
        kind: IntegrityKind,
        table: impl Into<String>,
        constraint: impl Into<String>,
        source: Option<BoxError>,
    ) -> Self {
        Self::IntegrityViolation(IntegrityViolation {
            kind,
            table: table.into(),
            constraint: constraint.into(),
            source,
        })
    }

    pub fn check(
        table: impl Into<String>,
        constraint: impl Into<String>,
        source: Option<BoxError>,
    ) -> Self {
        Self::integrity_violation(IntegrityKind::Check, table, constraint, source)
    }

    pub fn unique(
        table: impl Into<String>,
        constraint: impl Into<String>,
        source: Option<BoxError>,
    ) -> Self {
        Self::integrity_violation(IntegrityKind::Unique, table, constraint, source)
    }

    pub fn foreign_key(
        table: impl Into<String>,
        constraint: impl Into<String>,
        source: Option<BoxError>,
    ) -> Self {
        Self::integrity_violation(IntegrityKind::ForeignKey, table, constraint, source)
    }

    pub fn not_null(
        table: impl Into<String>,
        constraint: impl Into<String>,
        source: Option<BoxError>,
    ) -> Self {
        Self::integrity_violation(IntegrityKind::NotNull, table, constraint, source)
    }

    /// Wrap an unrecognized failure.
    pub fn unknown(source: impl Into<BoxError>) -> Self {
        Self::Unknown(source.into())
    }

    /// Create a missing condition error for a column.
    pub fn missing_condition(column: impl Into<String>) -> Self {
        Self::MissingCondition {
            column: column.into(),
        }
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// The most specific kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoRowFound { .. } => ErrorKind::NoRowFound,
            Self::MultipleRowsFound { .. } => ErrorKind::MultipleRowsFound,
            Self::IntegrityViolation(v) => match v.kind {
                IntegrityKind::Check => ErrorKind::CheckViolation,
                IntegrityKind::Unique => ErrorKind::UniqueViolation,
                IntegrityKind::ForeignKey => ErrorKind::ForeignKeyViolation,
                IntegrityKind::NotNull => ErrorKind::NotNullViolation,
                IntegrityKind::Unknown => ErrorKind::IntegrityViolation,
            },
            Self::Unknown(_) => ErrorKind::Unknown,
            Self::MissingCondition { .. } => ErrorKind::MissingCondition,
            Self::NoChanges => ErrorKind::NoChanges,
            Self::SavepointActive(_) => ErrorKind::SavepointActive,
            Self::InvalidJoin { .. } => ErrorKind::InvalidJoin,
            Self::RollbackFailed { .. } => ErrorKind::RollbackFailed,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Cancelled(_) => ErrorKind::Cancelled,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Connection(_) => ErrorKind::Connection,
            Self::Config(_) => ErrorKind::Config,
            #[cfg(feature = "pool")]
            Self::Pool(_) => ErrorKind::Pool,
        }
    }

    /// Kind-only matching that ignores the payload.
    ///
    /// Every constraint violation also matches [`ErrorKind::IntegrityViolation`],
    /// and a [`DbError::RollbackFailed`] matches the kinds of both errors it joins.
    pub fn is(&self, kind: ErrorKind) -> bool {
        if self.kind() == kind {
            return true;
        }
        match self {
            Self::IntegrityViolation(_) => kind == ErrorKind::IntegrityViolation,
            Self::RollbackFailed { source, rollback } => source.is(kind) || rollback.is(kind),
            _ => false,
        }
    }

    /// Returns the constraint payload if this is an integrity violation.
    pub fn as_integrity_violation(&self) -> Option<&IntegrityViolation> {
        match self {
            Self::IntegrityViolation(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.is(ErrorKind::NoRowFound)
    }

    pub fn is_integrity_violation(&self) -> bool {
        self.is(ErrorKind::IntegrityViolation)
    }

    pub fn is_unique_violation(&self) -> bool {
        self.is(ErrorKind::UniqueViolation)
    }

    pub fn is_timeout(&self) -> bool {
        self.is(ErrorKind::Timeout)
    }

    /// Translate a `tokio_postgres` error into the taxonomy.
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        let Some(db_err) = err.as_db_error() else {
            if err.is_closed() {
                return Self::Connection(err.to_string());
            }
            return Self::Unknown(Box::new(err));
        };

        match classify(db_err.code()) {
            Some(Classified::Integrity(kind)) => {
                let table = db_err.table().unwrap_or_default().to_string();
                let constraint = db_err.constraint().unwrap_or_default().to_string();
                Self::integrity_violation(kind, table, constraint, Some(Box::new(err)))
            }
            Some(Classified::Cancelled) => Self::Cancelled(Box::new(err)),
            None => Self::Unknown(Box::new(err)),
        }
    }
}

/// What a SQLSTATE code translates to, if anything specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Classified {
    Integrity(IntegrityKind),
    Cancelled,
}

/// Map a SQLSTATE code onto the taxonomy. Class 23 codes without a dedicated
/// kind become [`IntegrityKind::Unknown`].
pub(crate) fn classify(code: &SqlState) -> Option<Classified> {
    let kind = match code {
        c if *c == SqlState::CHECK_VIOLATION => IntegrityKind::Check,
        c if *c == SqlState::UNIQUE_VIOLATION => IntegrityKind::Unique,
        c if *c == SqlState::FOREIGN_KEY_VIOLATION => IntegrityKind::ForeignKey,
        c if *c == SqlState::NOT_NULL_VIOLATION => IntegrityKind::NotNull,
        c if *c == SqlState::QUERY_CANCELED => return Some(Classified::Cancelled),
        c if c.code().starts_with("23") => IntegrityKind::Unknown,
        _ => return None,
    };
    Some(Classified::Integrity(kind))
}

impl From<tokio_postgres::Error> for DbError {
    fn from(err: tokio_postgres::Error) -> Self {
        Self::from_db_error(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for DbError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        match err {
            deadpool_postgres::PoolError::Backend(err) => Self::from_db_error(err),
            other => Self::Pool(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, Error)]
    #[error("driver says no")]
    struct DriverError;

    #[test]
    fn sqlstate_classification() {
        let classify_code = |code: &str| classify(&SqlState::from_code(code));
        assert_eq!(
            classify_code("23514"),
            Some(Classified::Integrity(IntegrityKind::Check))
        );
        assert_eq!(
            classify_code("23505"),
            Some(Classified::Integrity(IntegrityKind::Unique))
        );
        assert_eq!(
            classify_code("23503"),
            Some(Classified::Integrity(IntegrityKind::ForeignKey))
        );
        assert_eq!(
            classify_code("23502"),
            Some(Classified::Integrity(IntegrityKind::NotNull))
        );
        // Exclusion constraints and the class code itself have no dedicated kind.
        assert_eq!(
            classify_code("23P01"),
            Some(Classified::Integrity(IntegrityKind::Unknown))
        );
        assert_eq!(
            classify_code("23000"),
            Some(Classified::Integrity(IntegrityKind::Unknown))
        );
        assert_eq!(classify_code("57014"), Some(Classified::Cancelled));
        assert_eq!(classify_code("42P01"), None);
        assert_eq!(classify_code("40001"), None);
    }

    #[test]
    fn unique_error_matches_itself_and_integrity_violation() {
        let err = DbError::unique("users", "users_username_key", None);

        assert!(err.is(ErrorKind::UniqueViolation));
        assert!(err.is(ErrorKind::IntegrityViolation));
        assert!(!err.is(ErrorKind::CheckViolation));
        assert!(!err.is(ErrorKind::NoRowFound));
    }

    #[test]
    fn each_integrity_subtype_has_its_own_kind() {
        let cases = [
            (DbError::check("t", "c", None), ErrorKind::CheckViolation),
            (DbError::foreign_key("t", "c", None), ErrorKind::ForeignKeyViolation),
            (DbError::not_null("t", "c", None), ErrorKind::NotNullViolation),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind);
            assert!(err.is(ErrorKind::IntegrityViolation));
            assert!(!err.is(ErrorKind::UniqueViolation));
        }
    }

    #[test]
    fn unknown_integrity_kind_only_matches_the_base_kind() {
        let err = DbError::integrity_violation(IntegrityKind::Unknown, "t", "c", None);
        assert_eq!(err.kind(), ErrorKind::IntegrityViolation);
        assert!(!err.is(ErrorKind::CheckViolation));
    }

    #[test]
    fn integrity_violation_carries_context_and_original() {
        let err = DbError::foreign_key("orgs", "orgs_instance_id_fkey", Some(Box::new(DriverError)));

        let violation = err.as_integrity_violation().unwrap();
        assert_eq!(violation.kind, IntegrityKind::ForeignKey);
        assert_eq!(violation.table, "orgs");
        assert_eq!(violation.constraint, "orgs_instance_id_fkey");
        assert_eq!(err.source().unwrap().to_string(), "driver says no");
    }

    #[test]
    fn no_row_found_message_includes_original() {
        assert_eq!(DbError::no_row_found(None).to_string(), "no row found");
        assert_eq!(
            DbError::no_row_found(Some(Box::new(DriverError))).to_string(),
            "no row found: driver says no"
        );
        assert!(DbError::no_row_found(None).is_not_found());
    }

    #[test]
    fn multiple_rows_found_optionally_reports_count() {
        assert_eq!(
            DbError::multiple_rows_found(None).to_string(),
            "multiple rows found"
        );
        assert_eq!(
            DbError::multiple_rows_found(Some(3)).to_string(),
            "multiple rows found (3 rows)"
        );
    }

    #[test]
    fn rollback_failure_matches_both_joined_errors() {
        let err = DbError::RollbackFailed {
            source: Box::new(DbError::unique("t", "c", None)),
            rollback: Box::new(DbError::Connection("closed".into())),
        };

        assert!(err.is(ErrorKind::RollbackFailed));
        assert!(err.is(ErrorKind::UniqueViolation));
        assert!(err.is(ErrorKind::Connection));
        assert!(!err.is(ErrorKind::Timeout));
        assert!(err.to_string().contains("rollback failed: connection error: closed"));
    }

    #[test]
    fn unknown_wraps_original() {
        let err = DbError::unknown(DriverError);
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(err.source().unwrap().to_string(), "driver says no");
    }
}
