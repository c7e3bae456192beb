//! Error types for pgkit

use thiserror::Error;

/// Result type alias for pgkit operations
pub type PgResult<T> = Result<T, PgError>;

/// Error types for query building and execution
#[derive(Debug, Error)]
pub enum PgError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error reported by the driver
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// A query result had no usable rows
    #[error("Invalid query result: {0}")]
    InvalidResult(String),

    /// Two sequences that must be paired had different lengths
    #[error("Length mismatch in {what}: {left} != {right}")]
    Mismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    /// A statement in an insert-or-select batch returned no row
    #[error("Batch statement {index} returned no rows{}", column_suffix(.column))]
    Batch {
        index: usize,
        column: Option<String>,
    },

    /// Row decode error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

fn column_suffix(column: &Option<String>) -> String {
    match column {
        Some(c) => format!(" (id column '{c}')"),
        None => String::new(),
    }
}

impl PgError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create an invalid result error
    pub fn invalid_result(message: impl Into<String>) -> Self {
        Self::InvalidResult(message.into())
    }

    /// Create a length mismatch error
    pub fn mismatch(what: &'static str, left: usize, right: usize) -> Self {
        Self::Mismatch { what, left, right }
    }

    /// Wrap any upstream error that is not already a `PgError`.
    pub fn other(err: impl std::fmt::Display) -> Self {
        Self::Other(err.to_string())
    }

    pub fn is_invalid_result(&self) -> bool {
        matches!(self, Self::InvalidResult(_))
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, Self::Batch { .. })
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Parse a tokio_postgres error into a more specific PgError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for PgError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
