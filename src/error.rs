use thiserror::Error;

/// Error type for pgtime operations
#[derive(Debug, Error)]
pub enum PgTimeError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Expected {expected} row(s), got {actual}")]
    UnexpectedRowCount { expected: usize, actual: usize },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Column {column} is not a {expected} value")]
    TypeMismatch {
        column: String,
        expected: &'static str,
    },

    #[error("Column {column} has unsupported type {type_name}")]
    UnsupportedType { column: String, type_name: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid account id: {0}")]
    InvalidId(i64),

    #[error("Timestamp is infinite and has no instant")]
    InfiniteTimestamp,

    #[error("{field} mismatch: wanted {expected} got {actual}")]
    Mismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },
}

/// Result type alias for pgtime operations
pub type Result<T> = std::result::Result<T, PgTimeError>;
