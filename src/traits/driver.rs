use async_trait::async_trait;

use crate::error::Result;
use crate::types::{RawQueryResult, SqlValue};

/// Trait for database driver implementations.
/// Drivers are responsible for:
/// - Connecting to the database and applying the session time zone
/// - Converting SqlValue parameters to native types
/// - Decoding result columns back into SqlValue
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Short name used in logs and test case labels.
    fn name(&self) -> &'static str;

    /// Execute a statement and return the number of affected rows.
    /// Parameters use PostgreSQL-style placeholders ($1, $2, etc.)
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64>;

    /// Execute a query and return its rows.
    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<RawQueryResult>;
}
