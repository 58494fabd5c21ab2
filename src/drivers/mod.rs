mod sqlx_postgres;
mod tokio_postgres;

use std::fmt;
use std::sync::Arc;

use crate::config::ConnectionConfig;
use crate::error::Result;
use crate::traits::DatabaseDriver;

pub use self::in_memory_test::{
    InMemoryResponse, InMemoryTestDriver, InMemoryTestResponseBuilder, RecordedQuery,
};
pub use self::sqlx_postgres::SqlxPostgresDriver;
pub use self::tokio_postgres::TokioPostgresDriver;

pub(crate) use self::tokio_postgres::map_error as map_tokio_postgres_error;

/// The PostgreSQL client libraries a [`DatabaseDriver`] can be backed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Native protocol client, one connection
    TokioPostgres,
    /// sqlx connection pool
    Sqlx,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::TokioPostgres, Backend::Sqlx];

    pub fn name(&self) -> &'static str {
        match self {
            Backend::TokioPostgres => "tokio-postgres",
            Backend::Sqlx => "sqlx",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Connect the given backend and return it behind the driver interface.
pub async fn connect(backend: Backend, config: &ConnectionConfig) -> Result<Arc<dyn DatabaseDriver>> {
    let driver: Arc<dyn DatabaseDriver> = match backend {
        Backend::TokioPostgres => Arc::new(TokioPostgresDriver::connect(config).await?),
        Backend::Sqlx => Arc::new(SqlxPostgresDriver::connect(config).await?),
    };
    Ok(driver)
}
