//! Direct tokio-postgres access to the `account` table.
//!
//! Statements go straight through [`tokio_postgres::Client`] with no
//! [`SqlValue`](crate::types::SqlValue) conversion in between. Timestamp
//! columns are scanned either into `DateTime<FixedOffset>` or into the
//! [`Timestamptz`] wrapper, depending on the [`ScanMode`].

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use crate::config::ConnectionConfig;
use crate::drivers::{map_tokio_postgres_error, TokioPostgresDriver};
use crate::error::{PgTimeError, Result};
use crate::schema::{User, ACCOUNT_SCHEMA, COUNT_USERS, CREATE_USER, DELETE_USERS, READ_USER};
use crate::traits::AccountRepository;
use crate::types::Timestamptz;

/// How timestamp columns are decoded on the read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Scan into `chrono::DateTime<FixedOffset>`.
    Native,
    /// Scan into [`Timestamptz`] and take its instant.
    Timestamptz,
}

/// An account row whose timestamps were decoded through [`Timestamptz`].
#[derive(Debug, Clone, PartialEq)]
pub struct TimestamptzAccount {
    pub id: i64,
    pub created_at: Timestamptz,
    pub updated_at: Timestamptz,
}

impl TimestamptzAccount {
    /// Fails if either timestamp is `infinity` or `-infinity`.
    pub fn into_user(self, username: impl Into<String>) -> Result<User> {
        Ok(User {
            id: User::id_from_db(self.id)?,
            username: username.into(),
            created_at: self.created_at.time()?,
            updated_at: self.updated_at.time()?,
        })
    }
}

/// Account storage using the tokio-postgres client directly.
pub struct NativeAccounts {
    driver: TokioPostgresDriver,
    scan: ScanMode,
}

impl NativeAccounts {
    pub fn new(driver: TokioPostgresDriver, scan: ScanMode) -> Self {
        Self { driver, scan }
    }

    pub async fn connect(config: &ConnectionConfig, scan: ScanMode) -> Result<Self> {
        Ok(Self::new(TokioPostgresDriver::connect(config).await?, scan))
    }

    pub fn scan_mode(&self) -> ScanMode {
        self.scan
    }

    /// Read a user's timestamps through the [`Timestamptz`] wrapper.
    pub async fn find_timestamptz_by_username(
        &self,
        username: &str,
    ) -> Result<Option<TimestamptzAccount>> {
        let row = self
            .driver
            .client()
            .query_opt(READ_USER, &[&username])
            .await
            .map_err(map_tokio_postgres_error)?;

        row.map(|row| {
            Ok(TimestamptzAccount {
                id: row.try_get("id").map_err(map_tokio_postgres_error)?,
                created_at: row.try_get("created_at").map_err(map_tokio_postgres_error)?,
                updated_at: row.try_get("updated_at").map_err(map_tokio_postgres_error)?,
            })
        })
        .transpose()
    }

    async fn find_native_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = self
            .driver
            .client()
            .query_opt(READ_USER, &[&username])
            .await
            .map_err(map_tokio_postgres_error)?;

        row.map(|row| {
            let id: i64 = row.try_get("id").map_err(map_tokio_postgres_error)?;
            let created_at: DateTime<FixedOffset> =
                row.try_get("created_at").map_err(map_tokio_postgres_error)?;
            let updated_at: DateTime<FixedOffset> =
                row.try_get("updated_at").map_err(map_tokio_postgres_error)?;
            Ok(User {
                id: User::id_from_db(id)?,
                username: username.to_string(),
                created_at,
                updated_at,
            })
        })
        .transpose()
    }
}

#[async_trait]
impl AccountRepository for NativeAccounts {
    fn label(&self) -> &'static str {
        match self.scan {
            ScanMode::Native => "tokio-postgres-native",
            ScanMode::Timestamptz => "tokio-postgres-timestamptz",
        }
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.driver
            .client()
            .batch_execute(ACCOUNT_SCHEMA)
            .await
            .map_err(map_tokio_postgres_error)
    }

    async fn delete_all(&self) -> Result<u64> {
        self.driver
            .client()
            .execute(DELETE_USERS, &[])
            .await
            .map_err(map_tokio_postgres_error)
    }

    async fn create(&self, user: &User) -> Result<()> {
        self.driver
            .client()
            .execute(
                CREATE_USER,
                &[&user.username, &user.created_at, &user.updated_at],
            )
            .await
            .map_err(map_tokio_postgres_error)?;
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.scan {
            ScanMode::Native => self.find_native_by_username(username).await,
            ScanMode::Timestamptz => self
                .find_timestamptz_by_username(username)
                .await?
                .map(|account| account.into_user(username))
                .transpose(),
        }
    }

    async fn count(&self) -> Result<u64> {
        let row = self
            .driver
            .client()
            .query_one(COUNT_USERS, &[])
            .await
            .map_err(map_tokio_postgres_error)?;
        let count: i64 = row.try_get("count").map_err(map_tokio_postgres_error)?;
        u64::try_from(count)
            .map_err(|_| PgTimeError::QueryFailed(format!("negative row count: {}", count)))
    }
}
