use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{PgTimeError, Result};
use crate::schema::{User, ACCOUNT_SCHEMA, COUNT_USERS, CREATE_USER, DELETE_USERS, READ_USER};
use crate::traits::{AccountRepository, DatabaseDriver};
use crate::types::{QueryResult, SqlValue};

/// Account storage over any [`DatabaseDriver`].
/// Created from a PgTimeClient or directly from a driver.
pub struct AccountStore {
    driver: Arc<dyn DatabaseDriver>,
}

impl AccountStore {
    pub fn new(driver: Arc<dyn DatabaseDriver>) -> Self {
        Self { driver }
    }
}

#[async_trait]
impl AccountRepository for AccountStore {
    fn label(&self) -> &'static str {
        self.driver.name()
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.driver.execute(ACCOUNT_SCHEMA, &[]).await?;
        Ok(())
    }

    async fn delete_all(&self) -> Result<u64> {
        self.driver.execute(DELETE_USERS, &[]).await
    }

    async fn create(&self, user: &User) -> Result<()> {
        let params = [
            SqlValue::from(user.username.as_str()),
            SqlValue::from(user.created_at),
            SqlValue::from(user.updated_at),
        ];
        self.driver.execute(CREATE_USER, &params).await?;
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let raw = self.driver.query(READ_USER, &[username.into()]).await?;
        let Some(row) = QueryResult::from_raw(raw).optional_row()? else {
            return Ok(None);
        };

        Ok(Some(User {
            id: User::id_from_db(row.get_i64("id")?)?,
            username: username.to_string(),
            created_at: row.get_timestamptz("created_at")?,
            updated_at: row.get_timestamptz("updated_at")?,
        }))
    }

    async fn count(&self) -> Result<u64> {
        let raw = self.driver.query(COUNT_USERS, &[]).await?;
        let count = QueryResult::from_raw(raw).single_row()?.get_i64("count")?;
        u64::try_from(count)
            .map_err(|_| PgTimeError::QueryFailed(format!("negative row count: {}", count)))
    }
}
