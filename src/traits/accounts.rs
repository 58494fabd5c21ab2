use async_trait::async_trait;

use crate::error::Result;
use crate::schema::User;

/// Operations on the `account` table, independent of which client library
/// and decode path carries them out.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Short label for logs and test case names.
    fn label(&self) -> &'static str;

    /// Create the `account` table if it does not exist yet.
    async fn ensure_schema(&self) -> Result<()>;

    /// Delete every account, returning how many rows were removed.
    async fn delete_all(&self) -> Result<u64>;

    /// Insert a user. The id is left to the database.
    async fn create(&self, user: &User) -> Result<()>;

    /// Look a user up by its unique username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Number of stored accounts.
    async fn count(&self) -> Result<u64>;
}
