//! The `account` table and the statements every backend runs against it.

use chrono::{DateTime, FixedOffset};

use crate::error::{PgTimeError, Result};

/// Schema used to test how drivers store and retrieve `timestamptz` values.
pub const ACCOUNT_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS account (
    id bigserial,
    username varchar(40) NOT NULL,
    created_at timestamptz NOT NULL,
    updated_at timestamptz NOT NULL,

    PRIMARY KEY(id),
    UNIQUE(username)
)";

pub const CREATE_USER: &str =
    "INSERT INTO account (username, created_at, updated_at) VALUES ($1, $2, $3)";

pub const READ_USER: &str = "SELECT id, created_at, updated_at FROM account WHERE username=$1";

pub const DELETE_USERS: &str = "DELETE FROM account";

pub const COUNT_USERS: &str = "SELECT count(*) AS count FROM account";

/// Renders `SET TIME ZONE '<zone>'`.
/// Zone names are restricted to the characters IANA names and offsets use.
pub fn set_time_zone_statement(zone: &str) -> Result<String> {
    let valid = !zone.is_empty()
        && zone
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '/' | '+' | '-' | ':'));
    if !valid {
        return Err(PgTimeError::InvalidConfig(format!(
            "invalid time zone: {:?}",
            zone
        )));
    }
    Ok(format!("SET TIME ZONE '{}'", zone))
}

/// An account row.
/// `id` is assigned by the database; users built locally carry 0.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl User {
    pub fn new(
        username: impl Into<String>,
        created_at: DateTime<FixedOffset>,
        updated_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: 0,
            username: username.into(),
            created_at,
            updated_at,
        }
    }

    /// Converts a `bigserial` value read from the database.
    pub fn id_from_db(id: i64) -> Result<u64> {
        u64::try_from(id).map_err(|_| PgTimeError::InvalidId(id))
    }
}
