//! pgtime - checks that PostgreSQL `timestamptz` values round-trip through
//! different Rust client libraries
//!
//! The same scenario runs over tokio-postgres (directly, through the
//! [`Timestamptz`] wrapper, and behind [`DatabaseDriver`]) and over an sqlx
//! pool behind [`DatabaseDriver`].
//!
//! # Example
//! ```ignore
//! use pgtime::{bob, run_round_trip, Backend, ConnectionConfig, PgTimeClient};
//!
//! let config = ConnectionConfig::from_env()?;
//! let client = PgTimeClient::connect(Backend::TokioPostgres, &config).await?;
//!
//! let user = bob(chrono::Utc::now());
//! let stored = run_round_trip(&client.accounts(), &user).await?;
//! assert_eq!(stored.created_at, user.created_at);
//! ```

pub mod accounts;
pub mod config;
pub mod drivers;
pub mod error;
pub mod native;
pub mod roundtrip;
pub mod schema;
pub mod traits;
pub mod types;

mod client;

// Re-export main types for convenient access
pub use accounts::AccountStore;
pub use client::PgTimeClient;
pub use config::ConnectionConfig;
pub use drivers::Backend;
pub use error::{PgTimeError, Result};
pub use native::{NativeAccounts, ScanMode, TimestamptzAccount};
pub use roundtrip::{bob, run_round_trip, verify_round_trip};
pub use schema::User;
pub use traits::{AccountRepository, DatabaseDriver};
pub use types::{QueryResult, RawQueryResult, Row, SqlValue, Timestamptz};
