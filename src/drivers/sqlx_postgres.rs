use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Executor, Postgres, Row, TypeInfo};
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::error::{PgTimeError, Result};
use crate::traits::DatabaseDriver;
use crate::types::{RawQueryResult, SqlValue};

const MAX_CONNECTIONS: u32 = 5;

/// PostgreSQL driver implementation backed by an sqlx connection pool.
pub struct SqlxPostgresDriver {
    pool: PgPool,
}

impl SqlxPostgresDriver {
    /// Open a pool. Every pooled connection gets the configured session time
    /// zone as soon as it is established.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        config.validate()?;

        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password);

        let time_zone = config.time_zone_statement()?;
        if time_zone.is_none() {
            warn!("No session time zone configured, using the server default");
        }

        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(MAX_CONNECTIONS)
            .after_connect(move |conn, _meta| {
                let statement = time_zone.clone();
                Box::pin(async move {
                    if let Some(statement) = statement {
                        conn.execute(statement.as_str()).await?;
                        debug!(%statement, "Applied session time zone");
                    }
                    Ok(())
                })
            })
            .connect_with(options)
            .await
            .map_err(|e| PgTimeError::ConnectionFailed(e.to_string()))?;

        info!(url = %config.redacted_url(), "Connected with sqlx");
        Ok(Self { pool })
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl DatabaseDriver for SqlxPostgresDriver {
    fn name(&self) -> &'static str {
        "sqlx"
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        debug!(driver = self.name(), %sql, "execute");
        let result = bind_params(sql, params)
            .execute(&self.pool)
            .await
            .map_err(map_error)?;
        Ok(result.rows_affected())
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<RawQueryResult> {
        debug!(driver = self.name(), %sql, "query");
        let rows = bind_params(sql, params)
            .fetch_all(&self.pool)
            .await
            .map_err(map_error)?;

        let columns: Vec<String> = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let result_rows = rows
            .iter()
            .map(|row| {
                (0..row.len())
                    .map(|i| row_value(row, i))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RawQueryResult::new(columns, result_rows))
    }
}

/// Maps an sqlx error, singling out unique-constraint violations.
fn map_error(e: sqlx::Error) -> PgTimeError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PgTimeError::UniqueViolation(db.message().to_string())
        }
        other => PgTimeError::QueryFailed(other.to_string()),
    }
}

fn bind_params<'q>(sql: &'q str, params: &'q [SqlValue]) -> Query<'q, Postgres, PgArguments> {
    params
        .iter()
        .fold(sqlx::query(sql), |query, value| match value {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Text(s) => query.bind(s.as_str()),
            SqlValue::Int64(i) => query.bind(*i),
            SqlValue::TimestampTz(t) => query.bind(*t),
        })
}

/// Decode the column at `index` into a SqlValue based on its PostgreSQL type.
fn row_value(row: &PgRow, index: usize) -> Result<SqlValue> {
    let column = &row.columns()[index];
    let name = column.name();
    let decode_failed = |e: sqlx::Error| {
        PgTimeError::QueryFailed(format!("failed to decode column {}: {}", name, e))
    };

    let value = match column.type_info().name() {
        "INT8" => row
            .try_get::<Option<i64>, _>(index)
            .map_err(decode_failed)?
            .map(SqlValue::Int64),
        "INT4" => row
            .try_get::<Option<i32>, _>(index)
            .map_err(decode_failed)?
            .map(|v| SqlValue::Int64(v.into())),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => row
            .try_get::<Option<String>, _>(index)
            .map_err(decode_failed)?
            .map(SqlValue::Text),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<FixedOffset>>, _>(index)
            .map_err(decode_failed)?
            .map(SqlValue::TimestampTz),
        other => {
            return Err(PgTimeError::UnsupportedType {
                column: name.to_string(),
                type_name: other.to_string(),
            })
        }
    };

    Ok(value.unwrap_or(SqlValue::Null))
}
