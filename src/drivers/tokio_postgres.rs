use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use tokio_postgres::error::SqlState;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error, info, warn};

use crate::config::ConnectionConfig;
use crate::error::{PgTimeError, Result};
use crate::traits::DatabaseDriver;
use crate::types::{RawQueryResult, SqlValue};

/// PostgreSQL driver implementation using tokio-postgres.
///
/// Besides implementing [`DatabaseDriver`], it hands out the underlying
/// [`Client`] so callers can scan rows into native or wrapper types directly.
pub struct TokioPostgresDriver {
    client: Client,
}

impl TokioPostgresDriver {
    /// Connect to a PostgreSQL database and apply the configured session time zone.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        config.validate()?;

        let mut pg_config = tokio_postgres::Config::new();
        pg_config
            .host(&config.host)
            .port(config.port)
            .dbname(&config.database)
            .user(&config.user)
            .password(&config.password);

        let (client, connection) = pg_config
            .connect(NoTls)
            .await
            .map_err(|e| PgTimeError::ConnectionFailed(e.to_string()))?;

        // Spawn the connection handler
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "PostgreSQL connection error");
            }
        });

        match config.time_zone_statement()? {
            Some(statement) => {
                client
                    .batch_execute(&statement)
                    .await
                    .map_err(|e| PgTimeError::ConnectionFailed(e.to_string()))?;
                debug!(%statement, "Applied session time zone");
            }
            None => warn!("No session time zone configured, using the server default"),
        }

        info!(url = %config.redacted_url(), "Connected with tokio-postgres");
        Ok(Self { client })
    }

    /// The underlying tokio-postgres client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl DatabaseDriver for TokioPostgresDriver {
    fn name(&self) -> &'static str {
        "tokio-postgres"
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        debug!(driver = self.name(), %sql, "execute");
        let converted_params: Vec<Box<dyn ToSql + Sync + Send>> =
            params.iter().map(sql_value_to_tosql).collect();
        let param_refs = param_refs(&converted_params);

        self.client
            .execute(sql, &param_refs)
            .await
            .map_err(map_error)
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<RawQueryResult> {
        debug!(driver = self.name(), %sql, "query");
        let converted_params: Vec<Box<dyn ToSql + Sync + Send>> =
            params.iter().map(sql_value_to_tosql).collect();
        let param_refs = param_refs(&converted_params);

        // Prepare first so column names are known even when no rows come back.
        let statement = self.client.prepare(sql).await.map_err(map_error)?;
        let rows = self
            .client
            .query(&statement, &param_refs)
            .await
            .map_err(map_error)?;

        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let result_rows = rows
            .iter()
            .map(|row| {
                row.columns()
                    .iter()
                    .enumerate()
                    .map(|(i, col)| row_value(row, i, col.name(), col.type_()))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RawQueryResult::new(columns, result_rows))
    }
}

/// Maps a tokio-postgres error, singling out unique-constraint violations.
pub(crate) fn map_error(e: tokio_postgres::Error) -> PgTimeError {
    if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        let message = e
            .as_db_error()
            .map(|db| db.message().to_string())
            .unwrap_or_else(|| e.to_string());
        return PgTimeError::UniqueViolation(message);
    }
    PgTimeError::QueryFailed(e.to_string())
}

fn param_refs(params: &[Box<dyn ToSql + Sync + Send>]) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|b| b.as_ref() as &(dyn ToSql + Sync))
        .collect()
}

/// Convert a SqlValue to a boxed ToSql trait object.
fn sql_value_to_tosql(value: &SqlValue) -> Box<dyn ToSql + Sync + Send> {
    match value {
        SqlValue::Null => Box::new(None::<String>),
        SqlValue::Text(s) => Box::new(s.clone()),
        SqlValue::Int64(i) => Box::new(*i),
        SqlValue::TimestampTz(t) => Box::new(*t),
    }
}

/// Decode the column at `index` into a SqlValue based on its PostgreSQL type.
fn row_value(
    row: &tokio_postgres::Row,
    index: usize,
    column: &str,
    type_: &Type,
) -> Result<SqlValue> {
    let decode_failed = |e: tokio_postgres::Error| {
        PgTimeError::QueryFailed(format!("failed to decode column {}: {}", column, e))
    };

    let value = match *type_ {
        Type::INT8 => row
            .try_get::<_, Option<i64>>(index)
            .map_err(decode_failed)?
            .map(SqlValue::Int64),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(index)
            .map_err(decode_failed)?
            .map(|v| SqlValue::Int64(v.into())),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => row
            .try_get::<_, Option<String>>(index)
            .map_err(decode_failed)?
            .map(SqlValue::Text),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<DateTime<FixedOffset>>>(index)
            .map_err(decode_failed)?
            .map(SqlValue::TimestampTz),
        _ => {
            return Err(PgTimeError::UnsupportedType {
                column: column.to_string(),
                type_name: type_.name().to_string(),
            })
        }
    };

    Ok(value.unwrap_or(SqlValue::Null))
}
