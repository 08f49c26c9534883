//! MySQL connector backed by a `sqlx` pool.
//!
//! Queries go over the text protocol (`sqlx::raw_sql`), so every cell arrives
//! as text and is converted to JSON by column type.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Number, Value};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Connection, Row, TypeInfo, ValueRef};
use tracing::{debug, info, warn};

use querygate_core::config::MySqlConfig;

use crate::backend::{SqlBackend, SqlRow};
use crate::error::ConnectorError;

/// Upper bound on the startup connect, including the pool's retries on refused connections.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct MySqlConnector {
    pool: MySqlPool,
}

impl MySqlConnector {
    /// Build the pool and ping one connection. Fails if the server is unreachable.
    pub async fn connect(config: &MySqlConfig) -> Result<Self, ConnectorError> {
        let mut options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password);
        if !config.database.is_empty() {
            options = options.database(&config.database);
        }

        let pool = MySqlPoolOptions::new()
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect_with(options).await?;

        let mut conn = pool.acquire().await?;
        conn.ping().await?;
        drop(conn);

        info!(host = %config.host, port = config.port, database = %config.database, "MySQL connected");
        Ok(Self { pool })
    }
}

#[async_trait]
impl SqlBackend for MySqlConnector {
    async fn query(&self, sql: &str) -> Result<Vec<SqlRow>, ConnectorError> {
        debug!(sql = %sql, "Running MySQL query");
        let rows = sqlx::raw_sql(sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_json).collect()
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("MySQL pool closed");
    }
}

fn row_to_json(row: &MySqlRow) -> Result<SqlRow, ConnectorError> {
    let mut object = Map::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let text = if row.try_get_raw(idx)?.is_null() {
            None
        } else {
            Some(cell_text(row, idx)?)
        };
        object.insert(
            column.name().to_string(),
            decode_cell(column.type_info().name(), text.as_deref()),
        );
    }
    Ok(object)
}

fn cell_text(row: &MySqlRow, idx: usize) -> Result<String, ConnectorError> {
    match row.try_get_unchecked::<String, _>(idx) {
        Ok(text) => Ok(text),
        Err(_) => {
            // Binary columns that are not valid UTF-8.
            let bytes: Vec<u8> = row.try_get_unchecked(idx)?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}

/// Convert one text-protocol cell into JSON based on the column type name.
///
/// SQL NULL (`None`) is JSON `null` for every column type. DECIMAL stays a
/// string so no precision is lost.
pub(crate) fn decode_cell(type_name: &str, text: Option<&str>) -> Value {
    let Some(text) = text else {
        return Value::Null;
    };
    let base = type_name.trim_end_matches(" UNSIGNED");
    match base {
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            if let Ok(n) = text.parse::<i64>() {
                return Value::Number(n.into());
            }
            if let Ok(n) = text.parse::<u64>() {
                return Value::Number(n.into());
            }
            Value::String(text.to_string())
        }
        "FLOAT" | "DOUBLE" => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(text.to_string())),
        "JSON" => serde_json::from_str(text).unwrap_or_else(|e| {
            warn!(error = %e, "JSON column did not parse, returning raw text");
            Value::String(text.to_string())
        }),
        _ => Value::String(text.to_string()),
    }
}
