//! `PostgreSQL` Database Engine Implementation
//!
//! This module implements `DatabaseEngine` and `Connection` for `PostgreSQL`.
//!
//! # Features
//! - Client-server connections via TCP
//! - Catalog lookups via `information_schema` with bound parameters
//! - Explicit transactions around user statements
//! - Rich type system support (numeric, arrays, JSON/JSONB, timestamps, etc.)
//!
//! # Implementation Notes
//! - Uses `tokio-postgres` (async driver, requires tokio runtime)
//! - The connection driver future runs on a spawned task and is joined on close
//! - Row-returning vs row-affecting is decided from the prepared statement's columns
//! - NUMERIC is rendered as a decimal string to keep precision; `NaN`, infinities and
//!   values beyond `Decimal`'s range are rendered from the raw digits
//! - BYTEA data is Base64-encoded
//! - Types without a conversion render as `<typename>` instead of failing the query

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_postgres::types::{FromSql, Type};
use tokio_postgres::{Client, Config, NoTls, Row};
use tracing::debug;

use crate::engine::{ColumnDescriptor, Connection, ConnectionConfig, ConnectionInfo, DatabaseEngine, QueryResult};
use crate::error::{NlQueryError, Result};

/// Application name reported to the server (visible in `pg_stat_activity`)
const APPLICATION_NAME: &str = "nlquery";

/// `PostgreSQL` database engine implementation
#[derive(Debug, Clone)]
pub struct PostgresEngine {
    config: ConnectionConfig,
}

impl PostgresEngine {
    /// Create an engine for the given connection parameters
    #[must_use]
    pub const fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    /// Validate connection and return connection information
    ///
    /// Opens a connection, reads server version, database and user, closes it.
    pub async fn validate_connection(&self) -> Result<ConnectionInfo> {
        let conn = self.connect().await?;
        let info = read_connection_info(&conn.client).await;
        conn.close().await;
        info
    }
}

impl DatabaseEngine for PostgresEngine {
    type Connection = PostgresConnection;

    async fn connect(&self) -> Result<PostgresConnection> {
        let pg_config = build_pg_config(&self.config);

        let (client, connection) = pg_config.connect(NoTls).await.map_err(|e| {
            NlQueryError::connection_failed(format!(
                "Failed to connect to PostgreSQL at {}:{}: {}",
                self.config.host,
                self.config.port,
                describe(&e)
            ))
        })?;

        // Connection errors are logged without parameters to avoid leaking credentials
        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                debug!(error = %e, "postgres connection terminated with error");
            }
        });

        debug!(host = %self.config.host, database = %self.config.database, "postgres connection opened");
        Ok(PostgresConnection { client, driver })
    }
}

/// An open `PostgreSQL` connection
pub struct PostgresConnection {
    client: Client,
    driver: JoinHandle<()>,
}

impl Connection for PostgresConnection {
    async fn list_schemas(&mut self) -> Result<Vec<String>> {
        let query = "
            SELECT schema_name::text
            FROM information_schema.schemata
            WHERE schema_name NOT IN ('pg_catalog', 'information_schema')
              AND schema_name NOT LIKE 'pg\\_toast%'
              AND schema_name NOT LIKE 'pg\\_temp\\_%'
            ORDER BY schema_name";

        let rows = self
            .client
            .query(query, &[])
            .await
            .map_err(|e| NlQueryError::catalog_failed(format!("Failed to list schemas: {}", describe(&e))))?;

        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    async fn list_tables(&mut self, schema: &str) -> Result<Vec<String>> {
        // Creation order, so the rendered DDL follows the order tables were defined in
        let query = "
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema = $1
              AND table_type = 'BASE TABLE'
            ORDER BY (quote_ident(table_schema::text) || '.' || quote_ident(table_name::text))::regclass::oid";

        let rows = self.client.query(query, &[&schema]).await.map_err(|e| {
            NlQueryError::catalog_failed(format!(
                "Failed to list tables in schema '{schema}': {}",
                describe(&e)
            ))
        })?;

        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    async fn list_columns(&mut self, schema: &str, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let query = "
            SELECT
                column_name::text,
                CASE
                    WHEN data_type = 'USER-DEFINED' THEN udt_name::text
                    WHEN data_type = 'ARRAY' THEN substring(udt_name::text FROM 2) || '[]'
                    ELSE data_type::text
                END,
                character_maximum_length::int4,
                is_nullable::text,
                column_default::text
            FROM information_schema.columns
            WHERE table_schema = $1 AND table_name = $2
            ORDER BY ordinal_position";

        let rows = self.client.query(query, &[&schema, &table]).await.map_err(|e| {
            NlQueryError::catalog_failed(format!(
                "Failed to query columns for {schema}.{table}: {}",
                describe(&e)
            ))
        })?;

        let columns = rows
            .iter()
            .map(|row| {
                let is_nullable: String = row.get(3);
                ColumnDescriptor {
                    name: row.get(0),
                    data_type: row.get(1),
                    max_length: row.get(2),
                    nullable: is_nullable == "YES",
                    default: row.get(4),
                }
            })
            .collect();

        Ok(columns)
    }

    async fn begin(&mut self) -> Result<()> {
        self.client
            .batch_execute("BEGIN")
            .await
            .map_err(|e| NlQueryError::query_failed(format!("Failed to begin transaction: {}", describe(&e))))
    }

    async fn run(&mut self, sql: &str) -> Result<QueryResult> {
        execute_query(&self.client, sql).await
    }

    async fn commit(&mut self) -> Result<()> {
        self.client
            .batch_execute("COMMIT")
            .await
            .map_err(|e| NlQueryError::query_failed(format!("Failed to commit: {}", describe(&e))))
    }

    async fn rollback(&mut self) -> Result<()> {
        self.client
            .batch_execute("ROLLBACK")
            .await
            .map_err(|e| NlQueryError::query_failed(format!("Failed to roll back: {}", describe(&e))))
    }

    async fn close(self) {
        // Dropping the client ends the driver future
        drop(self.client);
        if let Err(e) = self.driver.await {
            debug!(error = %e, "postgres connection task did not finish cleanly");
        }
        debug!("postgres connection closed");
    }
}

/// Build `PostgreSQL` connection config from `ConnectionConfig`
fn build_pg_config(config: &ConnectionConfig) -> Config {
    let mut pg_config = Config::new();
    pg_config
        .host(&config.host)
        .port(config.port)
        .user(&config.user)
        .password(&config.password)
        .dbname(&config.database)
        .application_name(APPLICATION_NAME);

    if let Some(timeout) = config.connect_timeout {
        pg_config.connect_timeout(timeout);
    } else {
        pg_config.connect_timeout(Duration::from_secs(10));
    }

    pg_config
}

/// Prefer the server's message (with detail/hint) over the driver's wrapper text
fn describe(e: &tokio_postgres::Error) -> String {
    match e.as_db_error() {
        Some(db) => {
            let mut message = db.message().to_string();
            if let Some(detail) = db.detail() {
                message.push_str(&format!(" ({detail})"));
            }
            if let Some(hint) = db.hint() {
                message.push_str(&format!(" Hint: {hint}"));
            }
            message
        }
        None => e.to_string(),
    }
}

async fn read_connection_info(client: &Client) -> Result<ConnectionInfo> {
    let row = client
        .query_one("SELECT version(), current_database()::text, current_user::text", &[])
        .await
        .map_err(|e| NlQueryError::connection_failed(format!("Failed to query server info: {}", describe(&e))))?;

    let server_info: String = row.get(0);

    // "PostgreSQL 15.3 on x86_64..." -> "15.3"
    let database_version = server_info.split_whitespace().nth(1).unwrap_or("unknown").to_string();

    Ok(ConnectionInfo {
        database_version,
        server_info,
        connected_database: row.get(1),
        user: row.get(2),
    })
}

/// Execute query and return `QueryResult`
async fn execute_query(client: &Client, query: &str) -> Result<QueryResult> {
    let stmt = client
        .prepare(query)
        .await
        .map_err(|e| NlQueryError::query_failed(explain_prepare_failure(describe(&e))))?;

    // A result descriptor means the statement returns rows
    if stmt.columns().is_empty() {
        let rows_affected = client
            .execute(&stmt, &[])
            .await
            .map_err(|e| NlQueryError::query_failed(describe(&e)))?;

        return Ok(QueryResult::Affected { rows_affected });
    }

    let rows = client
        .query(&stmt, &[])
        .await
        .map_err(|e| NlQueryError::query_failed(describe(&e)))?;

    let columns: Vec<String> = stmt.columns().iter().map(|c| c.name().to_string()).collect();

    let mut rows_data = Vec::with_capacity(rows.len());
    for row in &rows {
        rows_data.push(row_to_json(columns.len(), row)?);
    }

    Ok(QueryResult::Rows { columns, rows: rows_data })
}

/// Add a hint when the server refused several statements in one prepare
fn explain_prepare_failure(message: String) -> String {
    if message.contains("cannot insert multiple commands into a prepared statement") {
        format!("{message}. Run one statement at a time with /exec.")
    } else {
        message
    }
}

/// Convert a `PostgreSQL` row to a JSON-safe `Vec`
fn row_to_json(width: usize, row: &Row) -> Result<Vec<serde_json::Value>> {
    (0..width).map(|idx| postgres_value_to_json(row, idx)).collect()
}

/// Read a nullable value of type `T`
fn get<'a, T: FromSql<'a>>(row: &'a Row, idx: usize, what: &str) -> Result<Option<T>> {
    row.try_get::<_, Option<T>>(idx)
        .map_err(|e| NlQueryError::query_failed(format!("Failed to get {what} value: {e}")))
}

fn json_array<T>(values: Option<Vec<Option<T>>>) -> Option<serde_json::Value>
where
    T: Into<serde_json::Value>,
{
    values.map(|items| {
        serde_json::Value::Array(
            items.into_iter().map(|v| v.map_or(serde_json::Value::Null, Into::into)).collect(),
        )
    })
}

/// Convert `PostgreSQL` value to JSON value
fn postgres_value_to_json(row: &Row, idx: usize) -> Result<serde_json::Value> {
    use serde_json::Value;

    let col_type = row.columns()[idx].type_();

    let value = match *col_type {
        Type::BOOL => get::<bool>(row, idx, "boolean")?.map(Value::Bool),

        Type::CHAR => get::<i8>(row, idx, "char")?.map(|v| Value::String(((v as u8) as char).to_string())),
        Type::INT2 => get::<i16>(row, idx, "i16")?.map(Value::from),
        Type::INT4 => get::<i32>(row, idx, "i32")?.map(Value::from),
        Type::INT8 => get::<i64>(row, idx, "i64")?.map(Value::from),
        Type::OID => get::<u32>(row, idx, "oid")?.map(Value::from),

        // NaN/Infinity have no JSON representation and become null
        Type::FLOAT4 => get::<f32>(row, idx, "f32")?
            .and_then(|v| serde_json::Number::from_f64(f64::from(v)))
            .map(Value::Number),
        Type::FLOAT8 => get::<f64>(row, idx, "f64")?
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),

        // Decoded from the raw bytes so out-of-range values still render
        Type::NUMERIC | Type::TIMESTAMP | Type::TIMESTAMPTZ | Type::DATE => {
            get::<RawValue>(row, idx, col_type.name())?.map(|raw| decode_with_fallback(col_type, raw.0))
        }

        Type::VARCHAR | Type::TEXT | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            get::<String>(row, idx, "string")?.map(Value::String)
        }

        Type::JSON | Type::JSONB => get::<Value>(row, idx, "JSON")?,

        Type::BYTEA => {
            use base64::Engine;
            get::<Vec<u8>>(row, idx, "bytea")?
                .map(|v| Value::String(base64::engine::general_purpose::STANDARD.encode(v)))
        }

        Type::TIME => get::<chrono::NaiveTime>(row, idx, "time")?
            .map(|v| Value::String(v.format("%H:%M:%S%.f").to_string())),

        Type::UUID => get::<uuid::Uuid>(row, idx, "UUID")?.map(|v| Value::String(v.to_string())),

        Type::TEXT_ARRAY | Type::VARCHAR_ARRAY | Type::NAME_ARRAY => {
            json_array(get::<Vec<Option<String>>>(row, idx, "text array")?)
        }
        Type::BOOL_ARRAY => json_array(get::<Vec<Option<bool>>>(row, idx, "boolean array")?),
        Type::INT2_ARRAY => json_array(get::<Vec<Option<i16>>>(row, idx, "i16 array")?),
        Type::INT4_ARRAY => json_array(get::<Vec<Option<i32>>>(row, idx, "i32 array")?),
        Type::INT8_ARRAY => json_array(get::<Vec<Option<i64>>>(row, idx, "i64 array")?),

        _ => {
            debug!(type_name = col_type.name(), "no JSON conversion for column type");
            Some(placeholder(col_type))
        }
    };

    Ok(value.unwrap_or(serde_json::Value::Null))
}

fn placeholder(col_type: &Type) -> serde_json::Value {
    serde_json::Value::String(format!("<{}>", col_type.name()))
}

/// Undecoded wire bytes of a non-NULL value
struct RawValue<'a>(&'a [u8]);

impl<'a> FromSql<'a> for RawValue<'a> {
    fn from_sql(
        _: &Type,
        raw: &'a [u8],
    ) -> std::result::Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        Ok(Self(raw))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

/// Decode NUMERIC and date/time values, keeping values the typed decoders reject
///
/// `NaN`, infinities and NUMERIC beyond `Decimal`'s 28 digits render as text;
/// anything still undecodable becomes `<typename>`.
fn decode_with_fallback(col_type: &Type, raw: &[u8]) -> serde_json::Value {
    let decoded = match *col_type {
        Type::NUMERIC => rust_decimal::Decimal::from_sql(col_type, raw)
            .map(|v| v.to_string())
            .ok()
            .or_else(|| numeric_text(raw)),
        Type::TIMESTAMP => chrono::NaiveDateTime::from_sql(col_type, raw)
            .map(|v| v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            .ok()
            .or_else(|| infinity_i64(raw)),
        Type::TIMESTAMPTZ => chrono::DateTime::<chrono::Utc>::from_sql(col_type, raw)
            .map(|v| v.to_rfc3339())
            .ok()
            .or_else(|| infinity_i64(raw)),
        Type::DATE => chrono::NaiveDate::from_sql(col_type, raw)
            .map(|v| v.format("%Y-%m-%d").to_string())
            .ok()
            .or_else(|| infinity_i32(raw)),
        _ => None,
    };

    decoded.map_or_else(
        || {
            debug!(type_name = col_type.name(), "could not decode value");
            placeholder(col_type)
        },
        serde_json::Value::String,
    )
}

fn infinity_i64(raw: &[u8]) -> Option<String> {
    match i64::from_be_bytes(raw.try_into().ok()?) {
        i64::MAX => Some("infinity".to_string()),
        i64::MIN => Some("-infinity".to_string()),
        _ => None,
    }
}

fn infinity_i32(raw: &[u8]) -> Option<String> {
    match i32::from_be_bytes(raw.try_into().ok()?) {
        i32::MAX => Some("infinity".to_string()),
        i32::MIN => Some("-infinity".to_string()),
        _ => None,
    }
}

const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

/// Render binary NUMERIC (base-10000 digit groups) as exact decimal text
fn numeric_text(raw: &[u8]) -> Option<String> {
    let word = |i: usize| raw.get(i..i + 2).map(|b| u16::from_be_bytes([b[0], b[1]]));

    let ndigits = usize::from(word(0)?);
    let weight = i64::from(word(2)? as i16);
    let sign = word(4)?;
    let dscale = usize::from(word(6)?);
    let digits: Vec<u16> = (0..ndigits).map(|i| word(8 + i * 2)).collect::<Option<_>>()?;

    match sign {
        NUMERIC_NAN => return Some("NaN".to_string()),
        NUMERIC_PINF => return Some("Infinity".to_string()),
        NUMERIC_NINF => return Some("-Infinity".to_string()),
        _ => {}
    }

    // Digit group `i` is worth digits[i] * 10000^(weight - i)
    let group = |i: i64| usize::try_from(i).ok().and_then(|i| digits.get(i).copied()).unwrap_or(0);

    let mut text = String::new();
    if sign == NUMERIC_NEG {
        text.push('-');
    }
    if weight < 0 {
        text.push('0');
    } else {
        text.push_str(&group(0).to_string());
        for i in 1..=weight {
            text.push_str(&format!("{:04}", group(i)));
        }
    }

    if dscale > 0 {
        let mut fraction = String::new();
        let mut i = weight + 1;
        while fraction.len() < dscale {
            fraction.push_str(&format!("{:04}", group(i)));
            i += 1;
        }
        fraction.truncate(dscale);
        text.push('.');
        text.push_str(&fraction);
    }

    Some(text)
}
