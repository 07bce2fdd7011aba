//! Database Engine Traits and Core Types
//!
//! This module defines the abstractions the session core needs from a database.
//! `DatabaseEngine` opens connections; `Connection` exposes catalog lookups,
//! statement execution and transaction control on one open connection.
//!
//! # Connection Discipline
//! Every logical operation opens its own connection and closes it before
//! returning. There is no pooling and no connection survives a command.
//! `Connection::close` consumes the connection, so it can run at most once.
//!
//! # Catalog Queries
//! Catalog lookups bind schema and table names as parameters. SQL handed to
//! `Connection::run` is caller-supplied and executed verbatim.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::error::Result;

#[cfg(feature = "postgres")]
pub mod postgres;

/// Connection configuration for the database engine
///
/// `Debug` is implemented by hand so the password never reaches logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Hostname
    pub host: String,

    /// Port number
    pub port: u16,

    /// Username
    pub user: String,

    /// Password
    /// WARNING: Sensitive data, do not log or include in error messages
    pub password: String,

    /// Database name
    pub database: String,

    /// Connect timeout (None means the driver default)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<Duration>,
}

impl ConnectionConfig {
    /// Create a new connection config
    #[must_use]
    pub const fn new(
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    ) -> Self {
        Self { host, port, user, password, database, connect_timeout: None }
    }

    /// Set the connect timeout
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Connection information returned after successful connection validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Database server version string (e.g. "15.3")
    pub database_version: String,

    /// Full server version banner
    pub server_info: String,

    /// Name of the connected database
    pub connected_database: String,

    /// Connected user name
    pub user: String,
}

/// Column metadata as read from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,

    /// Column data type, as reported by the catalog
    pub data_type: String,

    /// Declared maximum length for character types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i32>,

    /// Whether column allows NULL values
    pub nullable: bool,

    /// Default expression (if any), verbatim from the catalog
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ColumnDescriptor {
    /// Create a nullable column without default or length
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            max_length: None,
            nullable: true,
            default: None,
        }
    }

    /// Mark the column NOT NULL
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Set the maximum length
    #[must_use]
    pub const fn with_max_length(mut self, max_length: i32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Set the default expression
    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Query execution result
///
/// A statement either produces a result set or affects rows, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryResult {
    /// Row-returning statement (SELECT-like). Zero rows is a normal outcome.
    Rows {
        /// Column names in result set
        columns: Vec<String>,

        /// Result rows, values in column order
        rows: Vec<Vec<serde_json::Value>>,
    },

    /// Row-affecting statement (INSERT/UPDATE/DELETE/DDL)
    Affected {
        /// Number of rows affected
        rows_affected: u64,
    },
}

impl QueryResult {
    /// Number of rows returned or affected
    #[must_use]
    pub fn row_count(&self) -> u64 {
        match self {
            Self::Rows { rows, .. } => rows.len() as u64,
            Self::Affected { rows_affected } => *rows_affected,
        }
    }
}

/// An open database connection
///
/// Implementations must not keep a cursor open past the return of any method.
pub trait Connection: Send {
    /// List user schema names
    fn list_schemas(&mut self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// List base tables of `schema` in catalog order (empty if unknown)
    fn list_tables(&mut self, schema: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// List columns of `schema.table` ordered by ordinal position (empty if unknown)
    fn list_columns(
        &mut self,
        schema: &str,
        table: &str,
    ) -> impl Future<Output = Result<Vec<ColumnDescriptor>>> + Send;

    /// Begin a transaction
    fn begin(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Run a caller-supplied statement verbatim
    fn run(&mut self, sql: &str) -> impl Future<Output = Result<QueryResult>> + Send;

    /// Commit the open transaction
    fn commit(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Roll back the open transaction
    fn rollback(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Release the connection
    fn close(self) -> impl Future<Output = ()> + Send;
}

/// Database engine trait
///
/// The engine owns the connection parameters; every call to `connect` opens a
/// fresh connection that the caller must `close`.
pub trait DatabaseEngine: Send + Sync {
    /// Connection type produced by this engine
    type Connection: Connection;

    /// Open a new connection (`ConnectionFailed` if unreachable)
    fn connect(&self) -> impl Future<Output = Result<Self::Connection>> + Send;
}
