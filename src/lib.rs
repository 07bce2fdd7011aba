//! nlquery - Natural-Language SQL Session for PostgreSQL
//!
//! nlquery is an interactive session tool: the operator explores a database
//! with slash-commands and asks questions in plain language. An AI assistant
//! answers with SQL, which the session remembers and can execute on request.
//!
//! # Core Principles
//! - Live metadata: the catalog is re-read on every use, never cached across commands
//! - One connection per operation, always closed
//! - User SQL runs verbatim in its own transaction (commit on success, rollback on failure)
//! - Errors are reported and the session continues
//!
//! # Module Organization
//! - [`error`] - Error types and handling
//! - [`engine`] - Database engine traits, core types and the PostgreSQL driver
//! - [`catalog`] - Schema, table and column lookups
//! - [`ddl`] - `CREATE TABLE` synthesis from catalog metadata
//! - [`executor`] - Transactional execution of user SQL
//! - [`extract`] - SQL extraction from assistant replies
//! - [`assistant`] - AI provider capability and clients
//! - [`session`] - Session context and command dispatch
//! - [`output`] - Text rendering of results and listings
//! - [`config`] - Configuration loading
//! - [`repl`] - Interactive line loop

pub mod assistant;
pub mod catalog;
pub mod config;
pub mod ddl;
pub mod engine;
pub mod error;
pub mod executor;
pub mod extract;
pub mod output;
pub mod repl;
pub mod session;

// Re-export commonly used types for convenience
pub use assistant::{Assistant, AssistantClient};
pub use catalog::{Catalog, TableColumns};
pub use config::{load_config, resolve_config_path, AppConfig};
pub use ddl::{render_create_table, render_ddl, synthesize_ddl, DdlDocument};
pub use engine::{ColumnDescriptor, Connection, ConnectionConfig, ConnectionInfo, DatabaseEngine, QueryResult};
pub use error::{NlQueryError, Result};
pub use executor::QueryExecutor;
pub use extract::extract_sql;
pub use session::{Reply, Session, SessionContext};
