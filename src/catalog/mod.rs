//! Catalog Reader
//!
//! Read-only metadata lookups (schemas, tables, columns) against the database.
//!
//! Each public operation opens its own connection and closes it before
//! returning, on success and on failure. `describe_schema` reads a whole
//! schema over one connection and captures per-table failures instead of
//! aborting the batch.

use tracing::{debug, warn};

use crate::engine::{ColumnDescriptor, Connection, DatabaseEngine};
use crate::error::Result;

/// Columns of one table, or the error that prevented reading them
#[derive(Debug)]
pub struct TableColumns {
    /// Table name
    pub table: String,

    /// Columns in ordinal order
    pub columns: Result<Vec<ColumnDescriptor>>,
}

/// Catalog reader bound to a database engine
pub struct Catalog<'a, E> {
    engine: &'a E,
}

impl<'a, E: DatabaseEngine> Catalog<'a, E> {
    /// Create a catalog reader
    pub const fn new(engine: &'a E) -> Self {
        Self { engine }
    }

    /// List all user schemas
    pub async fn list_schemas(&self) -> Result<Vec<String>> {
        let mut conn = self.engine.connect().await?;
        let result = conn.list_schemas().await;
        conn.close().await;

        if let Ok(schemas) = &result {
            debug!(count = schemas.len(), "listed schemas");
        }
        result
    }

    /// List base tables of `schema` (empty if the schema is unknown)
    pub async fn list_tables(&self, schema: &str) -> Result<Vec<String>> {
        let mut conn = self.engine.connect().await?;
        let result = conn.list_tables(schema).await;
        conn.close().await;

        if let Ok(tables) = &result {
            debug!(schema, count = tables.len(), "listed tables");
        }
        result
    }

    /// Describe the columns of `schema.table` (empty if the table is unknown)
    pub async fn describe_table(&self, schema: &str, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let mut conn = self.engine.connect().await?;
        let result = conn.list_columns(schema, table).await;
        conn.close().await;
        result
    }

    /// Read every table of `schema` with its columns over a single connection
    ///
    /// Failing to list the tables fails the call. Failing to read one table's
    /// columns is recorded in that table's entry and the batch continues.
    pub async fn describe_schema(&self, schema: &str) -> Result<Vec<TableColumns>> {
        let mut conn = self.engine.connect().await?;

        let tables = match conn.list_tables(schema).await {
            Ok(tables) => tables,
            Err(e) => {
                conn.close().await;
                return Err(e);
            }
        };

        let mut described = Vec::with_capacity(tables.len());
        for table in tables {
            let columns = conn.list_columns(schema, &table).await;
            if let Err(e) = &columns {
                warn!(code = e.error_code(), schema, table = %table, "could not read columns: {e}");
            }
            described.push(TableColumns { table, columns });
        }

        conn.close().await;
        Ok(described)
    }
}

/// Qualify table names with their schema (`schema.table`)
#[must_use]
pub fn qualify(schema: &str, tables: &[String]) -> Vec<String> {
    tables.iter().map(|table| format!("{schema}.{table}")).collect()
}
