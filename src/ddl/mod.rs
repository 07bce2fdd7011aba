//! DDL Synthesizer
//!
//! Renders `CREATE TABLE` statements from catalog column metadata.
//!
//! Types and default expressions are copied from the catalog verbatim. The
//! output is only meaningful for the database family the metadata came from.

use std::fmt;

use crate::catalog::{Catalog, TableColumns};
use crate::engine::{ColumnDescriptor, DatabaseEngine};
use crate::error::Result;

/// `CREATE TABLE` text for every table of one schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdlDocument {
    /// Schema the document describes
    pub schema: String,

    /// Table names in catalog order
    pub tables: Vec<String>,

    /// One entry per table: a statement or a placeholder comment
    pub statements: Vec<String>,
}

impl DdlDocument {
    /// Whether the schema had no tables
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl fmt::Display for DdlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.statements.is_empty() {
            return write!(f, "-- No tables found in schema '{}'.", self.schema);
        }
        f.write_str(&self.statements.join("\n\n"))
    }
}

/// Synthesize the DDL of every table in `schema`
pub async fn synthesize_ddl<E: DatabaseEngine>(catalog: &Catalog<'_, E>, schema: &str) -> Result<DdlDocument> {
    let tables = catalog.describe_schema(schema).await?;
    Ok(render_ddl(schema, &tables))
}

/// Render a document from already-read table metadata
#[must_use]
pub fn render_ddl(schema: &str, tables: &[TableColumns]) -> DdlDocument {
    let statements = tables
        .iter()
        .map(|entry| match &entry.columns {
            Ok(columns) if !columns.is_empty() => render_create_table(schema, &entry.table, columns),
            _ => format!("-- Could not retrieve columns for table {schema}.{}", entry.table),
        })
        .collect();

    DdlDocument {
        schema: schema.to_string(),
        tables: tables.iter().map(|entry| entry.table.clone()).collect(),
        statements,
    }
}

/// Render one `CREATE TABLE` statement, columns in the given order
#[must_use]
pub fn render_create_table(schema: &str, table: &str, columns: &[ColumnDescriptor]) -> String {
    let lines: Vec<String> = columns.iter().map(|col| format!("    {}", render_column(col))).collect();
    format!("CREATE TABLE {schema}.{table} (\n{}\n);", lines.join(",\n"))
}

fn render_column(col: &ColumnDescriptor) -> String {
    let mut line = format!("{} {}", col.name, col.data_type);
    if let Some(max_length) = col.max_length {
        line.push_str(&format!("({max_length})"));
    }
    if !col.nullable {
        line.push_str(" NOT NULL");
    }
    if let Some(default) = &col.default {
        line.push_str(" DEFAULT ");
        line.push_str(default);
    }
    line
}
