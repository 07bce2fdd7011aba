//! Mutable per-process session state

use crate::catalog::qualify;

/// State carried between lines of one interactive session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    current_schema: Option<String>,
    last_query: Option<String>,
    known_tables: Vec<String>,
}

impl SessionContext {
    /// Empty context: no schema, no query, no tables
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently selected schema
    #[must_use]
    pub fn current_schema(&self) -> Option<&str> {
        self.current_schema.as_deref()
    }

    /// SQL extracted from the last assistant reply
    #[must_use]
    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    /// Qualified `schema.table` names from the last table listing
    #[must_use]
    pub fn known_tables(&self) -> &[String] {
        &self.known_tables
    }

    /// Comma-joined table list injected into assistant prompts
    #[must_use]
    pub fn known_tables_context(&self) -> String {
        self.known_tables.join(",")
    }

    /// Select `schema`; the table cache belongs to the previous schema and is dropped
    pub(crate) fn select_schema(&mut self, schema: impl Into<String>) {
        self.current_schema = Some(schema.into());
        self.known_tables.clear();
    }

    pub(crate) fn remember_tables(&mut self, schema: &str, tables: &[String]) {
        self.known_tables = qualify(schema, tables);
    }

    pub(crate) fn set_last_query(&mut self, sql: Option<String>) {
        self.last_query = sql;
    }

    /// Reset schema, table cache and pending query together
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}
