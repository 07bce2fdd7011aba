//! Scripted in-memory database engine and assistant for integration tests
//!
//! Both mocks share their state through `Arc<Mutex<_>>`, so a test can hand
//! a clone to the code under test and inspect counters afterwards.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use nlquery::engine::{ColumnDescriptor, Connection, DatabaseEngine, QueryResult};
use nlquery::error::{NlQueryError, Result};
use nlquery::Assistant;

// ============================================================================
// Mock Database Engine
// ============================================================================

/// A table known to the mock catalog
#[derive(Debug, Clone)]
pub struct MockTable {
    pub schema: String,
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
}

#[derive(Debug, Default)]
pub struct MockState {
    pub schemas: Vec<String>,
    pub tables: Vec<MockTable>,
    /// Tables whose column lookup fails
    pub failing_tables: HashSet<String>,
    pub fail_connect: bool,
    pub fail_catalog: bool,
    pub fail_rollback: bool,
    /// Result returned by `run` for SQL that does not contain "fail"
    pub next_result: Option<QueryResult>,

    pub connects: usize,
    pub closes: usize,
    pub begins: usize,
    pub commits: usize,
    pub rollbacks: usize,
    pub executed: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    state: Arc<Mutex<MockState>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// `public` with `users(id integer not null, name varchar(50))` and `orders(id integer not null)`
    pub fn shop() -> Self {
        let engine = Self::new();
        {
            let mut state = engine.state();
            state.schemas = vec!["public".to_string(), "sales".to_string()];
            state.tables = vec![
                MockTable {
                    schema: "public".to_string(),
                    name: "users".to_string(),
                    columns: vec![
                        ColumnDescriptor::new("id", "integer").not_null(),
                        ColumnDescriptor::new("name", "character varying").with_max_length(50),
                    ],
                },
                MockTable {
                    schema: "public".to_string(),
                    name: "orders".to_string(),
                    columns: vec![ColumnDescriptor::new("id", "integer").not_null()],
                },
            ];
        }
        engine
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn set_result(&self, result: QueryResult) {
        self.state().next_result = Some(result);
    }
}

impl DatabaseEngine for MockEngine {
    type Connection = MockConnection;

    async fn connect(&self) -> Result<MockConnection> {
        let mut state = self.state();
        if state.fail_connect {
            return Err(NlQueryError::connection_failed("mock database is down"));
        }
        state.connects += 1;
        Ok(MockConnection { state: Arc::clone(&self.state) })
    }
}

pub struct MockConnection {
    state: Arc<Mutex<MockState>>,
}

impl MockConnection {
    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

impl Connection for MockConnection {
    async fn list_schemas(&mut self) -> Result<Vec<String>> {
        let state = self.state();
        if state.fail_catalog {
            return Err(NlQueryError::catalog_failed("permission denied for schema listing"));
        }
        Ok(state.schemas.clone())
    }

    async fn list_tables(&mut self, schema: &str) -> Result<Vec<String>> {
        let state = self.state();
        if state.fail_catalog {
            return Err(NlQueryError::catalog_failed("permission denied for table listing"));
        }
        Ok(state.tables.iter().filter(|t| t.schema == schema).map(|t| t.name.clone()).collect())
    }

    async fn list_columns(&mut self, schema: &str, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let state = self.state();
        if state.failing_tables.contains(table) {
            return Err(NlQueryError::catalog_failed(format!("permission denied for table {table}")));
        }
        Ok(state
            .tables
            .iter()
            .find(|t| t.schema == schema && t.name == table)
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    async fn begin(&mut self) -> Result<()> {
        self.state().begins += 1;
        Ok(())
    }

    async fn run(&mut self, sql: &str) -> Result<QueryResult> {
        let mut state = self.state();
        state.executed.push(sql.to_string());
        if sql.contains("fail") {
            return Err(NlQueryError::query_failed("syntax error at or near \"fail\""));
        }
        Ok(state
            .next_result
            .clone()
            .unwrap_or(QueryResult::Rows { columns: vec!["?column?".to_string()], rows: vec![] }))
    }

    async fn commit(&mut self) -> Result<()> {
        self.state().commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        let mut state = self.state();
        state.rollbacks += 1;
        if state.fail_rollback {
            return Err(NlQueryError::query_failed("connection lost during rollback"));
        }
        Ok(())
    }

    async fn close(self) {
        self.state().closes += 1;
    }
}

// ============================================================================
// Mock Assistant
// ============================================================================

/// One recorded completion request
#[derive(Debug, Clone)]
pub struct AssistantCall {
    pub system_context: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Default)]
pub struct MockAssistant {
    reply: Arc<Mutex<Option<String>>>,
    calls: Arc<Mutex<Vec<AssistantCall>>>,
}

impl MockAssistant {
    /// Assistant that always answers `reply`
    pub fn replying(reply: &str) -> Self {
        let assistant = Self::default();
        assistant.set_reply(Some(reply));
        assistant
    }

    /// Assistant whose provider is unreachable
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn set_reply(&self, reply: Option<&str>) {
        *self.reply.lock().unwrap() = reply.map(str::to_string);
    }

    pub fn calls(&self) -> Vec<AssistantCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Assistant for MockAssistant {
    async fn complete(&self, system_context: &str, prompt: &str) -> Result<String> {
        self.calls.lock().unwrap().push(AssistantCall {
            system_context: system_context.to_string(),
            prompt: prompt.to_string(),
        });

        self.reply
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| NlQueryError::assistant_failed("mock provider unreachable"))
    }
}
