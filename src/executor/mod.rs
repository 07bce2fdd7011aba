//! Query Executor
//!
//! Runs one caller-supplied SQL statement inside its own connection and
//! transaction.
//!
//! # Guarantees
//! - Blank or missing SQL fails with `NoQuery` before any connection is opened
//! - Success commits; a failed statement is rolled back
//! - The connection is closed exactly once on every path

use std::time::Instant;
use tracing::{debug, warn};

use crate::engine::{Connection, DatabaseEngine, QueryResult};
use crate::error::{NlQueryError, Result};

/// Executes user SQL against a database engine
pub struct QueryExecutor<'a, E> {
    engine: &'a E,
}

impl<'a, E: DatabaseEngine> QueryExecutor<'a, E> {
    /// Create an executor
    pub const fn new(engine: &'a E) -> Self {
        Self { engine }
    }

    /// Execute `sql` verbatim
    pub async fn execute(&self, sql: Option<&str>) -> Result<QueryResult> {
        let sql = sql.map(str::trim).filter(|s| !s.is_empty()).ok_or(NlQueryError::NoQuery)?;

        let mut conn = self.engine.connect().await?;

        let start = Instant::now();
        let result = run_in_transaction(&mut conn, sql).await;
        conn.close().await;

        match &result {
            Ok(outcome) => debug!(
                rows = outcome.row_count(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "statement executed"
            ),
            Err(e) => debug!(code = e.error_code(), "statement failed"),
        }
        result
    }
}

async fn run_in_transaction<C: Connection>(conn: &mut C, sql: &str) -> Result<QueryResult> {
    conn.begin().await?;

    match conn.run(sql).await {
        Ok(outcome) => {
            conn.commit().await?;
            Ok(outcome)
        }
        Err(e) => {
            if let Err(rollback_err) = conn.rollback().await {
                warn!(code = rollback_err.error_code(), "rollback failed: {rollback_err}");
            }
            Err(e)
        }
    }
}
