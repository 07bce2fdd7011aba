//! Session Controller
//!
//! Owns the session context and turns each input line into output. Slash
//! commands go to the catalog, DDL and executor components; any other line
//! is a question for the assistant.
//!
//! Errors never end the session. They are rendered as the reply for the line
//! that caused them and the context is left as it was, except that a
//! question always discards the previous pending query first.

mod command;
mod context;

pub use command::{parse_input, Command, Input};
pub use context::SessionContext;

use tracing::{debug, warn};

use crate::assistant::Assistant;
use crate::catalog::Catalog;
use crate::ddl::synthesize_ddl;
use crate::engine::DatabaseEngine;
use crate::error::{NlQueryError, Result};
use crate::executor::QueryExecutor;
use crate::extract::extract_sql;
use crate::output::{render_columns, render_list, render_result};

/// Fixed instruction sent with every question
pub const SYSTEM_INSTRUCTION: &str = "You are a PostgreSQL expert helping an operator query their database. \
Answer with a short explanation and exactly one PostgreSQL query in a ```sql fenced code block. \
Use schema-qualified table names.";

/// Appended to an answer that contained SQL
pub const EXEC_HINT: &str = "Run /exec to execute this query.";

const HELP_TEXT: &str = "\
Commands:
  /help                     Show this help
  /schema [name]            Show or set the current schema
  /schemas                  List schemas
  /tables [schema]          List tables (default: current schema)
  /table [schema] <table>   Describe a table's columns
  /ddl [schema]             Show CREATE TABLE statements (default: current schema)
  /exec [sql]               Run the last suggested query, or the given SQL
  /execute [sql]            Same as /exec
  /clear                    Reset schema, table list and pending query
  /exit, /quit              Leave the session

Anything else is sent to the assistant as a question.";

/// What the caller should do after a line was handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Print this text and read the next line
    Print(String),
    /// Nothing to print
    Nothing,
    /// End the session
    Exit,
}

/// An interactive session over one database and one assistant
pub struct Session<E, A> {
    engine: E,
    assistant: A,
    context: SessionContext,
}

impl<E: DatabaseEngine, A: Assistant> Session<E, A> {
    /// Start a session with an empty context
    pub fn new(engine: E, assistant: A) -> Self {
        Self { engine, assistant, context: SessionContext::new() }
    }

    /// Current session context
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Handle one raw input line
    pub async fn handle_line(&mut self, line: &str) -> Reply {
        let outcome = match parse_input(line) {
            Ok(input) => self.dispatch(input).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(reply) => reply,
            Err(e) => {
                debug!(code = e.error_code(), "line failed");
                Reply::Print(e.message())
            }
        }
    }

    /// Route a classified input
    pub async fn dispatch(&mut self, input: Input) -> Result<Reply> {
        let text = match input {
            Input::Empty => return Ok(Reply::Nothing),
            Input::Question(question) => self.ask(&question).await?,
            Input::Command(Command::Exit) => return Ok(Reply::Exit),
            Input::Command(Command::Help) => HELP_TEXT.to_string(),
            Input::Command(Command::Clear) => {
                self.context.clear();
                "Session context cleared.".to_string()
            }
            Input::Command(Command::Schema(None)) => match self.context.current_schema() {
                Some(schema) => format!("Current schema: {schema}"),
                None => "No schema selected. Use /schema <name> to select one.".to_string(),
            },
            Input::Command(Command::Schema(Some(name))) => self.select_schema(name).await,
            Input::Command(Command::Schemas) => {
                let schemas = Catalog::new(&self.engine).list_schemas().await?;
                if schemas.is_empty() {
                    "No schemas found.".to_string()
                } else {
                    render_list(&schemas)
                }
            }
            Input::Command(Command::Tables(schema)) => {
                let schema = self.schema_or_current(schema, "/tables <schema>")?;
                let tables = Catalog::new(&self.engine).list_tables(&schema).await?;
                self.context.remember_tables(&schema, &tables);
                if tables.is_empty() {
                    format!("No tables found in schema '{schema}'.")
                } else {
                    render_list(&tables)
                }
            }
            Input::Command(Command::Table { schema, table }) => {
                let schema = self.schema_or_current(schema, "/table <schema> <table>")?;
                let columns = Catalog::new(&self.engine).describe_table(&schema, &table).await?;
                if columns.is_empty() {
                    format!("Table {schema}.{table} not found or has no columns.")
                } else {
                    render_columns(&columns)
                }
            }
            Input::Command(Command::Ddl(schema)) => {
                let schema = self.schema_or_current(schema, "/ddl <schema>")?;
                let document = synthesize_ddl(&Catalog::new(&self.engine), &schema).await?;
                self.context.remember_tables(&schema, &document.tables);
                document.to_string()
            }
            Input::Command(Command::Execute(sql)) => {
                let sql = sql.or_else(|| self.context.last_query().map(str::to_string));
                let result = QueryExecutor::new(&self.engine).execute(sql.as_deref()).await?;
                render_result(&result)
            }
        };

        Ok(Reply::Print(text))
    }

    async fn select_schema(&mut self, name: String) -> String {
        self.context.select_schema(name.clone());
        let selected = format!("Schema set to '{name}'.");

        match Catalog::new(&self.engine).list_schemas().await {
            Ok(schemas) if schemas.iter().any(|s| *s == name) => selected,
            Ok(_) => format!("{selected}\nWarning: schema '{name}' was not found in the database."),
            Err(e) => {
                warn!(code = e.error_code(), schema = %name, "could not verify schema: {e}");
                format!("{selected}\nWarning: could not verify schema: {}", e.message())
            }
        }
    }

    fn schema_or_current(&self, schema: Option<String>, usage: &str) -> Result<String> {
        schema
            .or_else(|| self.context.current_schema().map(str::to_string))
            .ok_or_else(|| {
                NlQueryError::invalid_input(format!(
                    "No schema selected. Use /schema <name> first or run {usage}"
                ))
            })
    }

    async fn ask(&mut self, question: &str) -> Result<String> {
        self.context.set_last_query(None);

        let system_context = self.system_context().await;
        let answer = self.assistant.complete(&system_context, question).await?;

        match extract_sql(&answer) {
            Some(sql) => {
                debug!(sql = %sql, "pending query updated");
                self.context.set_last_query(Some(sql));
                Ok(format!("{answer}\n\n{EXEC_HINT}"))
            }
            None => Ok(answer),
        }
    }

    /// Build the system message, re-reading the catalog for the current schema
    async fn system_context(&mut self) -> String {
        let mut sections = vec![SYSTEM_INSTRUCTION.to_string()];

        let Some(schema) = self.context.current_schema().map(str::to_string) else {
            return sections.join("\n\n");
        };
        sections.push(format!("Current schema: {schema}"));

        match synthesize_ddl(&Catalog::new(&self.engine), &schema).await {
            Ok(document) => {
                self.context.remember_tables(&schema, &document.tables);
                sections.push(format!("Tables: {}", self.context.known_tables_context()));
                sections.push(document.to_string());
            }
            Err(e) => {
                warn!(code = e.error_code(), schema = %schema, "could not read catalog for context: {e}");
            }
        }

        sections.join("\n\n")
    }
}
