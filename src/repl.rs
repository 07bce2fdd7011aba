//! Interactive line loop
//!
//! Reads lines with `rustyline`, hands each one to the session and prints the
//! reply. History is kept in memory for the lifetime of the process.

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use crate::assistant::Assistant;
use crate::engine::DatabaseEngine;
use crate::session::{Reply, Session};

/// Prompt shown before every line
pub const PROMPT: &str = "nlquery> ";

/// Run the loop until `/exit`, `/quit` or end of input
pub async fn run<E: DatabaseEngine, A: Assistant>(session: &mut Session<E, A>) -> rustyline::Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("Type /help for commands, /exit to quit.");

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = editor.add_history_entry(line.as_str());
                }

                match session.handle_line(&line).await {
                    Reply::Print(text) => println!("{text}"),
                    Reply::Nothing => {}
                    Reply::Exit => break,
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Use /exit or Ctrl-D to quit.");
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e),
        }
    }

    debug!("session ended");
    println!("Goodbye!");
    Ok(())
}
