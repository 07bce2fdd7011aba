//! Input classification and slash-command parsing

use crate::error::{NlQueryError, Result};

/// One classified input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Blank line
    Empty,
    /// `/<word> [args]`
    Command(Command),
    /// Anything else goes to the assistant
    Question(String),
}

/// Slash-commands understood by the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/exit` or `/quit`: end the session
    Exit,
    /// `/help`: show the command reference
    Help,
    /// `/clear`: reset the session context
    Clear,
    /// `/schema [name]`: `None` shows the current schema
    Schema(Option<String>),
    /// `/schemas`: list user schemas
    Schemas,
    /// `/tables [schema]`: `None` uses the current schema
    Tables(Option<String>),
    /// `/table [schema] <table>`: describe one table's columns
    Table {
        /// `None` uses the current schema
        schema: Option<String>,
        /// Table name
        table: String,
    },
    /// `/ddl [schema]`: `None` uses the current schema
    Ddl(Option<String>),
    /// `/exec [sql]` or `/execute [sql]`: `None` runs the pending query
    Execute(Option<String>),
}

/// Classify a raw input line
///
/// Command words are case-insensitive; arguments keep their case.
pub fn parse_input(line: &str) -> Result<Input> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(Input::Empty);
    }

    match trimmed.strip_prefix('/') {
        Some(rest) => parse_command(rest).map(Input::Command),
        None => Ok(Input::Question(trimmed.to_string())),
    }
}

fn parse_command(rest: &str) -> Result<Command> {
    let (word, remainder) = match rest.split_once(char::is_whitespace) {
        Some((word, remainder)) => (word, remainder.trim()),
        None => (rest, ""),
    };
    if word.is_empty() {
        return Err(NlQueryError::invalid_input("Empty command. Type /help for available commands."));
    }
    let args: Vec<&str> = remainder.split_whitespace().collect();

    match word.to_lowercase().as_str() {
        "exit" | "quit" => Ok(Command::Exit),
        "help" => Ok(Command::Help),
        "clear" => Ok(Command::Clear),
        "schema" => match args.as_slice() {
            [] => Ok(Command::Schema(None)),
            [name] => Ok(Command::Schema(Some((*name).to_string()))),
            _ => Err(NlQueryError::invalid_input("Usage: /schema [name]")),
        },
        "schemas" => Ok(Command::Schemas),
        "tables" => match args.as_slice() {
            [] => Ok(Command::Tables(None)),
            [schema] => Ok(Command::Tables(Some((*schema).to_string()))),
            _ => Err(NlQueryError::invalid_input("Usage: /tables [schema]")),
        },
        "table" => match args.as_slice() {
            [table] => Ok(Command::Table { schema: None, table: (*table).to_string() }),
            [schema, table] => Ok(Command::Table {
                schema: Some((*schema).to_string()),
                table: (*table).to_string(),
            }),
            _ => Err(NlQueryError::invalid_input("Usage: /table [schema] <table>")),
        },
        "ddl" => match args.as_slice() {
            [] => Ok(Command::Ddl(None)),
            [schema] => Ok(Command::Ddl(Some((*schema).to_string()))),
            _ => Err(NlQueryError::invalid_input("Usage: /ddl [schema]")),
        },
        "exec" | "execute" => Ok(Command::Execute((!remainder.is_empty()).then(|| remainder.to_string()))),
        _ => Err(NlQueryError::unknown_command(word)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(line: &str) -> Command {
        match parse_input(line).unwrap() {
            Input::Command(cmd) => cmd,
            other => panic!("Expected command, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_and_questions() {
        assert_eq!(parse_input("").unwrap(), Input::Empty);
        assert_eq!(parse_input("   \t").unwrap(), Input::Empty);
        assert_eq!(
            parse_input("  how many users signed up today? ").unwrap(),
            Input::Question("how many users signed up today?".to_string())
        );
    }

    #[test]
    fn test_words_are_case_insensitive() {
        assert_eq!(command("/EXIT"), Command::Exit);
        assert_eq!(command("/Quit"), Command::Exit);
        assert_eq!(command("/Schema Sales"), Command::Schema(Some("Sales".to_string())));
    }

    #[test]
    fn test_optional_schema_arguments() {
        assert_eq!(command("/schema"), Command::Schema(None));
        assert_eq!(command("/tables"), Command::Tables(None));
        assert_eq!(command("/tables public"), Command::Tables(Some("public".to_string())));
        assert_eq!(command("/ddl"), Command::Ddl(None));
        assert_eq!(command("/ddl sales"), Command::Ddl(Some("sales".to_string())));
    }

    #[test]
    fn test_table_forms() {
        assert_eq!(command("/table users"), Command::Table { schema: None, table: "users".to_string() });
        assert_eq!(
            command("/table public users"),
            Command::Table { schema: Some("public".to_string()), table: "users".to_string() }
        );
        let err = parse_input("/table").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(parse_input("/table a b c").is_err());
    }

    #[test]
    fn test_execute_keeps_sql_verbatim() {
        assert_eq!(command("/exec"), Command::Execute(None));
        assert_eq!(command("/execute   "), Command::Execute(None));
        assert_eq!(
            command("/EXECUTE select 1   where  false"),
            Command::Execute(Some("select 1   where  false".to_string()))
        );
    }

    #[test]
    fn test_unknown_command() {
        let err = parse_input("/frobnicate now").unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_COMMAND");
        assert_eq!(err.message(), "Unknown command: frobnicate");
    }

    #[test]
    fn test_every_command_word_parses() {
        let cases = [
            ("/exit", Command::Exit),
            ("/quit", Command::Exit),
            ("/help", Command::Help),
            ("/clear", Command::Clear),
            ("/schema", Command::Schema(None)),
            ("/schemas", Command::Schemas),
            ("/tables", Command::Tables(None)),
            ("/table t", Command::Table { schema: None, table: "t".to_string() }),
            ("/ddl", Command::Ddl(None)),
            ("/exec", Command::Execute(None)),
            ("/execute", Command::Execute(None)),
        ];
        for (line, expected) in cases {
            assert_eq!(command(line), expected, "line: {line}");
        }
    }

    #[test]
    fn test_lone_slash() {
        assert_eq!(parse_input("/").unwrap_err().error_code(), "INVALID_INPUT");
    }
}
