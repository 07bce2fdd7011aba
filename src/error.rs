//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout nlquery.
//! Every error maps to a stable error code so the session can log and report
//! failures uniformly. None of them end the session on their own.
//!
//! # Error Categories
//! - `ConnectionFailed`: The database cannot be reached or authenticated against
//! - `CatalogFailed`: A metadata query against the information catalog failed
//! - `QueryFailed`: A user SQL statement failed and was rolled back
//! - `NoQuery`: `/exec` was invoked with nothing to run
//! - `UnknownCommand`: Unrecognised slash-command
//! - `InvalidInput`: Malformed command arguments
//! - `AssistantFailed`: The AI provider round-trip failed
//! - `ConfigError`: Configuration file problems (fatal only at startup)

use thiserror::Error;

/// Main error type for nlquery operations
#[derive(Error, Debug)]
pub enum NlQueryError {
    /// Database connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Catalog (metadata) query failed
    #[error("Catalog query failed: {0}")]
    CatalogFailed(String),

    /// Query execution failed
    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    /// Nothing to execute
    #[error("No query to execute. Ask a question first or pass SQL to /execute.")]
    NoQuery,

    /// Unrecognised slash-command
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Invalid input or missing required arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// AI provider request failed
    #[error("Assistant request failed: {0}")]
    AssistantFailed(String),

    /// Configuration error (file not found, invalid JSON, etc.)
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl NlQueryError {
    /// Convert error to a stable error code string
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::CatalogFailed(_) => "CATALOG_FAILED",
            Self::QueryFailed(_) => "QUERY_FAILED",
            Self::NoQuery => "NO_QUERY",
            Self::UnknownCommand(_) => "UNKNOWN_COMMAND",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::AssistantFailed(_) => "ASSISTANT_FAILED",
            Self::ConfigError(_) => "CONFIG_ERROR",
        }
    }

    /// Get human-readable error message
    ///
    /// Never contains credentials: connection errors are built from driver
    /// messages, which do not echo the password.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed(message.into())
    }

    /// Create a catalog failed error
    pub fn catalog_failed(message: impl Into<String>) -> Self {
        Self::CatalogFailed(message.into())
    }

    /// Create a query failed error
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryFailed(message.into())
    }

    /// Create an unknown command error
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::UnknownCommand(command.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an assistant failed error
    pub fn assistant_failed(message: impl Into<String>) -> Self {
        Self::AssistantFailed(message.into())
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }
}

/// Result type alias for nlquery operations
pub type Result<T> = std::result::Result<T, NlQueryError>;
