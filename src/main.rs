//! nlquery CLI Entry Point
//!
//! Loads the configuration, connects the database engine and the assistant,
//! then runs the interactive session on stdin/stdout. Logs go to stderr.
//!
//! Configuration problems are fatal (exit status 1). An unreachable database
//! is not: the session starts anyway and each command reports its own error.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use nlquery::assistant::AssistantClient;
use nlquery::config::{load_config, resolve_config_path};
use nlquery::engine::postgres::PostgresEngine;
use nlquery::session::Session;

/// nlquery - ask your PostgreSQL database questions in plain language
#[derive(Parser)]
#[command(name = "nlquery")]
#[command(about = "Interactive natural-language SQL session with live schema introspection")]
#[command(version)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, short = 'c', value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let path = resolve_config_path(cli.config.as_deref())?;
    let config = load_config(&path)?;
    tracing::info!(path = %path.display(), "configuration loaded");

    let connection = config.database.resolve()?;
    let assistant = AssistantClient::from_settings(&config.ai)?;
    let engine = PostgresEngine::new(connection);

    match engine.validate_connection().await {
        Ok(info) => println!(
            "Connected to {} as {} (PostgreSQL {})",
            info.connected_database, info.user, info.database_version
        ),
        Err(e) => {
            tracing::warn!(code = e.error_code(), "startup connection check failed");
            println!("Warning: {}", e.message());
        }
    }
    println!("Assistant: {} ({})", assistant.provider_name(), assistant.model_name());

    let mut session = Session::new(engine, assistant);
    nlquery::repl::run(&mut session).await.context("Line editor failed")?;
    Ok(())
}
