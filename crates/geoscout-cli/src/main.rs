#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod repl;

use std::process;

use anyhow::Context;

use crate::config::{Cli, create_session};

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "geoscout_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "geoscout_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "geoscout_cli::config";
pub const TRACING_TARGET_REPL: &str = "geoscout_cli::repl";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SHUTDOWN,
            "Application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %error,
            "Application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    cli.logging.init_tracing()?;
    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        "Starting geoscout"
    );
    cli.log();
    cli.validate()?;

    let mut session = create_session(&cli)
        .await
        .context("failed to initialize services")?;

    match cli.query.as_deref() {
        Some(query) => repl::ask_once(&mut session, query).await,
        None => repl::run(&mut session).await,
    }
}
