//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── overpass: OverpassConfig    # Overpass endpoint, timeout, user agent
//! ├── postgres: PgConfig          # Embeddings database pool
//! ├── engine: EngineConfig        # Similarity fan-out, deadlines, top-k
//! ├── chat: ChatConfig            # Tool round limit, system preamble
//! ├── anthropic: AnthropicConfig  # Model, API key, token budget
//! └── logging: LogConfig          # Log output format
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! POSTGRES_URL="postgresql://..." ANTHROPIC_API_KEY="sk-ant-..." geoscout
//! geoscout --query "Find marinas near the Presidio"
//! ```

mod logging;
mod services;

use std::process;

use anyhow::Context;
use clap::Parser;
use geoscout_overpass::OverpassConfig;
use geoscout_postgres::PgConfig;
use geoscout_rig::chat::ChatConfig;
use geoscout_rig::provider::AnthropicConfig;
use geoscout_vector::EngineConfig;
pub use logging::LogConfig;
pub use services::create_session;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "geoscout")]
#[command(about = "Ask questions about map features and similar satellite imagery")]
#[command(version)]
pub struct Cli {
    /// Answer a single question and exit instead of starting a chat.
    #[arg(short, long)]
    pub query: Option<String>,

    /// Overpass API configuration.
    #[clap(flatten)]
    pub overpass: OverpassConfig,

    /// Embeddings database configuration.
    #[clap(flatten)]
    pub postgres: PgConfig,

    /// Similarity search configuration.
    #[clap(flatten)]
    pub engine: EngineConfig,

    /// Chat loop configuration.
    #[clap(flatten)]
    pub chat: ChatConfig,

    /// Language model configuration.
    #[clap(flatten)]
    pub anthropic: AnthropicConfig,

    /// Logging configuration.
    #[clap(flatten)]
    pub logging: LogConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    ///
    /// Called before parsing so that clap's `env` fallbacks see the values.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.overpass
            .validate()
            .context("invalid Overpass configuration")?;
        self.postgres
            .validate()
            .context("invalid database configuration")?;
        self.engine
            .validate()
            .context("invalid similarity engine configuration")?;
        self.chat.validate().context("invalid chat configuration")?;
        self.anthropic
            .validate()
            .context("invalid Anthropic configuration")?;
        Ok(())
    }

    /// Logs configuration (no sensitive information).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            overpass_endpoint = %self.overpass.endpoint,
            overpass_timeout_secs = self.overpass.timeout_secs,
            database_url = %self.postgres.database_url_masked(),
            postgres_max_connections = self.postgres.postgres_max_connections,
            max_concurrency = self.engine.max_concurrency,
            point_timeout_secs = self.engine.point_timeout_secs,
            top_k = self.engine.top_k,
            max_tool_rounds = self.chat.max_tool_rounds,
            model = %self.anthropic.anthropic_model,
            "Configuration loaded"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
