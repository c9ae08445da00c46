//! Server configuration loaded from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A configuration loading failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub max_turns: usize,
    pub output_dir: PathBuf,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// A `.env` file in the current directory is honored. Variables:
    ///
    /// * `BIND_ADDRESS`: address and port to bind (default "0.0.0.0:3000").
    /// * `STORY_MAX_TURNS`: turns before a story completes (default 5).
    /// * `STORY_OUTPUT_DIR`: directory for rendered comics (default "output").
    /// * `RUST_LOG`: logging level (default "INFO").
    ///
    /// Provider API keys (`ANTHROPIC_API_KEY`, `OPENAI_API_KEY`,
    /// `ELEVENLABS_API_KEY`) are read per session, with per-request
    /// overrides, so they are not validated here.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_vars(
            std::env::var("BIND_ADDRESS").ok(),
            std::env::var("STORY_MAX_TURNS").ok(),
            std::env::var("STORY_OUTPUT_DIR").ok(),
            std::env::var("RUST_LOG").ok(),
        )
    }

    fn from_vars(
        bind_address: Option<String>,
        max_turns: Option<String>,
        output_dir: Option<String>,
        log_level: Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind_address = parse_bind_address(bind_address.as_deref())?;
        let max_turns = parse_max_turns(max_turns.as_deref())?;
        let output_dir = PathBuf::from(output_dir.unwrap_or_else(|| "output".to_string()));
        let log_level = parse_log_level(log_level.as_deref())?;

        Ok(Self {
            bind_address,
            max_turns,
            output_dir,
            log_level,
        })
    }
}

fn parse_bind_address(raw: Option<&str>) -> Result<SocketAddr, ConfigError> {
    let raw = raw.unwrap_or("0.0.0.0:3000");
    raw.parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))
}

fn parse_max_turns(raw: Option<&str>) -> Result<usize, ConfigError> {
    match raw {
        Some(value) => value.parse::<usize>().map_err(|_| {
            ConfigError::InvalidValue(
                "STORY_MAX_TURNS".to_string(),
                format!("'{value}' is not a valid turn count"),
            )
        }),
        None => Ok(story_core::DEFAULT_MAX_TURNS),
    }
}

fn parse_log_level(raw: Option<&str>) -> Result<Level, ConfigError> {
    let raw = raw.unwrap_or("INFO");
    raw.parse::<Level>().map_err(|_| {
        ConfigError::InvalidValue(
            "RUST_LOG".to_string(),
            format!("'{raw}' is not a valid log level"),
        )
    })
}
