//! Configuration management.
//!
//! Configuration is set via environment variables:
//! - `GEMINI_API_KEY` - Required. Your Gemini API key.
//! - `GEMINI_MODEL` - Optional. Model identifier. Defaults to `gemini-2.0-flash-001`.
//! - `WORKING_DIR` - Optional. The sandbox directory. Defaults to the current directory.
//! - `MAX_ITERATIONS` - Optional. Maximum agent loop iterations. Defaults to `20`.
//! - `ITERATION_DELAY_MS` - Optional. Pacing delay between iterations in
//!   milliseconds, for rate-limited API keys. Defaults to `0`.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key
    pub api_key: String,

    /// Model identifier
    pub model: String,

    /// Sandbox directory for all tool operations
    pub working_dir: PathBuf,

    /// Maximum iterations for the agent loop
    pub max_iterations: usize,

    /// Pacing delay inserted between iterations
    pub iteration_delay: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `GEMINI_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()))?;

        let model = std::env::var("GEMINI_MODEL")
            .unwrap_or_else(|_| "gemini-2.0-flash-001".to_string());

        let working_dir = std::env::var("WORKING_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let max_iterations = std::env::var("MAX_ITERATIONS")
            .unwrap_or_else(|_| "20".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("MAX_ITERATIONS".to_string(), format!("{e}")))?;

        let iteration_delay = std::env::var("ITERATION_DELAY_MS")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .map(Duration::from_millis)
            .map_err(|e| {
                ConfigError::InvalidValue("ITERATION_DELAY_MS".to_string(), format!("{e}"))
            })?;

        Ok(Self {
            api_key,
            model,
            working_dir,
            max_iterations,
            iteration_delay,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, model: String, working_dir: PathBuf) -> Self {
        Self {
            api_key,
            model,
            working_dir,
            max_iterations: 20,
            iteration_delay: Duration::ZERO,
        }
    }
}
