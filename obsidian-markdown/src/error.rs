use std::io;

use thiserror::Error;

/// Error type for loading and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("I/O error: {0}")]
  Io(#[from] io::Error),

  #[error("TOML error: {0}")]
  Toml(#[from] toml::de::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("Unsupported config file format: {0}")]
  UnsupportedFormat(String),

  #[error("Invalid configuration: {0}")]
  Invalid(String),
}
