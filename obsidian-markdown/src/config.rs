//! Configuration for the renderer and its cache.
//!
//! ```toml
//! [markdown]
//! highlight_code = true
//! note_url_prefix = "/note/"
//!
//! [cache]
//! max_size = 500
//! ```
use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{cache::CacheConfig, error::ConfigError, processor::MarkdownOptions};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Rendering options.
  pub markdown: MarkdownOptions,

  /// Render cache sizing.
  pub cache: CacheConfig,
}

impl Config {
  /// Load configuration from a TOML or JSON file, chosen by extension.
  ///
  /// Missing fields take their defaults. The loaded configuration is
  /// validated before it is returned.
  ///
  /// # Errors
  ///
  /// Returns an error if the file cannot be read or parsed, if the format is
  /// unsupported, or if validation fails.
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();

    let config: Self =
      match path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase)
      {
        Some(ext) if ext == "toml" => {
          toml::from_str(&fs::read_to_string(path)?)?
        },
        Some(ext) if ext == "json" => {
          serde_json::from_str(&fs::read_to_string(path)?)?
        },
        _ => {
          return Err(ConfigError::UnsupportedFormat(
            path.display().to_string(),
          ));
        },
      };

    config.validate()?;
    Ok(config)
  }

  /// Check the configuration for values the renderer cannot work with.
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError::Invalid`] if any URL prefix is empty.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let prefixes = [
      ("note_url_prefix", &self.markdown.note_url_prefix),
      ("attachment_url_prefix", &self.markdown.attachment_url_prefix),
      ("tag_url_prefix", &self.markdown.tag_url_prefix),
    ];

    for (name, value) in prefixes {
      if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{name} must not be empty")));
      }
    }
    Ok(())
  }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
  use std::io::Write;

  use tempfile::NamedTempFile;

  use super::*;

  fn write_config(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
      .suffix(suffix)
      .tempfile()
      .expect("Failed to create temp file");
    file
      .write_all(content.as_bytes())
      .expect("Failed to write temp file");
    file
  }

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.cache.max_size, 500);
    assert_eq!(config.markdown.note_url_prefix, "/note/");
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_load_toml_partial() {
    let file = write_config(
      ".toml",
      "[markdown]\nhard_breaks = false\ntag_url_prefix = \"/tags/\"\n\n\
       [cache]\nmax_size = 10\n",
    );
    let config = Config::from_file(file.path()).expect("config should load");

    assert!(!config.markdown.hard_breaks);
    assert_eq!(config.markdown.tag_url_prefix, "/tags/");
    assert_eq!(config.markdown.note_url_prefix, "/note/");
    assert_eq!(config.cache.max_size, 10);
  }

  #[test]
  fn test_load_json() {
    let file = write_config(
      ".json",
      r#"{"markdown": {"note_url_prefix": "/n/"}, "cache": {"max_size": 3}}"#,
    );
    let config = Config::from_file(file.path()).expect("config should load");
    assert_eq!(config.markdown.note_url_prefix, "/n/");
    assert_eq!(config.cache.max_size, 3);
  }

  #[test]
  fn test_unsupported_extension() {
    let file = write_config(".yaml", "cache: {}");
    match Config::from_file(file.path()) {
      Err(ConfigError::UnsupportedFormat(_)) => {},
      other => panic!("expected UnsupportedFormat, got {other:?}"),
    }
  }

  #[test]
  fn test_malformed_toml() {
    let file = write_config(".toml", "[cache\nmax_size = ");
    assert!(matches!(
      Config::from_file(file.path()),
      Err(ConfigError::Toml(_))
    ));
  }

  #[test]
  fn test_empty_prefix_rejected() {
    let file = write_config(".toml", "[markdown]\nnote_url_prefix = \"\"\n");
    match Config::from_file(file.path()) {
      Err(ConfigError::Invalid(msg)) => {
        assert!(msg.contains("note_url_prefix"));
      },
      other => panic!("expected Invalid, got {other:?}"),
    }
  }

  #[test]
  fn test_missing_file() {
    let result = Config::from_file("/nonexistent/obsidian-markdown.toml");
    assert!(matches!(result, Err(ConfigError::Io(_))));
  }
}
