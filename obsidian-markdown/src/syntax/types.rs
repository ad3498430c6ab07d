//! Core types and traits for syntax highlighting.

use std::{collections::HashMap, sync::Arc};

use super::error::{SyntaxError, SyntaxResult};

/// Trait for syntax highlighting backends.
///
/// A backend turns source code into the inner HTML of a `<code>` element.
/// Wrapping it into a block is the renderer's job, so backends stay
/// interchangeable.
pub trait SyntaxHighlighter: Send + Sync {
  /// Get the name of this highlighter backend
  fn name(&self) -> &'static str;

  /// Get a list of supported language tokens
  fn supported_languages(&self) -> Vec<String>;

  /// Check if a language is supported
  fn supports_language(&self, language: &str) -> bool {
    self
      .supported_languages()
      .iter()
      .any(|lang| lang.eq_ignore_ascii_case(language))
  }

  /// Highlight code as the given language.
  ///
  /// # Arguments
  ///
  /// * `code` - The source code to highlight
  /// * `language` - The programming language (case-insensitive)
  ///
  /// # Returns
  ///
  /// Highlighted HTML (without the surrounding `<pre><code>`) on success
  fn highlight(&self, code: &str, language: &str) -> SyntaxResult<String>;

  /// Guess the language of a snippet from its content, usually the first
  /// line (shebangs, XML preambles, modelines).
  fn detect_language(&self, code: &str) -> Option<String>;
}

/// Configuration for syntax highlighting
#[derive(Debug, Clone)]
pub struct SyntaxConfig {
  /// Language aliases for mapping common names to supported languages
  pub language_aliases: HashMap<String, String>,

  /// Whether to fall back to plain text for unsupported languages
  pub fallback_to_plain: bool,
}

impl Default for SyntaxConfig {
  fn default() -> Self {
    let language_aliases = [
      ("js", "javascript"),
      ("ts", "typescript"),
      ("py", "python"),
      ("rb", "ruby"),
      ("sh", "bash"),
      ("shell", "bash"),
      ("yml", "yaml"),
      ("md", "markdown"),
    ]
    .into_iter()
    .map(|(alias, language)| (alias.to_string(), language.to_string()))
    .collect();

    Self {
      language_aliases,
      fallback_to_plain: true,
    }
  }
}

/// High-level syntax highlighting manager.
///
/// Wraps a backend with alias resolution and plain-text fallback. Cloning is
/// cheap; the backend is shared.
#[derive(Clone)]
pub struct SyntaxManager {
  highlighter: Arc<dyn SyntaxHighlighter>,
  config:      SyntaxConfig,
}

impl std::fmt::Debug for SyntaxManager {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SyntaxManager")
      .field("highlighter", &self.highlighter.name())
      .field("config", &self.config)
      .finish()
  }
}

impl SyntaxManager {
  /// Create a new syntax manager with the given highlighter and config
  #[must_use]
  pub fn new(
    highlighter: Arc<dyn SyntaxHighlighter>,
    config: SyntaxConfig,
  ) -> Self {
    Self {
      highlighter,
      config,
    }
  }

  /// Create a new syntax manager with the default configuration
  #[must_use]
  pub fn with_highlighter(highlighter: Arc<dyn SyntaxHighlighter>) -> Self {
    Self::new(highlighter, SyntaxConfig::default())
  }

  /// Get the underlying highlighter
  #[must_use]
  pub fn highlighter(&self) -> &dyn SyntaxHighlighter {
    self.highlighter.as_ref()
  }

  /// Get the configuration
  #[must_use]
  pub const fn config(&self) -> &SyntaxConfig {
    &self.config
  }

  /// Resolve a language name using aliases. Lookup is case-insensitive and
  /// the result is lower-cased.
  #[must_use]
  pub fn resolve_language(&self, language: &str) -> String {
    let language = language.to_lowercase();
    self
      .config
      .language_aliases
      .get(&language)
      .cloned()
      .unwrap_or(language)
  }

  /// Detect the language of `code` and resolve it through the aliases.
  #[must_use]
  pub fn detect_language(&self, code: &str) -> Option<String> {
    self
      .highlighter
      .detect_language(code)
      .map(|language| self.resolve_language(&language))
  }

  /// Highlight code with alias resolution and plain-text fallback.
  ///
  /// # Errors
  ///
  /// Returns an error if the language is unknown and fallback is disabled, or
  /// if the backend fails.
  pub fn highlight_code(
    &self,
    code: &str,
    language: &str,
  ) -> SyntaxResult<String> {
    let resolved_language = self.resolve_language(language);

    if self.highlighter.supports_language(&resolved_language) {
      return self.highlighter.highlight(code, &resolved_language);
    }

    if self.config.fallback_to_plain {
      log::debug!(
        "No syntax for '{resolved_language}', highlighting as plain text"
      );
      return self.highlighter.highlight(code, "text");
    }

    Err(SyntaxError::UnsupportedLanguage(resolved_language))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Backend that only knows "upper", which upper-cases the code.
  struct UpperHighlighter;

  impl SyntaxHighlighter for UpperHighlighter {
    fn name(&self) -> &'static str {
      "Upper"
    }

    fn supported_languages(&self) -> Vec<String> {
      vec!["upper".to_string(), "text".to_string()]
    }

    fn highlight(&self, code: &str, language: &str) -> SyntaxResult<String> {
      match language {
        "upper" => Ok(code.to_uppercase()),
        "text" => Ok(code.to_string()),
        other => Err(SyntaxError::UnsupportedLanguage(other.to_string())),
      }
    }

    fn detect_language(&self, code: &str) -> Option<String> {
      code.starts_with("#!upper").then(|| "UP".to_string())
    }
  }

  fn manager(fallback_to_plain: bool) -> SyntaxManager {
    let mut config = SyntaxConfig::default();
    config.fallback_to_plain = fallback_to_plain;
    config
      .language_aliases
      .insert("up".to_string(), "upper".to_string());
    SyntaxManager::new(Arc::new(UpperHighlighter), config)
  }

  #[test]
  fn test_syntax_config_default() {
    let config = SyntaxConfig::default();
    assert!(config.fallback_to_plain);
    assert_eq!(config.language_aliases["js"], "javascript");
    assert_eq!(config.language_aliases["shell"], "bash");
  }

  #[test]
  fn test_resolve_language_is_case_insensitive() {
    let manager = manager(true);
    assert_eq!(manager.resolve_language("JS"), "javascript");
    assert_eq!(manager.resolve_language("Rust"), "rust");
  }

  #[test]
  fn test_highlight_alias_and_fallback() {
    let manager = manager(true);
    assert_eq!(manager.highlight_code("abc", "up").ok(), Some("ABC".into()));
    assert_eq!(manager.highlight_code("abc", "cobol").ok(), Some("abc".into()));
  }

  #[test]
  fn test_highlight_without_fallback() {
    let manager = manager(false);
    assert!(matches!(
      manager.highlight_code("abc", "cobol"),
      Err(SyntaxError::UnsupportedLanguage(lang)) if lang == "cobol"
    ));
  }

  #[test]
  fn test_detect_language_resolves_alias() {
    let manager = manager(true);
    assert_eq!(manager.detect_language("#!upper\nx"), Some("upper".into()));
    assert_eq!(manager.detect_language("plain"), None);
  }
}
