//! Syntect-based syntax highlighting backend.
//!
//! Uses the Sublime Text syntax definitions bundled with syntect and emits
//! CSS classes instead of inline styles, so the page stylesheet picks the
//! colours.

use std::sync::{Arc, OnceLock};

use syntect::{
  html::{ClassStyle, ClassedHTMLGenerator},
  parsing::{SyntaxReference, SyntaxSet},
  util::LinesWithEndings,
};

use super::{
  error::{SyntaxError, SyntaxResult},
  types::{SyntaxConfig, SyntaxHighlighter, SyntaxManager},
};

/// Tokens that always mean "no highlighting".
const PLAIN_TOKENS: &[&str] = &["text", "plain", "plaintext", "txt"];

/// Syntect-based syntax highlighter
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntectHighlighter;

impl SyntectHighlighter {
  /// Get the syntect `SyntaxSet`.
  fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
  }

  /// Look a language up by token, then name, then extension.
  fn find_syntax(language: &str) -> Option<&'static SyntaxReference> {
    let syntax_set = Self::syntax_set();
    let lowercase = language.to_ascii_lowercase();

    if PLAIN_TOKENS.contains(&lowercase.as_str()) {
      return Some(syntax_set.find_syntax_plain_text());
    }

    syntax_set
      .find_syntax_by_token(&lowercase)
      .or_else(|| syntax_set.find_syntax_by_name(language))
      .or_else(|| syntax_set.find_syntax_by_extension(&lowercase))
  }
}

impl SyntaxHighlighter for SyntectHighlighter {
  fn name(&self) -> &'static str {
    "Syntect"
  }

  fn supported_languages(&self) -> Vec<String> {
    Self::syntax_set()
      .syntaxes()
      .iter()
      .flat_map(|syntax| {
        std::iter::once(syntax.name.to_lowercase())
          .chain(syntax.file_extensions.iter().map(|ext| ext.to_lowercase()))
      })
      .collect()
  }

  fn supports_language(&self, language: &str) -> bool {
    Self::find_syntax(language).is_some()
  }

  fn highlight(&self, code: &str, language: &str) -> SyntaxResult<String> {
    let syntax_set = Self::syntax_set();
    let syntax = Self::find_syntax(language)
      .unwrap_or_else(|| syntax_set.find_syntax_plain_text());

    let mut generator = ClassedHTMLGenerator::new_with_class_style(
      syntax,
      syntax_set,
      ClassStyle::Spaced,
    );

    let mut code_with_newline = code.to_string();
    if !code_with_newline.ends_with('\n') {
      code_with_newline.push('\n');
    }

    for line in LinesWithEndings::from(code_with_newline.as_str()) {
      generator
        .parse_html_for_line_which_includes_newline(line)
        .map_err(|e| SyntaxError::HighlightingFailed(e.to_string()))?;
    }

    Ok(generator.finalize())
  }

  fn detect_language(&self, code: &str) -> Option<String> {
    let syntax_set = Self::syntax_set();
    let first_line = code.lines().next()?;
    let syntax = syntax_set.find_syntax_by_first_line(first_line)?;

    if syntax.name == syntax_set.find_syntax_plain_text().name {
      return None;
    }

    Some(
      syntax
        .file_extensions
        .first()
        .map_or_else(|| syntax.name.to_lowercase(), |ext| ext.to_lowercase()),
    )
  }
}

/// Create a Syntect-based syntax manager with the default configuration.
///
/// # Errors
///
/// Returns [`SyntaxError::BackendError`] if the bundled syntax definitions
/// failed to load.
pub fn create_syntect_manager() -> SyntaxResult<SyntaxManager> {
  if SyntectHighlighter::syntax_set().syntaxes().is_empty() {
    return Err(SyntaxError::BackendError(
      "no syntax definitions loaded".to_string(),
    ));
  }

  Ok(SyntaxManager::new(
    Arc::new(SyntectHighlighter),
    SyntaxConfig::default(),
  ))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_syntect_highlighter() {
    let highlighter = SyntectHighlighter;
    assert_eq!(highlighter.name(), "Syntect");
    assert!(!highlighter.supported_languages().is_empty());
    assert!(highlighter.supports_language("rust"));
    assert!(highlighter.supports_language("Python"));
    assert!(highlighter.supports_language("text"));
    assert!(!highlighter.supports_language("definitely-not-a-language"));
  }

  #[test]
  fn test_syntect_highlight_uses_classes() {
    let html = SyntectHighlighter
      .highlight("fn main() {}", "rust")
      .expect("rust should highlight");
    assert!(html.contains("main"));
    assert!(html.contains("<span class=\""), "expected classed spans: {html}");
    assert!(!html.contains("style="), "no inline styles expected: {html}");
  }

  #[test]
  fn test_syntect_highlight_escapes() {
    let html = SyntectHighlighter
      .highlight("<b>&</b>", "text")
      .expect("plain text should highlight");
    assert!(html.contains("&lt;b&gt;&amp;&lt;/b&gt;"));
  }

  #[test]
  fn test_syntect_manager_loads_definitions() {
    let manager =
      create_syntect_manager().expect("bundled definitions should load");
    assert!(manager.highlighter().supports_language("rust"));

    let err = SyntaxError::BackendError("no syntax definitions loaded".into());
    assert_eq!(
      err.to_string(),
      "Backend initialization failed: no syntax definitions loaded"
    );
  }

  #[test]
  fn test_syntect_detects_shebang() {
    let detected =
      SyntectHighlighter.detect_language("#!/usr/bin/env python\n");
    assert_eq!(detected.as_deref(), Some("py"));
    assert_eq!(SyntectHighlighter.detect_language("just words"), None);
  }
}
