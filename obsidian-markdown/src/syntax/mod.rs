//! Provides a trait-based architecture for syntax highlighting that allows
//! multiple backends to be plugged in.
//!
//! Currently supported backends:
//! - **Syntect** - Sublime Text syntax definitions, emitting CSS classes

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{SyntaxError, SyntaxResult};
pub use types::{SyntaxConfig, SyntaxHighlighter, SyntaxManager};

// Syntect backend implementation
#[cfg(feature = "syntect")] mod syntect;
#[cfg(feature = "syntect")]
pub use self::syntect::{SyntectHighlighter, create_syntect_manager};

/// Create the default syntax manager based on available features.
///
/// # Errors
///
/// Returns an error if no backend feature is enabled, or if backend
/// initialization fails.
#[cfg(feature = "syntect")]
pub fn create_default_manager() -> SyntaxResult<SyntaxManager> {
  create_syntect_manager()
}

/// Create the default syntax manager based on available features.
///
/// # Errors
///
/// Always fails: no backend feature is enabled.
#[cfg(not(feature = "syntect"))]
pub fn create_default_manager() -> SyntaxResult<SyntaxManager> {
  Err(SyntaxError::NoBackendAvailable)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[cfg(feature = "syntect")]
  #[test]
  fn test_syntax_manager() {
    let manager = create_default_manager()
      .expect("Failed to create default syntax manager");
    assert_eq!(manager.highlighter().name(), "Syntect");
    assert_eq!(manager.resolve_language("js"), "javascript");
  }

  #[cfg(feature = "syntect")]
  #[test]
  fn test_language_resolution() {
    let manager = create_default_manager()
      .expect("Failed to create default syntax manager");

    // Test alias resolution
    assert_eq!(manager.resolve_language("py"), "python");
    assert_eq!(manager.resolve_language("sh"), "bash");
    assert_eq!(manager.resolve_language("yml"), "yaml");

    // Test non-alias languages
    assert_eq!(manager.resolve_language("rust"), "rust");
  }

  #[cfg(feature = "syntect")]
  #[test]
  fn test_unknown_language_falls_back_to_plain() {
    let manager = create_default_manager()
      .expect("Failed to create default syntax manager");
    let html = manager
      .highlight_code("x < y", "no-such-language")
      .expect("fallback to plain text should succeed");
    assert!(html.contains("x &lt; y"));
  }

  #[cfg(not(feature = "syntect"))]
  #[test]
  fn test_no_backend() {
    assert!(matches!(
      create_default_manager(),
      Err(SyntaxError::NoBackendAvailable)
    ));
  }
}
