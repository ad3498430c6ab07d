//! Markdown processing module with modular organization.
//!
//! # Architecture
//!
//! The processor module is organized into focused submodules:
//!
//! - [`core`]: Main processor implementation and processing pipeline
//! - [`highlight`]: Fenced code block highlighting and stashing
//! - [`preprocess`]: Text passes run before parsing (embeds, callouts, block
//!   math)
//! - [`inline`]: Source stash and AST pass for wiki-links, tags and inline
//!   math
//! - [`postprocess`]: HTML passes run after rendering (code restore, task
//!   lists, heading permalinks)
//! - [`process`]: Error recovery wrappers
//! - [`types`]: Core type definitions and configuration structures
pub mod core;
pub mod highlight;
pub mod inline;
pub mod postprocess;
pub mod preprocess;
pub mod process;
pub mod types;

pub use core::ProcessorFeature;

pub use process::{CRITICAL_ERROR_HTML, process_safe, process_with_recovery};
pub use types::{
  AstTransformer,
  InlineMatch,
  InlineProcessor,
  InlineSpan,
  MarkdownOptions,
  MarkdownOptionsBuilder,
  MarkdownProcessor,
  Postprocessor,
  Preprocessor,
  RenderContext,
};

#[cfg(test)]
mod tests {
  use super::{MarkdownOptions, MarkdownProcessor};

  #[test]
  fn test_html_escape_util() {
    let input = "test<>&\"'";
    let escaped = html_escape::encode_text(input);

    // html-escape doesn't escape quotes in text content
    assert_eq!(escaped, "test&lt;&gt;&amp;\"'");
  }

  #[test]
  fn test_raw_html_passes_through() {
    let processor = MarkdownProcessor::new(MarkdownOptions {
      highlight_code: false,
      ..Default::default()
    });
    let html = processor.render("<kbd>Ctrl</kbd> + C");
    assert_eq!(html, "<p><kbd>Ctrl</kbd> + C</p>\n");
  }

  #[test]
  fn test_tabs_in_code_preserved() {
    let processor = MarkdownProcessor::new(MarkdownOptions {
      highlight_code: false,
      ..Default::default()
    });
    let html = processor.render("```\nfn main() {\n\tprintln!();\n}\n```");
    assert!(html.contains("\tprintln!();"));
  }
}
