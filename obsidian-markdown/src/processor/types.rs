//! Type definitions for the Markdown processor.
//!
//! Contains all the core types used by the processor, including:
//! - Configuration options (`MarkdownOptions`)
//! - The main processor struct (`MarkdownProcessor`)
//! - The stage traits the pipeline is assembled from
//! - The per-render state (`RenderContext`)
//!
//! # Examples
//!
//! ```
//! use obsidian_markdown::{MarkdownOptions, MarkdownProcessor};
//!
//! let options = MarkdownOptions {
//!   highlight_code: false,
//!   note_url_prefix: "/notes/".to_string(),
//!   ..Default::default()
//! };
//!
//! let processor = MarkdownProcessor::new(options);
//! assert!(processor.render("[[Home]]").contains("href=\"/notes/Home\""));
//! ```

use std::{ops::Range, sync::Arc};

use comrak::nodes::AstNode;
use serde::{Deserialize, Serialize};

use crate::syntax::SyntaxManager;

/// Options for configuring the Markdown processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(
  clippy::struct_excessive_bools,
  reason = "Config struct with related boolean flags"
)]
pub struct MarkdownOptions {
  /// Enable syntax highlighting for fenced code blocks.
  pub highlight_code: bool,

  /// Render single newlines as `<br />`.
  pub hard_breaks: bool,

  /// Give headings an `id` and a trailing permalink anchor.
  pub heading_permalinks: bool,

  /// Prefix for wiki-link and note-embed targets.
  pub note_url_prefix: String,

  /// Prefix for image-embed sources.
  pub attachment_url_prefix: String,

  /// Prefix for tag links; the tag name is appended.
  pub tag_url_prefix: String,
}

impl Default for MarkdownOptions {
  fn default() -> Self {
    Self {
      highlight_code:        cfg!(feature = "syntect"),
      hard_breaks:           true,
      heading_permalinks:    true,
      note_url_prefix:       "/note/".to_string(),
      attachment_url_prefix: "/api/vault/attachment/".to_string(),
      tag_url_prefix:        "/search?q=tag:".to_string(),
    }
  }
}

/// Main Markdown processor.
///
/// Built once and shared: it holds no per-render state, so `render` can be
/// called concurrently from any number of threads. Cloning is cheap since
/// the stages and the syntax manager are reference counted.
#[derive(Clone)]
pub struct MarkdownProcessor {
  pub(crate) options:           MarkdownOptions,
  pub(crate) syntax_manager:    Option<SyntaxManager>,
  pub(crate) preprocessors:     Vec<Arc<dyn Preprocessor>>,
  pub(crate) inline_processors: Vec<Arc<dyn InlineProcessor>>,
  pub(crate) postprocessors:    Vec<Arc<dyn Postprocessor>>,
}

/// A text-to-text pass over the raw Markdown, run before block parsing.
///
/// Higher priority runs earlier.
pub trait Preprocessor: Send + Sync {
  fn name(&self) -> &'static str;
  fn priority(&self) -> u32;
  fn run(&self, text: &str) -> String;
}

/// A replacement found by an [`InlineProcessor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineMatch {
  /// Byte range in the scanned text.
  pub range: Range<usize>,
  /// HTML that replaces the range.
  pub html:  String,
}

/// A pattern substitution for inline syntax.
///
/// Processors run in descending priority; once a processor claims a range,
/// later processors only see the text around it.
pub trait InlineProcessor: Send + Sync {
  fn name(&self) -> &'static str;
  fn priority(&self) -> u32;
  /// Find non-overlapping matches in `text`, in order.
  fn find(&self, text: &str) -> Vec<InlineMatch>;

  /// Match on the Markdown source instead of the parsed text runs.
  ///
  /// Source matches are claimed before comrak applies backslash escapes and
  /// emphasis, so their contents reach `find` verbatim.
  fn matches_source(&self) -> bool {
    false
  }
}

/// A whole-document rewrite of the generated HTML.
///
/// Higher priority runs earlier.
pub trait Postprocessor: Send + Sync {
  fn name(&self) -> &'static str;
  fn priority(&self) -> u32;
  fn run(&self, html: &str, context: &RenderContext) -> String;
}

/// Trait for AST transformations.
pub trait AstTransformer {
  fn transform<'a>(&self, node: &'a AstNode<'a>);
}

/// State that lives for exactly one render.
///
/// Everything a render accumulates goes here instead of into the
/// processor, which is what keeps renders independent of each other.
#[derive(Debug, Default)]
pub struct RenderContext {
  code_blocks:  Vec<String>,
  inline_spans: Vec<InlineSpan>,
}

/// An inline span claimed from the Markdown source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
  /// The source text, put back wherever the span cannot become HTML.
  pub raw:  String,
  /// The rendered replacement.
  pub html: String,
}

impl RenderContext {
  pub(crate) const CODE_BLOCK_MARKER: &'static str = "obsidian-code-block:";
  /// Delimiters of an inline span placeholder. Private-use characters mean
  /// nothing to comrak.
  pub const INLINE_SPAN_OPEN: char = '\u{E000}';
  pub const INLINE_SPAN_CLOSE: char = '\u{E001}';

  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Store pre-rendered code block HTML and return the single-line
  /// placeholder that stands in for it until the HTML is generated.
  pub fn stash_code_block(&mut self, html: String) -> String {
    let index = self.code_blocks.len();
    self.code_blocks.push(html);
    format!("<!-- {}{index} -->", Self::CODE_BLOCK_MARKER)
  }

  /// Get a stashed code block by its placeholder index.
  #[must_use]
  pub fn code_block(&self, index: usize) -> Option<&str> {
    self.code_blocks.get(index).map(String::as_str)
  }

  /// Number of stashed code blocks.
  #[must_use]
  pub fn code_block_count(&self) -> usize {
    self.code_blocks.len()
  }

  /// Store an inline span and return the placeholder that stands in for it
  /// while comrak parses the document.
  pub fn stash_inline_span(&mut self, raw: String, html: String) -> String {
    let index = self.inline_spans.len();
    self.inline_spans.push(InlineSpan { raw, html });
    format!(
      "{}{index}{}",
      Self::INLINE_SPAN_OPEN,
      Self::INLINE_SPAN_CLOSE
    )
  }

  /// Get a stashed inline span by its placeholder index.
  #[must_use]
  pub fn inline_span(&self, index: usize) -> Option<&InlineSpan> {
    self.inline_spans.get(index)
  }
}

/// Builder for constructing `MarkdownOptions` with method chaining.
#[derive(Debug, Clone)]
pub struct MarkdownOptionsBuilder {
  options: MarkdownOptions,
}

impl MarkdownOptionsBuilder {
  /// Create a new builder with default options.
  #[must_use]
  pub fn new() -> Self {
    Self {
      options: MarkdownOptions::default(),
    }
  }

  /// Enable or disable syntax highlighting.
  #[must_use]
  pub const fn highlight_code(mut self, enabled: bool) -> Self {
    self.options.highlight_code = enabled;
    self
  }

  /// Enable or disable hard line breaks.
  #[must_use]
  pub const fn hard_breaks(mut self, enabled: bool) -> Self {
    self.options.hard_breaks = enabled;
    self
  }

  /// Enable or disable heading ids and permalinks.
  #[must_use]
  pub const fn heading_permalinks(mut self, enabled: bool) -> Self {
    self.options.heading_permalinks = enabled;
    self
  }

  /// Set the prefix for note links.
  #[must_use]
  pub fn note_url_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
    self.options.note_url_prefix = prefix.into();
    self
  }

  /// Set the prefix for attachment sources.
  #[must_use]
  pub fn attachment_url_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
    self.options.attachment_url_prefix = prefix.into();
    self
  }

  /// Set the prefix for tag links.
  #[must_use]
  pub fn tag_url_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
    self.options.tag_url_prefix = prefix.into();
    self
  }

  /// Build the final `MarkdownOptions`.
  #[must_use]
  pub fn build(self) -> MarkdownOptions {
    self.options
  }
}

impl Default for MarkdownOptionsBuilder {
  fn default() -> Self {
    Self::new()
  }
}
