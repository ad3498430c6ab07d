//! Core implementation of the Markdown processor.
//!
//! This module contains the main implementation of `MarkdownProcessor` and its
//! methods, focused on the rendering pipeline and its fixed stage order:
//!
//! 1. fenced code blocks are highlighted and stashed
//! 2. preprocessors rewrite the raw text (embeds, callouts, block math)
//! 3. wiki-links and inline math are stashed behind placeholders
//! 4. comrak parses the text; placeholders and tags become inline HTML
//! 5. postprocessors rewrite the HTML (code restore, task lists, headings)
use std::{cmp::Reverse, sync::Arc};

use comrak::{Arena, options::Options, parse_document};
use log::{error, trace, warn};

use super::{
  highlight::stash_fenced_code,
  inline::{
    InlineMathProcessor,
    InlineTransformer,
    TagProcessor,
    WikiLinkProcessor,
    stash_source_spans,
  },
  postprocess::{CodeBlockRestorer, HeadingPermalinks, TaskListPostprocessor},
  preprocess::{BlockMathPreprocessor, CalloutPreprocessor, EmbedPreprocessor},
  process::process_safe,
  types::{
    AstTransformer,
    InlineProcessor,
    MarkdownOptions,
    MarkdownProcessor,
    Postprocessor,
    Preprocessor,
    RenderContext,
  },
};
use crate::syntax::{SyntaxManager, create_default_manager};

impl MarkdownProcessor {
  /// Create a new `MarkdownProcessor` with the given options.
  ///
  /// The stage lists are built and ordered here, once; nothing registers
  /// stages later.
  #[must_use]
  pub fn new(options: MarkdownOptions) -> Self {
    let syntax_manager = if options.highlight_code {
      create_default_manager()
        .inspect_err(|e| warn!("Syntax highlighting disabled: {e}"))
        .ok()
    } else {
      None
    };

    let mut preprocessors: Vec<Arc<dyn Preprocessor>> = vec![
      Arc::new(EmbedPreprocessor::new(&options)),
      Arc::new(CalloutPreprocessor),
      Arc::new(BlockMathPreprocessor),
    ];
    preprocessors.sort_by_key(|p| Reverse(p.priority()));

    let mut inline_processors: Vec<Arc<dyn InlineProcessor>> = vec![
      Arc::new(WikiLinkProcessor::new(&options)),
      Arc::new(TagProcessor::new(&options)),
      Arc::new(InlineMathProcessor),
    ];
    inline_processors.sort_by_key(|p| Reverse(p.priority()));

    let mut postprocessors: Vec<Arc<dyn Postprocessor>> = vec![
      Arc::new(CodeBlockRestorer),
      Arc::new(TaskListPostprocessor),
    ];
    if options.heading_permalinks {
      postprocessors.push(Arc::new(HeadingPermalinks));
    }
    postprocessors.sort_by_key(|p| Reverse(p.priority()));

    Self {
      options,
      syntax_manager,
      preprocessors,
      inline_processors,
      postprocessors,
    }
  }

  /// Access processor options.
  #[must_use]
  pub const fn options(&self) -> &MarkdownOptions {
    &self.options
  }

  /// The syntax manager, if highlighting is enabled and a backend loaded.
  #[must_use]
  pub const fn syntax_manager(&self) -> Option<&SyntaxManager> {
    self.syntax_manager.as_ref()
  }

  /// Check if a specific feature is enabled.
  #[must_use]
  pub const fn has_feature(&self, feature: ProcessorFeature) -> bool {
    match feature {
      ProcessorFeature::SyntaxHighlighting => self.syntax_manager.is_some(),
      ProcessorFeature::HardBreaks => self.options.hard_breaks,
      ProcessorFeature::HeadingPermalinks => self.options.heading_permalinks,
    }
  }

  /// Stage names in execution order, grouped by phase: preprocessors,
  /// inline processors, postprocessors.
  #[must_use]
  pub fn stage_names(
    &self,
  ) -> (Vec<&'static str>, Vec<&'static str>, Vec<&'static str>) {
    (
      self.preprocessors.iter().map(|p| p.name()).collect(),
      self.inline_processors.iter().map(|p| p.name()).collect(),
      self.postprocessors.iter().map(|p| p.name()).collect(),
    )
  }

  /// Render Markdown to HTML.
  ///
  /// Every render starts from a fresh [`RenderContext`], so identical input
  /// always yields identical output and concurrent renders never interfere.
  #[must_use]
  pub fn render(&self, markdown: &str) -> String {
    let mut context = RenderContext::new();

    let text = process_safe(
      markdown,
      |text| {
        stash_fenced_code(text, self.syntax_manager.as_ref(), &mut context)
      },
      markdown,
    );
    let text = self.preprocess(&text);
    let text = process_safe(
      &text,
      |text| stash_source_spans(text, &self.inline_processors, &mut context),
      &text,
    );
    let html = self.convert_to_html(&text, &context);
    self.postprocess(&html, &context)
  }

  /// Run the preprocessors in priority order.
  fn preprocess(&self, content: &str) -> String {
    self.preprocessors.iter().fold(content.to_string(), |text, stage| {
      trace!("Running preprocessor '{}'", stage.name());
      process_safe(&text, |t| stage.run(t), &text)
    })
  }

  /// Run the postprocessors in priority order.
  fn postprocess(&self, html: &str, context: &RenderContext) -> String {
    self.postprocessors.iter().fold(html.to_string(), |html, stage| {
      trace!("Running postprocessor '{}'", stage.name());
      process_safe(&html, |h| stage.run(h, context), &html)
    })
  }

  /// Convert markdown to HTML using comrak, resolving stashed inline spans
  /// and applying the tag processor to the tree in between.
  fn convert_to_html(&self, content: &str, context: &RenderContext) -> String {
    let arena = Arena::new();
    let options = self.comrak_options();
    let root = parse_document(&arena, content, &options);

    InlineTransformer::new(&self.inline_processors, context).transform(root);

    let mut html_output = String::new();
    if let Err(e) = comrak::format_html(root, &options, &mut html_output) {
      error!("Failed to format HTML: {e}");
    }
    html_output
  }

  /// Build comrak options from `MarkdownOptions`.
  ///
  /// Task lists are left to the postprocessor, and superscript stays off so
  /// `^` survives inside math.
  fn comrak_options(&self) -> Options<'_> {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.footnotes = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options.extension.tasklist = false;
    options.extension.superscript = false;
    options.extension.header_ids = None;
    options.render.hardbreaks = self.options.hard_breaks;
    options.render.r#unsafe = true;
    options
  }
}

impl Default for MarkdownProcessor {
  fn default() -> Self {
    Self::new(MarkdownOptions::default())
  }
}

impl std::fmt::Debug for MarkdownProcessor {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let (pre, inline, post) = self.stage_names();
    f.debug_struct("MarkdownProcessor")
      .field("options", &self.options)
      .field("syntax_manager", &self.syntax_manager)
      .field("preprocessors", &pre)
      .field("inline_processors", &inline)
      .field("postprocessors", &post)
      .finish()
  }
}

/// Features that can be queried on a processor instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorFeature {
  /// Syntax highlighting for fenced code blocks
  SyntaxHighlighting,
  /// Single newlines rendered as `<br />`
  HardBreaks,
  /// Heading ids and permalink anchors
  HeadingPermalinks,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn plain_processor() -> MarkdownProcessor {
    MarkdownProcessor::new(MarkdownOptions {
      highlight_code: false,
      ..Default::default()
    })
  }

  #[test]
  fn test_stage_order() {
    let (pre, inline, post) = plain_processor().stage_names();
    assert_eq!(pre, vec!["embed", "callout", "block_math"]);
    assert_eq!(inline, vec!["wiki_link", "tag", "inline_math"]);
    assert_eq!(post, vec![
      "code_block_restore",
      "task_list",
      "heading_permalinks"
    ]);
  }

  #[test]
  fn test_permalinks_can_be_disabled() {
    let processor = MarkdownProcessor::new(MarkdownOptions {
      highlight_code: false,
      heading_permalinks: false,
      ..Default::default()
    });
    assert!(!processor.has_feature(ProcessorFeature::HeadingPermalinks));
    assert_eq!(processor.render("# Title"), "<h1>Title</h1>\n");
  }

  #[test]
  fn test_basic_markdown() {
    let html = plain_processor().render("# Heading\n\n**bold** and *italic*");
    assert!(html.contains("<h1 id=\"heading\">Heading"));
    assert!(html.contains("<strong>bold</strong>"));
    assert!(html.contains("<em>italic</em>"));
  }

  #[test]
  fn test_hard_breaks() {
    let processor = plain_processor();
    assert!(processor.render("one\ntwo").contains("one<br />\ntwo"));

    let soft = MarkdownProcessor::new(MarkdownOptions {
      highlight_code: false,
      hard_breaks: false,
      ..Default::default()
    });
    assert_eq!(soft.render("one\ntwo"), "<p>one\ntwo</p>\n");
  }

  #[test]
  fn test_inline_extensions_skip_code() {
    let html = plain_processor().render("`[[Note]] #tag $x$`");
    assert_eq!(html, "<p><code>[[Note]] #tag $x$</code></p>\n");
  }

  #[test]
  fn test_wiki_link_inside_emphasis() {
    let html = plain_processor().render("*see [[Note]]*");
    assert!(html.contains(
      "<em>see <a class=\"internal-link\" href=\"/note/Note\" \
       data-target=\"Note\">Note</a></em>"
    ));
  }

  #[test]
  fn test_superscript_disabled_for_math() {
    let html = plain_processor().render("$x^2^$");
    assert!(html.contains("data-math=\"x^2^\""));
  }

  #[test]
  fn test_math_keeps_emphasis_characters() {
    let html = plain_processor().render("$2*3*4$ and $a_1 + b_1$");
    assert!(html.contains("data-math=\"2*3*4\""), "got: {html}");
    assert!(html.contains("data-math=\"a_1 + b_1\""), "got: {html}");
    assert!(!html.contains("<em>"), "got: {html}");
  }

  #[test]
  fn test_stashed_spans_stay_raw_in_links() {
    let html = plain_processor().render("[costs $x$](https://example.com)");
    assert!(html.contains(">costs $x$</a>"), "got: {html}");
    assert!(!html.contains("math-inline"), "got: {html}");
  }

  #[test]
  fn test_render_does_not_accumulate_state() {
    let processor = plain_processor();
    let doc = "```\na\n```\n\n```\nb\n```";
    let first = processor.render(doc);
    let second = processor.render(doc);
    assert_eq!(first, second);
    assert!(first.contains("<code>a\n</code>"));
    assert!(first.contains("<code>b\n</code>"));
  }
}
