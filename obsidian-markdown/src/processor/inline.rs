//! Inline extensions: wiki-links, tags and inline math.
//!
//! Wiki-links and math are claimed on the Markdown source before comrak
//! parses it and are left behind as placeholders, so their contents never
//! go through backslash escapes or emphasis. Tags are matched afterwards on
//! the text runs of the parsed tree, which keeps code spans, code blocks,
//! links and raw HTML out of reach.
use std::sync::{Arc, LazyLock};

use comrak::nodes::{AstNode, NodeValue};
use regex::{Captures, Regex};

use super::types::{
  AstTransformer,
  InlineMatch,
  InlineProcessor,
  MarkdownOptions,
  RenderContext,
};
use crate::{
  patterns::{LinkParts, WIKI_LINK_RE, find_inline_math, find_tags},
  utils::{
    codeblock::inline_code_spans,
    compile_regex,
    escape_attr,
    escape_html,
    heading_fragment,
  },
};

/// `[[target#heading|alias]]` to an internal link.
#[derive(Debug, Clone)]
pub struct WikiLinkProcessor {
  note_url_prefix: String,
}

impl WikiLinkProcessor {
  #[must_use]
  pub fn new(options: &MarkdownOptions) -> Self {
    Self {
      note_url_prefix: options.note_url_prefix.clone(),
    }
  }

  fn render_link(&self, parts: &LinkParts<'_>) -> String {
    let fragment = parts
      .heading
      .map_or_else(String::new, |h| format!("#{}", heading_fragment(h)));

    let display = match (parts.alias, parts.heading) {
      (Some(alias), _) => alias.to_string(),
      (None, Some(heading)) => format!("{} > {heading}", parts.target),
      (None, None) => parts.target.to_string(),
    };

    format!(
      "<a class=\"internal-link\" href=\"{prefix}{target}{fragment}\" \
       data-target=\"{target}\">{display}</a>",
      prefix = self.note_url_prefix,
      target = escape_attr(parts.target),
      fragment = escape_attr(&fragment),
      display = escape_html(&display),
    )
  }
}

impl InlineProcessor for WikiLinkProcessor {
  fn name(&self) -> &'static str {
    "wiki_link"
  }

  fn priority(&self) -> u32 {
    200
  }

  fn matches_source(&self) -> bool {
    true
  }

  fn find(&self, text: &str) -> Vec<InlineMatch> {
    WIKI_LINK_RE
      .captures_iter(text)
      .filter_map(|caps| {
        let range = caps.get(0)?.range();
        let parts = LinkParts::from_captures(&caps)?;
        Some(InlineMatch {
          range,
          html: self.render_link(&parts),
        })
      })
      .collect()
  }
}

/// `#tag` to a tag search link.
#[derive(Debug, Clone)]
pub struct TagProcessor {
  tag_url_prefix: String,
}

impl TagProcessor {
  #[must_use]
  pub fn new(options: &MarkdownOptions) -> Self {
    Self {
      tag_url_prefix: options.tag_url_prefix.clone(),
    }
  }
}

impl InlineProcessor for TagProcessor {
  fn name(&self) -> &'static str {
    "tag"
  }

  fn priority(&self) -> u32 {
    198
  }

  fn find(&self, text: &str) -> Vec<InlineMatch> {
    find_tags(text)
      .into_iter()
      .map(|tag| {
        InlineMatch {
          range: tag.range,
          html:  format!(
            "<a href=\"{}{}\" class=\"tag\">#{}</a>",
            self.tag_url_prefix,
            escape_attr(tag.name),
            escape_html(tag.name)
          ),
        }
      })
      .collect()
  }
}

/// `$expr$` to a math span a client-side renderer can pick up.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineMathProcessor;

impl InlineProcessor for InlineMathProcessor {
  fn name(&self) -> &'static str {
    "inline_math"
  }

  fn priority(&self) -> u32 {
    197
  }

  fn matches_source(&self) -> bool {
    true
  }

  fn find(&self, text: &str) -> Vec<InlineMatch> {
    find_inline_math(text)
      .into_iter()
      .map(|math| {
        InlineMatch {
          range: math.range,
          html:  format!(
            "<span class=\"math-inline\" data-math=\"{}\">${}$</span>",
            escape_attr(math.expr),
            escape_html(math.expr)
          ),
        }
      })
      .collect()
  }
}

/// A piece of text that is either still open to matching or already
/// claimed, in which case it is emitted as is.
enum Segment {
  Text(String),
  Claimed(String),
}

/// Run one processor over the open segments.
///
/// `accept` receives the matched source text and the generated HTML and
/// returns what the claimed segment holds, or `None` to leave the match.
fn claim_matches(
  segments: Vec<Segment>,
  processor: &dyn InlineProcessor,
  mut accept: impl FnMut(&str, String) -> Option<String>,
) -> Vec<Segment> {
  let mut next = Vec::with_capacity(segments.len());

  for segment in segments {
    let Segment::Text(text) = segment else {
      next.push(segment);
      continue;
    };

    let mut last = 0;
    for found in processor.find(&text) {
      if found.range.start < last {
        continue;
      }
      let Some(source) = text.get(found.range.clone()) else {
        continue;
      };
      let Some(claimed) = accept(source, found.html) else {
        continue;
      };
      if found.range.start > last {
        next.push(Segment::Text(text[last..found.range.start].to_string()));
      }
      next.push(Segment::Claimed(claimed));
      last = found.range.end;
    }

    if last == 0 {
      next.push(Segment::Text(text));
    } else if last < text.len() {
      next.push(Segment::Text(text[last..].to_string()));
    }
  }

  next
}

fn placeholder_re() -> &'static Regex {
  static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex("inline span placeholder", r"\x{E000}(\d+)\x{E001}")
  });
  &PLACEHOLDER_RE
}

/// Claim the spans of the source-matching processors in one block of
/// consecutive non-blank lines.
fn stash_block(
  block: &str,
  processors: &[&Arc<dyn InlineProcessor>],
  context: &mut RenderContext,
) -> String {
  if block.is_empty() {
    return String::new();
  }

  // Code spans stay literal; they may run across lines within a block.
  let mut segments = Vec::new();
  let mut last = 0;
  for span in inline_code_spans(block) {
    if span.start > last {
      segments.push(Segment::Text(block[last..span.start].to_string()));
    }
    segments.push(Segment::Claimed(block[span.clone()].to_string()));
    last = span.end;
  }
  if last < block.len() {
    segments.push(Segment::Text(block[last..].to_string()));
  }

  for &processor in processors {
    segments = claim_matches(segments, processor.as_ref(), |source, html| {
      // Inline syntax never spans a line break.
      (!source.contains('\n'))
        .then(|| context.stash_inline_span(source.to_string(), html))
    });
  }

  segments
    .into_iter()
    .map(|segment| {
      match segment {
        Segment::Text(text) | Segment::Claimed(text) => text,
      }
    })
    .collect()
}

/// Replace the matches of every source-matching processor in `content`
/// with placeholders, stashing the generated HTML in `context`.
///
/// This runs on the Markdown text just before comrak parses it, so the
/// matched source is seen exactly as written: backslashes, `*` and `_`
/// inside math or a wiki-link are not yet escapes or emphasis.
#[must_use]
pub fn stash_source_spans(
  content: &str,
  processors: &[Arc<dyn InlineProcessor>],
  context: &mut RenderContext,
) -> String {
  let source: Vec<&Arc<dyn InlineProcessor>> =
    processors.iter().filter(|p| p.matches_source()).collect();
  if source.is_empty() {
    return content.to_string();
  }

  let mut output = String::with_capacity(content.len());
  let mut block = String::new();
  for line in content.split_inclusive('\n') {
    if line.trim().is_empty() {
      output.push_str(&stash_block(&block, &source, context));
      block.clear();
      output.push_str(line);
    } else {
      block.push_str(line);
    }
  }
  output.push_str(&stash_block(&block, &source, context));
  output
}

/// Runs the remaining inline processors over the text nodes of the parsed
/// document and resolves the placeholders left by [`stash_source_spans`].
///
/// A text node with a placeholder or a match is replaced by a single inline
/// HTML node holding the escaped text and the generated markup. Anywhere a
/// span cannot become HTML (code, raw HTML, link destinations and link
/// text) its placeholder turns back into the source text.
pub struct InlineTransformer<'p> {
  processors: &'p [Arc<dyn InlineProcessor>],
  context:    &'p RenderContext,
}

impl<'p> InlineTransformer<'p> {
  /// `processors` must already be sorted by descending priority.
  #[must_use]
  pub const fn new(
    processors: &'p [Arc<dyn InlineProcessor>],
    context: &'p RenderContext,
  ) -> Self {
    Self {
      processors,
      context,
    }
  }

  /// Resolve placeholders and apply the text-run processors to `text`, or
  /// `None` if there was nothing to do.
  #[must_use]
  pub fn apply(&self, text: &str) -> Option<String> {
    let mut segments = Vec::new();
    let mut last = 0;
    for caps in placeholder_re().captures_iter(text) {
      let (Some(whole), Some(index)) = (caps.get(0), caps.get(1)) else {
        continue;
      };
      let Some(span) = index
        .as_str()
        .parse::<usize>()
        .ok()
        .and_then(|index| self.context.inline_span(index))
      else {
        continue;
      };
      if whole.start() > last {
        segments.push(Segment::Text(text[last..whole.start()].to_string()));
      }
      segments.push(Segment::Claimed(span.html.clone()));
      last = whole.end();
    }
    if last == 0 {
      segments.push(Segment::Text(text.to_string()));
    } else if last < text.len() {
      segments.push(Segment::Text(text[last..].to_string()));
    }

    for processor in self.processors.iter().filter(|p| !p.matches_source()) {
      segments =
        claim_matches(segments, processor.as_ref(), |_, html| Some(html));
    }

    if segments.iter().all(|s| matches!(s, Segment::Text(_))) {
      return None;
    }

    Some(
      segments
        .into_iter()
        .map(|segment| {
          match segment {
            Segment::Text(text) => escape_html(&text).into_owned(),
            Segment::Claimed(html) => html,
          }
        })
        .collect(),
    )
  }

  /// Put the source text back in place of any placeholder in `text`.
  #[must_use]
  pub fn restore_source(&self, text: &str) -> Option<String> {
    if !text.contains(RenderContext::INLINE_SPAN_OPEN) {
      return None;
    }
    let restored = placeholder_re().replace_all(text, |caps: &Captures| {
      caps[1]
        .parse::<usize>()
        .ok()
        .and_then(|index| self.context.inline_span(index))
        .map_or_else(|| caps[0].to_string(), |span| span.raw.clone())
    });
    Some(restored.into_owned())
  }

  fn restore_in_place(&self, text: &mut String) {
    if let Some(restored) = self.restore_source(text) {
      *text = restored;
    }
  }

  fn visit<'a>(&self, node: &'a AstNode<'a>, literal: bool) {
    merge_text_siblings(node);

    let mut child = node.first_child();
    while let Some(current) = child {
      child = current.next_sibling();

      let mut replacement = None;
      let mut descend = Some(literal);
      {
        let mut data = current.data.borrow_mut();
        match &mut data.value {
          NodeValue::Text(text) => {
            descend = None;
            if literal {
              if let Some(restored) = self.restore_source(text) {
                *text = restored.into();
              }
            } else {
              replacement = self.apply(text);
            }
          },
          NodeValue::Code(code) => {
            descend = None;
            self.restore_in_place(&mut code.literal);
          },
          NodeValue::CodeBlock(block) => {
            descend = None;
            self.restore_in_place(&mut block.literal);
          },
          NodeValue::HtmlBlock(block) => {
            descend = None;
            self.restore_in_place(&mut block.literal);
          },
          NodeValue::HtmlInline(html) => {
            descend = None;
            self.restore_in_place(html);
          },
          NodeValue::Link(link) | NodeValue::Image(link) => {
            descend = Some(true);
            self.restore_in_place(&mut link.url);
            self.restore_in_place(&mut link.title);
          },
          _ => {},
        }
      }

      if let Some(html) = replacement {
        current.data.borrow_mut().value = NodeValue::HtmlInline(html);
      } else if let Some(literal) = descend {
        self.visit(current, literal);
      }
    }
  }
}

/// Join runs of adjacent text siblings so patterns that comrak split at
/// `[` or `]` are seen whole.
fn merge_text_siblings<'a>(node: &'a AstNode<'a>) {
  let mut child = node.first_child();

  while let Some(current) = child {
    let current_text = match &current.data.borrow().value {
      NodeValue::Text(text) => Some(text.to_string()),
      _ => None,
    };

    if let Some(mut merged) = current_text {
      let mut joined = false;
      while let Some(next) = current.next_sibling() {
        let next_text = match &next.data.borrow().value {
          NodeValue::Text(text) => Some(text.to_string()),
          _ => None,
        };
        let Some(next_text) = next_text else {
          break;
        };
        merged.push_str(&next_text);
        next.detach();
        joined = true;
      }
      if joined {
        current.data.borrow_mut().value = NodeValue::Text(merged.into());
      }
    }

    child = current.next_sibling();
  }
}

impl AstTransformer for InlineTransformer<'_> {
  fn transform<'a>(&self, node: &'a AstNode<'a>) {
    self.visit(node, false);
  }
}
