//! Text passes that run on the raw Markdown before comrak parses it.
//!
//! Embeds and callouts expand into raw HTML blocks, and block math is
//! fenced off so the inline passes never see its `$$` delimiters.
use regex::Captures;

use super::types::{MarkdownOptions, Preprocessor};
use crate::{
  patterns::{BLOCK_MATH_RE, CALLOUT_RE, EMBED_RE, LinkParts},
  utils::{self, codeblock::inline_code_spans, escape_attr, escape_html},
};

/// Extensions rendered as `<img>` rather than a note placeholder.
const IMAGE_EXTENSIONS: &[&str] =
  &[".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg", ".bmp"];

/// Check whether an embed target names an image.
#[must_use]
pub fn is_image_target(target: &str) -> bool {
  let lower = target.to_lowercase();
  IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Expands `![[target]]` embeds into images or note placeholders.
#[derive(Debug, Clone)]
pub struct EmbedPreprocessor {
  note_url_prefix:       String,
  attachment_url_prefix: String,
}

impl EmbedPreprocessor {
  #[must_use]
  pub fn new(options: &MarkdownOptions) -> Self {
    Self {
      note_url_prefix:       options.note_url_prefix.clone(),
      attachment_url_prefix: options.attachment_url_prefix.clone(),
    }
  }

  fn render_embed(&self, parts: &LinkParts<'_>) -> String {
    let target = escape_attr(parts.target);

    if is_image_target(parts.target) {
      let alt = escape_attr(parts.alias.unwrap_or(parts.target));
      return format!(
        "<img src=\"{prefix}{target}\" alt=\"{alt}\" class=\"embedded-image \
         max-w-full h-auto rounded-lg\" loading=\"lazy\">",
        prefix = self.attachment_url_prefix
      );
    }

    let mut display =
      escape_html(parts.alias.unwrap_or(parts.target)).into_owned();
    let heading_attr = parts.heading.map_or_else(String::new, |heading| {
      display.push_str(" &gt; ");
      display.push_str(&escape_html(heading));
      format!(" data-embed-heading=\"{}\"", escape_attr(heading))
    });

    // One line, so a quoted embed stays inside its blockquote or callout.
    format!(
      "<div class=\"embedded-note border-l-4 border-accent-400 pl-4 my-4 \
       bg-obsidian-100 dark:bg-obsidian-800 rounded-r-lg p-4\" \
       data-embed-target=\"{target}\"{heading_attr}><a \
       href=\"{prefix}{target}\" class=\"internal-link font-medium\">📄 \
       {display}</a></div>",
      prefix = self.note_url_prefix
    )
  }

  /// Whether `rest` is nothing but a single note embed.
  fn is_standalone_note_embed(rest: &str) -> bool {
    EMBED_RE.captures(rest).is_some_and(|caps| {
      caps.get(0).is_some_and(|whole| whole.range() == (0..rest.len()))
        && LinkParts::from_captures(&caps)
          .is_some_and(|parts| !is_image_target(parts.target))
    })
  }

  fn expand_line(&self, line: &str) -> String {
    if !line.contains("![[") {
      return line.to_string();
    }

    let code_spans = inline_code_spans(line);
    let expanded = EMBED_RE
      .replace_all(line, |caps: &Captures| {
        let Some(whole) = caps.get(0) else {
          return String::new();
        };
        if code_spans.iter().any(|span| span.contains(&whole.start())) {
          return whole.as_str().to_string();
        }
        LinkParts::from_captures(caps).map_or_else(
          || whole.as_str().to_string(),
          |parts| self.render_embed(&parts),
        )
      })
      .into_owned();

    // A note embed on its own line is a block: end it with a blank line
    // under the same quote markers, or the next line joins its HTML block.
    let prefix_len = line
      .find(|c: char| !matches!(c, ' ' | '\t' | '>'))
      .unwrap_or(line.len());
    let (prefix, rest) = line.split_at(prefix_len);
    if Self::is_standalone_note_embed(rest.trim_end()) {
      format!("{expanded}\n{}", prefix.trim_end())
    } else {
      expanded
    }
  }
}

impl Preprocessor for EmbedPreprocessor {
  fn name(&self) -> &'static str {
    "embed"
  }

  fn priority(&self) -> u32 {
    35
  }

  fn run(&self, text: &str) -> String {
    text
      .split('\n')
      .map(|line| self.expand_line(line))
      .collect::<Vec<_>>()
      .join("\n")
  }
}

/// Map a callout type to its icon and CSS class.
///
/// Unknown types get a pin and the note styling.
#[must_use]
pub fn callout_style(callout_type: &str) -> (&'static str, &'static str) {
  match callout_type {
    "note" => ("📝", "callout-note"),
    "abstract" | "summary" | "tldr" => ("📋", "callout-note"),
    "info" => ("ℹ️", "callout-info"),
    "todo" => ("☑️", "callout-info"),
    "tip" | "hint" => ("💡", "callout-tip"),
    "important" => ("🔥", "callout-tip"),
    "success" | "check" | "done" => ("✅", "callout-tip"),
    "question" | "help" | "faq" => ("❓", "callout-warning"),
    "warning" | "caution" | "attention" => ("⚠️", "callout-warning"),
    "failure" | "fail" | "missing" => ("❌", "callout-danger"),
    "danger" => ("⛔", "callout-danger"),
    "error" => ("🚫", "callout-danger"),
    "bug" => ("🐛", "callout-danger"),
    "example" => ("📎", "callout-example"),
    "quote" | "cite" => ("💬", "callout-quote"),
    _ => ("📌", "callout-note"),
  }
}

/// Expands `> [!type] title` block quotes into callout blocks.
///
/// The body is left as Markdown between blank lines so comrak still
/// renders lists, links and the inline extensions inside it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalloutPreprocessor;

impl CalloutPreprocessor {
  fn render_callout(
    callout_type: &str,
    fold: Option<&str>,
    title: Option<&str>,
    body: &[&str],
  ) -> String {
    let (icon, css_class) = callout_style(callout_type);
    let title =
      title.map_or_else(|| utils::title_case(callout_type), str::to_string);
    let fold_attr = fold.map_or_else(String::new, |marker| {
      format!(" data-callout-fold=\"{marker}\"")
    });

    format!(
      "\n<div class=\"callout {css_class}\" \
       data-callout=\"{callout_type}\"{fold_attr}>\n<div \
       class=\"callout-title\">{icon} {title}</div>\n<div \
       class=\"callout-content\">\n\n{body}\n\n</div>\n</div>\n",
      callout_type = escape_attr(callout_type),
      title = escape_html(&title),
      body = body.join("\n"),
    )
  }
}

impl Preprocessor for CalloutPreprocessor {
  fn name(&self) -> &'static str {
    "callout"
  }

  fn priority(&self) -> u32 {
    30
  }

  fn run(&self, text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut output = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
      let line = lines[i];
      let Some(caps) = CALLOUT_RE.captures(line.trim_end_matches('\r')) else {
        output.push(line.to_string());
        i += 1;
        continue;
      };

      let callout_type = caps
        .get(1)
        .map_or_else(String::new, |m| m.as_str().to_lowercase());
      let fold = caps.get(2).map(|m| m.as_str());
      let title = caps
        .get(3)
        .map(|m| m.as_str().trim())
        .filter(|t| !t.is_empty());

      i += 1;
      let mut body = Vec::new();
      while let Some(rest) = lines.get(i).and_then(|l| l.strip_prefix('>')) {
        let rest = rest.trim_end_matches('\r');
        body.push(rest.strip_prefix(' ').unwrap_or(rest));
        i += 1;
      }

      output.push(Self::render_callout(&callout_type, fold, title, &body));
    }

    output.join("\n")
  }
}

/// Fences `$$...$$` spans as display-math blocks.
///
/// The expression is kept twice: raw in `data-math` for a client-side
/// renderer, and as visible `$$...$$` text for when there is none.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockMathPreprocessor;

impl Preprocessor for BlockMathPreprocessor {
  fn name(&self) -> &'static str {
    "block_math"
  }

  fn priority(&self) -> u32 {
    25
  }

  fn run(&self, text: &str) -> String {
    if !text.contains("$$") {
      return text.to_string();
    }

    BLOCK_MATH_RE
      .replace_all(text, |caps: &Captures| {
        let expr = caps.get(1).map_or("", |m| m.as_str()).trim();
        // Keep the attribute on the opening line so the HTML block stays
        // intact.
        let data = escape_attr(expr).replace('\n', "&#10;");
        format!(
          "\n<div class=\"math-block\" data-math=\"{data}\">\n$${}$$\n</div>\n",
          escape_html(expr)
        )
      })
      .into_owned()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn embed(text: &str) -> String {
    EmbedPreprocessor::new(&MarkdownOptions::default()).run(text)
  }

  #[test]
  fn test_image_embed() {
    let html = embed("![[Photos/Cat.PNG|A cat]]");
    assert_eq!(
      html,
      "<img src=\"/api/vault/attachment/Photos/Cat.PNG\" alt=\"A cat\" \
       class=\"embedded-image max-w-full h-auto rounded-lg\" loading=\"lazy\">"
    );
  }

  #[test]
  fn test_note_embed_with_heading() {
    let html = embed("![[Other Note#Setup]]");
    assert!(html.contains("data-embed-target=\"Other Note\""));
    assert!(html.contains("data-embed-heading=\"Setup\""));
    assert!(html.contains("href=\"/note/Other Note\""));
    assert!(html.contains("📄 Other Note &gt; Setup</a>"));
    assert!(!html.contains("<img"));
  }

  #[test]
  fn test_quoted_note_embed_stays_quoted() {
    let text = embed("> ![[Other]]\n> more");
    let lines: Vec<&str> = text.split('\n').collect();
    assert_eq!(lines.len(), 3, "got: {text}");
    assert!(lines[0].starts_with("> <div class=\"embedded-note"));
    assert!(lines[0].ends_with("📄 Other</a></div>"));
    assert_eq!(lines[1], ">");
    assert_eq!(lines[2], "> more");
  }

  #[test]
  fn test_inline_note_embed_adds_no_line() {
    let text = embed("see ![[Other]] here");
    assert!(!text.contains('\n'), "got: {text}");
  }

  #[test]
  fn test_embed_escapes_target() {
    let html = embed("![[<script>]]");
    assert!(html.contains("data-embed-target=\"&lt;script&gt;\""));
    assert!(!html.contains("<script>"));
  }

  #[test]
  fn test_embed_in_code_span_untouched() {
    let line = "Use `![[image.png]]` to embed";
    assert_eq!(embed(line), line);
  }

  #[test]
  fn test_image_target_detection() {
    assert!(is_image_target("a.JPEG"));
    assert!(is_image_target("dir/b.svg"));
    assert!(!is_image_target("notes.md"));
    assert!(!is_image_target("png"));
  }

  #[test]
  fn test_callout_expansion() {
    let text = "> [!Warning] Mind the gap\n> first line\n>  indented\nafter";
    let out = CalloutPreprocessor.run(text);

    assert!(out.contains(
      "<div class=\"callout callout-warning\" data-callout=\"warning\">"
    ));
    assert!(
      out.contains("<div class=\"callout-title\">⚠️ Mind the gap</div>")
    );
    assert!(out.contains("\n\nfirst line\n indented\n\n</div>"));
    assert!(out.ends_with("</div>\n\nafter"));
  }

  #[test]
  fn test_callout_default_title_and_fold() {
    let out = CalloutPreprocessor.run("> [!TIP]-\n> body");
    assert!(out.contains("data-callout=\"tip\" data-callout-fold=\"-\""));
    assert!(out.contains("💡 Tip</div>"));
  }

  #[test]
  fn test_unknown_callout_type() {
    let out = CalloutPreprocessor.run("> [!bogus]\n> text");
    assert!(out.contains("class=\"callout callout-note\""));
    assert!(out.contains("📌 Bogus"));
  }

  #[test]
  fn test_callout_title_escaped() {
    let out = CalloutPreprocessor.run("> [!note] <b>bold</b>");
    assert!(out.contains("📝 &lt;b&gt;bold&lt;/b&gt;"));
  }

  #[test]
  fn test_plain_quote_untouched() {
    let text = "> just a quote\n> more";
    assert_eq!(CalloutPreprocessor.run(text), text);
  }

  #[test]
  fn test_block_math() {
    let out = BlockMathPreprocessor.run("before\n$$\na < b\n$$\nafter");
    assert!(out.contains("<div class=\"math-block\" data-math=\"a &lt; b\">"));
    assert!(out.contains("\n$$a &lt; b$$\n</div>\n"));
    assert!(out.starts_with("before\n"));
    assert!(out.ends_with("\nafter"));
  }

  #[test]
  fn test_block_math_multiline_attribute() {
    let out = BlockMathPreprocessor.run("$$a\\\\\nb$$");
    assert!(out.contains("data-math=\"a\\\\&#10;b\""));
  }

  #[test]
  fn test_callout_style_table() {
    assert_eq!(callout_style("faq"), ("❓", "callout-warning"));
    assert_eq!(callout_style("cite"), ("💬", "callout-quote"));
    assert_eq!(callout_style("bug"), ("🐛", "callout-danger"));
  }
}
