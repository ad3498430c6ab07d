//! Fenced code blocks, highlighted before any other pass runs.
//!
//! Each block is rendered to HTML up front and parked in the
//! [`RenderContext`]; the text keeps only an HTML comment placeholder. That
//! way neither the preprocessors nor comrak ever reinterpret code as
//! Markdown, and blank lines inside highlighted output cannot split a raw
//! HTML block.
use log::debug;

use super::types::RenderContext;
use crate::{
  syntax::SyntaxManager,
  utils::{codeblock::Fence, escape_attr, escape_html},
};

/// Render one code block.
///
/// With a backend, the language is taken from the fence or detected from
/// the code; if neither works, or highlighting fails, the code is emitted as
/// a plain escaped block.
#[must_use]
pub fn render_code_block(
  manager: Option<&SyntaxManager>,
  code: &str,
  language: Option<&str>,
) -> String {
  if let Some(manager) = manager {
    let language = language
      .map(|lang| manager.resolve_language(lang))
      .or_else(|| manager.detect_language(code));

    if let Some(language) = language {
      match manager.highlight_code(code, &language) {
        Ok(highlighted) => {
          let language = escape_attr(&language);
          return format!(
            "<div class=\"code-block\"><div class=\"highlight\" \
             data-language=\"{language}\"><pre><code \
             class=\"language-{language}\">{highlighted}</code></pre>\
             </div></div>"
          );
        },
        Err(e) => debug!("Highlighting '{language}' failed: {e}"),
      }
    }
  }

  format!(
    "<div class=\"code-block\"><pre><code>{}</code></pre></div>",
    escape_html(code)
  )
}

/// Strip up to `width` leading spaces, as CommonMark does for content lines
/// of an indented fence.
fn strip_indent(line: &str, width: usize) -> &str {
  let spaces = line.bytes().take(width).take_while(|&b| b == b' ').count();
  &line[spaces..]
}

/// Replace every closed fenced code block in `content` with a placeholder,
/// stashing its rendered HTML in `context`.
///
/// An unclosed fence runs to the end of the document; it and everything
/// after it are left for comrak.
#[must_use]
pub fn stash_fenced_code(
  content: &str,
  manager: Option<&SyntaxManager>,
  context: &mut RenderContext,
) -> String {
  let lines: Vec<&str> = content.split('\n').collect();
  let mut output: Vec<String> = Vec::with_capacity(lines.len());
  let mut i = 0;

  while i < lines.len() {
    let line = lines[i];
    let Some(fence) = Fence::open(line.trim_end_matches('\r')) else {
      output.push(line.to_string());
      i += 1;
      continue;
    };

    let close = lines[i + 1..]
      .iter()
      .position(|l| fence.is_closed_by(l.trim_end_matches('\r')))
      .map(|offset| i + 1 + offset);

    let Some(close) = close else {
      output.extend(lines[i..].iter().map(|l| (*l).to_string()));
      break;
    };

    let mut code = lines[i + 1..close]
      .iter()
      .map(|l| strip_indent(l.trim_end_matches('\r'), fence.indent.len()))
      .collect::<Vec<_>>()
      .join("\n");
    if close > i + 1 {
      code.push('\n');
    }

    let html = render_code_block(manager, &code, fence.language);
    output.push(format!("{}{}", fence.indent, context.stash_code_block(html)));
    i = close + 1;
  }

  output.join("\n")
}
