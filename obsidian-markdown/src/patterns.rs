//! Patterns for the Obsidian syntax extensions.
//!
//! Several of these overlap in their trigger character (`[`, `!`, `#`, `$`),
//! so the passes that use them run in a fixed order: embeds are consumed
//! on the raw text before any wiki-link is looked for, and block math is
//! fenced before inline math can see the `$$` delimiters.
//!
//! The `regex` crate has no look-around, so the tag and inline-math
//! matchers check their boundary conditions by hand.
use std::{ops::Range, sync::LazyLock};

use regex::{Captures, Regex};

use crate::utils::compile_regex;

/// `![[target#heading|alias]]`
pub static EMBED_RE: LazyLock<Regex> = LazyLock::new(|| {
  compile_regex("embed", r"!\[\[([^\]|#]+)(?:#([^\]|]+))?(?:\|([^\]]+))?\]\]")
});

/// `[[target#heading|alias]]`
pub static WIKI_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
  compile_regex(
    "wiki-link",
    r"\[\[([^\]|#]+)(?:#([^\]|]+))?(?:\|([^\]]+))?\]\]",
  )
});

/// `$$expr$$`, may span lines.
pub static BLOCK_MATH_RE: LazyLock<Regex> =
  LazyLock::new(|| compile_regex("block math", r"(?s)\$\$(.+?)\$\$"));

/// `> [!type]+ title`
pub static CALLOUT_RE: LazyLock<Regex> = LazyLock::new(|| {
  compile_regex("callout", r"^>\s*\[!(\w+)\]([+-])?(?:\s*(.*))?$")
});

static TAG_RE: LazyLock<Regex> =
  LazyLock::new(|| compile_regex("tag", r"#([A-Za-z][A-Za-z0-9_/-]*)"));

/// The parts of a wiki-link or embed, trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkParts<'a> {
  pub target:  &'a str,
  pub heading: Option<&'a str>,
  pub alias:   Option<&'a str>,
}

impl<'a> LinkParts<'a> {
  /// Extract the parts from an [`EMBED_RE`] or [`WIKI_LINK_RE`] match.
  ///
  /// Returns `None` when the target is only whitespace.
  #[must_use]
  pub fn from_captures(caps: &Captures<'a>) -> Option<Self> {
    let target = caps.get(1)?.as_str().trim();
    if target.is_empty() {
      return None;
    }
    let trimmed = |i: usize| {
      caps
        .get(i)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
    };

    Some(Self {
      target,
      heading: trimmed(2),
      alias: trimmed(3),
    })
  }
}

/// A `#tag` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMatch<'a> {
  /// Byte range of the whole match, including `#`.
  pub range: Range<usize>,
  /// Tag name without the `#`; may contain `/` for nesting.
  pub name:  &'a str,
}

/// Find tags in `text`.
///
/// A tag must not be preceded by `#` or a word character, so `word#tag`,
/// `##tag` and URL fragments stay literal.
#[must_use]
pub fn find_tags(text: &str) -> Vec<TagMatch<'_>> {
  TAG_RE
    .captures_iter(text)
    .filter_map(|caps| {
      let whole = caps.get(0)?;
      let preceding = text[..whole.start()].chars().next_back();
      if preceding.is_some_and(|c| c == '#' || c == '_' || c.is_alphanumeric())
      {
        return None;
      }
      let name = caps.get(1)?.as_str();
      Some(TagMatch {
        range: whole.range(),
        name,
      })
    })
    .collect()
}

/// An inline `$expr$` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathMatch<'a> {
  /// Byte range including both `$` delimiters.
  pub range: Range<usize>,
  /// Expression between the delimiters, verbatim.
  pub expr:  &'a str,
}

/// Find inline math in `text`.
///
/// Neither delimiter may touch another `$` or follow a backslash, and the
/// expression is non-empty and stays on one line. The closest valid closing
/// `$` wins.
#[must_use]
pub fn find_inline_math(text: &str) -> Vec<MathMatch<'_>> {
  let bytes = text.as_bytes();
  let is_dollar = |i: usize| bytes.get(i) == Some(&b'$');
  let is_escaped = |i: usize| i > 0 && bytes[i - 1] == b'\\';
  let mut matches = Vec::new();
  let mut start = 0;

  while let Some(offset) = text[start..].find('$') {
    let open = start + offset;
    start = open + 1;

    if is_escaped(open)
      || (open > 0 && is_dollar(open - 1))
      || is_dollar(open + 1)
    {
      continue;
    }

    let close = (open + 2..bytes.len())
      .take_while(|&i| bytes[i - 1] != b'\n')
      .find(|&i| {
        bytes[i] == b'$'
          && !is_escaped(i)
          && !is_dollar(i - 1)
          && !is_dollar(i + 1)
      });

    if let Some(close) = close {
      matches.push(MathMatch {
        range: open..close + 1,
        expr:  &text[open + 1..close],
      });
      start = close + 1;
    }
  }

  matches
}
