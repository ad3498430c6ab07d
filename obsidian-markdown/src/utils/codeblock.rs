//! Code fence and code span detection for the line-level passes.
//!
//! The fenced-code pass and the embed preprocessor both work on raw text
//! before comrak sees it, so they need their own (small) notion of where code
//! starts and ends.

use std::ops::Range;

/// An opening code fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fence<'a> {
  /// Leading indentation of the fence line.
  pub indent:      &'a str,
  /// Either '`' or '~'.
  pub fence_char:  char,
  /// Length of the fence run, at least 3.
  pub fence_count: usize,
  /// First word of the info string.
  pub language:    Option<&'a str>,
}

impl<'a> Fence<'a> {
  /// Parse `line` as an opening fence.
  ///
  /// Up to three spaces of indentation are allowed; anything deeper is an
  /// indented code block or list content and is left alone.
  #[must_use]
  pub fn open(line: &'a str) -> Option<Self> {
    let trimmed = line.trim_start_matches(' ');
    let indent_len = line.len() - trimmed.len();
    if indent_len > 3 {
      return None;
    }

    let fence_char = trimmed.chars().next().filter(|c| matches!(c, '`' | '~'))?;
    let fence_count = trimmed.chars().take_while(|&c| c == fence_char).count();
    if fence_count < 3 {
      return None;
    }

    let info = trimmed[fence_count..].trim();
    // Backtick fences cannot carry backticks in their info string, otherwise
    // the line is an inline code span.
    if fence_char == '`' && info.contains('`') {
      return None;
    }

    let language = info
      .split_whitespace()
      .next()
      .map(|word| word.trim_matches(|c| c == '{' || c == '}' || c == '.'))
      .filter(|word| !word.is_empty());

    Some(Self {
      indent: &line[..indent_len],
      fence_char,
      fence_count,
      language,
    })
  }

  /// Check whether `line` closes this fence.
  #[must_use]
  pub fn is_closed_by(&self, line: &str) -> bool {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
      return false;
    }
    let count = trimmed.chars().take_while(|&c| c == self.fence_char).count();
    count >= self.fence_count && trimmed[count..].trim().is_empty()
  }
}

/// Byte ranges of the inline code spans in a single line.
///
/// A run of N backticks opens a span that is closed by the next run of
/// exactly N backticks. Unmatched runs are literal text.
#[must_use]
pub fn inline_code_spans(line: &str) -> Vec<Range<usize>> {
  let bytes = line.as_bytes();
  let mut spans = Vec::new();
  let mut i = 0;

  while i < bytes.len() {
    if bytes[i] != b'`' {
      i += 1;
      continue;
    }

    let start = i;
    while i < bytes.len() && bytes[i] == b'`' {
      i += 1;
    }
    let run = i - start;

    let mut j = i;
    while j < bytes.len() {
      if bytes[j] == b'`' {
        let run_start = j;
        while j < bytes.len() && bytes[j] == b'`' {
          j += 1;
        }
        if j - run_start == run {
          spans.push(start..j);
          i = j;
          break;
        }
      } else {
        j += 1;
      }
    }
  }

  spans
}
