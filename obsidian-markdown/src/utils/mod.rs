//! Shared helpers for escaping, slugs and regex compilation.
pub mod codeblock;

use std::{borrow::Cow, sync::LazyLock};

use regex::Regex;

/// Escape text for use between HTML tags.
#[must_use]
pub fn escape_html(text: &str) -> Cow<'_, str> {
  html_escape::encode_text(text)
}

/// Escape text for use inside a double-quoted HTML attribute.
#[must_use]
pub fn escape_attr(text: &str) -> Cow<'_, str> {
  html_escape::encode_double_quoted_attribute(text)
}

/// Turn a wiki-link heading into a URL fragment: lower-cased, spaces become
/// hyphens. Nothing else is touched so the fragment matches what Obsidian
/// writes.
#[must_use]
pub fn heading_fragment(heading: &str) -> String {
  heading.trim().to_lowercase().replace(' ', "-")
}

/// Slugify rendered heading HTML for use as an element id.
///
/// Tags are stripped and entities decoded first. The result keeps letters,
/// digits, `-` and `_`; whitespace runs collapse to a single `-`.
#[must_use]
pub fn heading_slug(html: &str) -> String {
  static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex("html tag", r"<[^>]*>"));

  let text = TAG_RE.replace_all(html, "");
  let text = html_escape::decode_html_entities(&text).to_lowercase();

  let kept: String = text
    .chars()
    .filter(|c| {
      c.is_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '_')
    })
    .collect();

  let slug = kept.split_whitespace().collect::<Vec<_>>().join("-");
  if slug.is_empty() {
    "section".to_string()
  } else {
    slug
  }
}

/// Capitalize the first letter of a word and lower-case the rest.
#[must_use]
pub fn title_case(s: &str) -> String {
  let mut chars = s.chars();
  chars.next().map_or_else(String::new, |c| {
    c.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
  })
}

/// Compile `pattern`, logging and falling back to [`never_matching_regex`]
/// on failure so a broken pattern disables one feature instead of the
/// renderer.
#[must_use]
pub fn compile_regex(name: &str, pattern: &str) -> Regex {
  Regex::new(pattern).unwrap_or_else(|e| {
    log::error!("Failed to compile {name} regex: {e}");
    never_matching_regex()
  })
}

/// Create a regex that never matches anything.
///
/// This is used as a fallback pattern when a regex fails to compile.
/// It will never match any input, which is safer than using a trivial regex
/// like `^$` which would match empty strings.
///
/// # Panics
///
/// Panics if the fallback regex pattern fails to compile, which should never
/// happen.
#[must_use]
#[allow(
  clippy::expect_used,
  reason = "The fallback pattern is a constant that always compiles"
)]
pub fn never_matching_regex() -> Regex {
  Regex::new(r"[^\s\S]").expect("the never-matching pattern is valid")
}
