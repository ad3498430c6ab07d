//! Whole-document rewrites of the generated HTML.
use std::{collections::HashSet, sync::LazyLock};

use regex::{Captures, Regex};

use super::types::{Postprocessor, RenderContext};
use crate::utils::{compile_regex, heading_slug};

/// Puts the highlighted code blocks back in place of their placeholders.
///
/// Runs first so the later passes see the final markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeBlockRestorer;

impl Postprocessor for CodeBlockRestorer {
  fn name(&self) -> &'static str {
    "code_block_restore"
  }

  fn priority(&self) -> u32 {
    30
  }

  fn run(&self, html: &str, context: &RenderContext) -> String {
    static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
      compile_regex(
        "code block placeholder",
        r"<!-- obsidian-code-block:(\d+) -->",
      )
    });

    if context.code_block_count() == 0 {
      return html.to_string();
    }

    PLACEHOLDER_RE
      .replace_all(html, |caps: &Captures| {
        caps[1]
          .parse::<usize>()
          .ok()
          .and_then(|index| context.code_block(index))
          .map_or_else(|| caps[0].to_string(), str::to_string)
      })
      .into_owned()
  }
}

/// Turns list items starting with `[ ]`, `[x]` or `[X]` into disabled
/// checkboxes.
///
/// Matches both tight (`<li>[ ]`) and loose (`<li>\n<p>[ ]`) items.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskListPostprocessor;

impl Postprocessor for TaskListPostprocessor {
  fn name(&self) -> &'static str {
    "task_list"
  }

  fn priority(&self) -> u32 {
    25
  }

  fn run(&self, html: &str, _context: &RenderContext) -> String {
    static TASK_RE: LazyLock<Regex> = LazyLock::new(|| {
      compile_regex("task list item", r"<li>(\n?<p>)?\[([ xX])\]")
    });

    TASK_RE
      .replace_all(html, |caps: &Captures| {
        let paragraph = caps.get(1).map_or("", |m| m.as_str());
        let checked = if &caps[2] == " " { "" } else { " checked" };
        format!(
          "<li class=\"task-list-item\">{paragraph}<input type=\"checkbox\" \
           class=\"task-checkbox\" disabled{checked}>"
        )
      })
      .into_owned()
  }
}

/// Gives every heading a unique `id` and appends a permalink to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadingPermalinks;

impl HeadingPermalinks {
  fn unique_id(slug: String, used: &mut HashSet<String>) -> String {
    let mut candidate = slug.clone();
    let mut n = 1;
    while used.contains(&candidate) {
      candidate = format!("{slug}_{n}");
      n += 1;
    }
    used.insert(candidate.clone());
    candidate
  }
}

impl Postprocessor for HeadingPermalinks {
  fn name(&self) -> &'static str {
    "heading_permalinks"
  }

  fn priority(&self) -> u32 {
    20
  }

  fn run(&self, html: &str, _context: &RenderContext) -> String {
    static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
      compile_regex("heading", r"(?s)<h([1-6])>(.*?)</h[1-6]>")
    });

    let mut used = HashSet::new();
    HEADING_RE
      .replace_all(html, |caps: &Captures| {
        let level = &caps[1];
        let content = &caps[2];
        let id = Self::unique_id(heading_slug(content), &mut used);
        format!(
          "<h{level} id=\"{id}\">{content}<a class=\"headerlink \
           header-anchor\" href=\"#{id}\" title=\"Link to this \
           section\">&para;</a></h{level}>"
        )
      })
      .into_owned()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_restore_code_blocks() {
    let mut context = RenderContext::new();
    let placeholder = context.stash_code_block("<pre>code</pre>".to_string());
    let html =
      format!("<p>a</p>\n{placeholder}\n<!-- obsidian-code-block:9 -->");

    let restored = CodeBlockRestorer.run(&html, &context);
    assert_eq!(
      restored,
      "<p>a</p>\n<pre>code</pre>\n<!-- obsidian-code-block:9 -->"
    );
  }

  #[test]
  fn test_restore_without_blocks_is_identity() {
    let html = "<!-- obsidian-code-block:0 -->";
    assert_eq!(CodeBlockRestorer.run(html, &RenderContext::new()), html);
  }

  #[test]
  fn test_task_list_tight_and_loose() {
    let html = "<ul>\n<li>[ ] todo</li>\n<li>\n<p>[X] done</p>\n</li>\n</ul>";
    let out = TaskListPostprocessor.run(html, &RenderContext::new());

    assert!(out.contains(
      "<li class=\"task-list-item\"><input type=\"checkbox\" \
       class=\"task-checkbox\" disabled> todo</li>"
    ));
    assert!(out.contains(
      "<li class=\"task-list-item\">\n<p><input type=\"checkbox\" \
       class=\"task-checkbox\" disabled checked> done</p>"
    ));
  }

  #[test]
  fn test_task_list_ignores_other_brackets() {
    let html = "<li>[y] maybe</li><p>[ ] not a list</p>";
    assert_eq!(TaskListPostprocessor.run(html, &RenderContext::new()), html);
  }

  #[test]
  fn test_heading_permalinks_dedupe() {
    let html = "<h1>Intro</h1>\n<h2>Intro</h2>\n<h2>Intro</h2>";
    let out = HeadingPermalinks.run(html, &RenderContext::new());

    assert!(out.contains("<h1 id=\"intro\">Intro<a class=\"headerlink"));
    assert!(out.contains("<h2 id=\"intro_1\">"));
    assert!(out.contains("<h2 id=\"intro_2\">"));
    assert!(out.contains(
      "href=\"#intro_2\" title=\"Link to this section\">&para;</a></h2>"
    ));
  }
}
