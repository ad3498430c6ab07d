//! The rendering service: one processor plus one cache.
//!
//! Construct it once at startup and share it by reference or `Arc`. Both
//! halves are safe to use from many threads at once.
use jiff::Timestamp;
use log::debug;

use crate::{
  cache::{CacheStats, RenderCache},
  config::Config,
  processor::{MarkdownOptions, MarkdownProcessor, process_with_recovery},
};

#[derive(Debug)]
pub struct MarkdownService {
  processor: MarkdownProcessor,
  cache:     RenderCache,
}

impl MarkdownService {
  #[must_use]
  pub fn new(options: MarkdownOptions, cache_max_size: usize) -> Self {
    Self {
      processor: MarkdownProcessor::new(options),
      cache:     RenderCache::new(cache_max_size),
    }
  }

  #[must_use]
  pub fn from_config(config: &Config) -> Self {
    Self {
      processor: MarkdownProcessor::new(config.markdown.clone()),
      cache:     RenderCache::from_config(&config.cache),
    }
  }

  #[must_use]
  pub const fn processor(&self) -> &MarkdownProcessor {
    &self.processor
  }

  #[must_use]
  pub const fn cache(&self) -> &RenderCache {
    &self.cache
  }

  /// Render without touching the cache.
  #[must_use]
  pub fn render(&self, markdown: &str) -> String {
    process_with_recovery(&self.processor, markdown)
  }

  /// Render through the cache.
  ///
  /// On a miss the note is rendered without holding the cache lock, then
  /// stored. Two concurrent misses on the same key both render; the second
  /// store wins, and both produce the same HTML.
  pub fn render_cached(
    &self,
    markdown: &str,
    vault_id: &str,
    note_path: &str,
    modified_at: Option<Timestamp>,
  ) -> String {
    if let Some(html) = self.cache.get(vault_id, note_path, modified_at) {
      return html;
    }

    debug!("Rendering {vault_id}/{note_path}");
    let html = self.render(markdown);
    self
      .cache
      .set(vault_id, note_path, modified_at, html.clone());
    html
  }

  #[must_use]
  pub fn get_cache_stats(&self) -> CacheStats {
    self.cache.stats()
  }

  pub fn clear_cache(&self) {
    self.cache.clear();
  }

  /// See [`RenderCache::invalidate`].
  pub fn invalidate_cache(
    &self,
    vault_id: &str,
    note_path: Option<&str>,
  ) -> usize {
    self.cache.invalidate(vault_id, note_path)
  }
}

impl Default for MarkdownService {
  fn default() -> Self {
    Self::from_config(&Config::default())
  }
}

#[cfg(test)]
mod tests {
  use std::{sync::Arc, thread};

  use super::*;
  use crate::cache::DEFAULT_CACHE_SIZE;

  fn service(max_size: usize) -> MarkdownService {
    MarkdownService::new(
      MarkdownOptions {
        highlight_code: false,
        ..Default::default()
      },
      max_size,
    )
  }

  #[test]
  fn test_service_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MarkdownService>();
  }

  #[test]
  fn test_from_config() {
    let service = MarkdownService::from_config(&Config::default());
    assert_eq!(service.get_cache_stats().max_size, DEFAULT_CACHE_SIZE);
  }

  #[test]
  fn test_render_cached_skips_pipeline_on_hit() {
    let service = service(8);
    let first = service.render_cached("**a**", "v", "n", None);
    // Different content under the same key proves the cached value is used.
    let second = service.render_cached("**b**", "v", "n", None);

    assert_eq!(first, "<p><strong>a</strong></p>\n");
    assert_eq!(second, first);
    let stats = service.get_cache_stats();
    assert_eq!((stats.hits, stats.misses, stats.size), (1, 1, 1));
  }

  #[test]
  fn test_clear_cache() {
    let service = service(8);
    let _ = service.render_cached("a", "v", "n", None);
    service.clear_cache();
    assert_eq!(service.get_cache_stats(), CacheStats::new(0, 0, 0, 8));
  }

  #[test]
  fn test_concurrent_renders() {
    let service = Arc::new(service(64));
    let handles: Vec<_> = (0..8)
      .map(|i| {
        let service = Arc::clone(&service);
        thread::spawn(move || {
          let note = format!("note-{}", i % 4);
          service.render_cached(&format!("# {note}"), "v", &note, None)
        })
      })
      .collect();

    for handle in handles {
      let html = handle.join().expect("render thread panicked");
      assert!(html.starts_with("<h1 id=\"note-"));
    }

    let stats = service.get_cache_stats();
    assert_eq!(stats.hits + stats.misses, 8);
    assert_eq!(stats.size, 4);
  }
}
