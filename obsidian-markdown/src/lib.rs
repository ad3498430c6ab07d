//! # obsidian-markdown
//!
//! Renders Obsidian-flavored Markdown to HTML, with a render cache keyed by
//! note modification time so unchanged notes are never rendered twice.
//!
//! ## Quick Start
//!
//! ```rust
//! use obsidian_markdown::{MarkdownOptions, MarkdownProcessor};
//!
//! let processor = MarkdownProcessor::new(MarkdownOptions::default());
//! let html =
//!   processor.render("See [[Projects#Roadmap|the roadmap]] #planning");
//!
//! assert!(html.contains("href=\"/note/Projects#roadmap\""));
//! assert!(html.contains("class=\"tag\">#planning</a>"));
//! ```
//!
//! ## Features
//!
//! - **Wiki-links** (`[[note#heading|alias]]`) and **embeds**
//!   (`![[image.png]]`, `![[note]]`)
//! - **Tags** (`#tag`, `#nested/tag`) linked to a tag search
//! - **Callouts** (`> [!warning] Title`) with icons and fold markers
//! - **Math**, inline (`$x$`) and display (`$$x$$`), left for a client-side
//!   renderer
//! - **Task lists** rendered as disabled checkboxes
//! - **Syntax highlighting** of fenced code through `syntect`, emitted as CSS
//!   classes
//! - **Heading permalinks** with document-unique ids
//! - **Render cache**, LRU-bounded, keyed by `(vault, note, mtime)`
//!
//! ## Cached rendering
//!
//! ```rust
//! use obsidian_markdown::{Config, MarkdownService};
//!
//! let service = MarkdownService::from_config(&Config::default());
//! let first = service.render_cached("# Notes", "vault", "Daily/Today", None);
//! let second = service.render_cached("# Notes", "vault", "Daily/Today", None);
//!
//! assert_eq!(first, second);
//! assert_eq!(service.get_cache_stats().hits, 1);
//! ```
pub mod cache;
pub mod config;
pub mod error;
pub mod patterns;
pub mod processor;
pub mod service;
pub mod syntax;
pub mod utils;

pub use crate::{
  cache::{CacheConfig, CacheStats, RenderCache, cache_key},
  config::Config,
  error::ConfigError,
  processor::{
    MarkdownOptions,
    MarkdownOptionsBuilder,
    MarkdownProcessor,
    ProcessorFeature,
    process_safe,
    process_with_recovery,
  },
  service::MarkdownService,
  syntax::{SyntaxError, SyntaxManager},
};
