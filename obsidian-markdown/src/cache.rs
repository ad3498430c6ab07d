//! Modification-time keyed render cache.
//!
//! Entries are keyed by a digest of `(vault_id, note_path, modified_at)`.
//! Editing a note changes its timestamp and therefore its key, so stale
//! entries are never served; they simply stop being looked up and age out
//! under LRU pressure.
//!
//! A single mutex guards both the store and the hit/miss counters. It is
//! only ever held for a lookup or an insert, never across a render.
use std::{
  num::NonZeroUsize,
  sync::{Mutex, MutexGuard},
};

use jiff::Timestamp;
use log::{debug, info, warn};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Default number of rendered notes kept in memory.
pub const DEFAULT_CACHE_SIZE: usize = 500;

/// Stands in for a missing modification time in the key material.
const NO_MTIME: &str = "none";

/// Cache sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Maximum number of entries; 0 is treated as 1.
  pub max_size: usize,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      max_size: DEFAULT_CACHE_SIZE,
    }
  }
}

/// Snapshot of the cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
  pub hits:     u64,
  pub misses:   u64,
  hit_rate:     f64,
  pub size:     usize,
  pub max_size: usize,
}

impl CacheStats {
  #[must_use]
  #[allow(
    clippy::cast_precision_loss,
    reason = "Counters stay far below 2^52 in practice"
  )]
  pub fn new(hits: u64, misses: u64, size: usize, max_size: usize) -> Self {
    let total = hits + misses;
    let hit_rate = if total == 0 {
      0.0
    } else {
      hits as f64 / total as f64 * 100.0
    };
    Self {
      hits,
      misses,
      hit_rate,
      size,
      max_size,
    }
  }

  /// Percentage of lookups that were hits; 0 before any lookup.
  #[must_use]
  pub const fn hit_rate(&self) -> f64 {
    self.hit_rate
  }
}

/// Derive the cache key for a note revision.
///
/// The key is the hex SHA-256 of `vault_id:note_path:mtime`, where `mtime`
/// is the RFC 3339 timestamp or a fixed sentinel when absent. Every key has
/// the same length and none of them reveal the note path.
#[must_use]
pub fn cache_key(
  vault_id: &str,
  note_path: &str,
  modified_at: Option<Timestamp>,
) -> String {
  let mtime =
    modified_at.map_or_else(|| NO_MTIME.to_string(), |ts| ts.to_string());
  let digest = Sha256::digest(format!("{vault_id}:{note_path}:{mtime}"));
  hex::encode(digest)
}

struct CacheState {
  entries: LruCache<String, String>,
  hits:    u64,
  misses:  u64,
}

/// Bounded LRU cache of rendered HTML.
pub struct RenderCache {
  state:    Mutex<CacheState>,
  max_size: usize,
}

impl RenderCache {
  /// Create a cache holding at most `max_size` entries (at least one).
  #[must_use]
  pub fn new(max_size: usize) -> Self {
    let capacity = NonZeroUsize::new(max_size).unwrap_or(NonZeroUsize::MIN);
    Self {
      state:    Mutex::new(CacheState {
        entries: LruCache::new(capacity),
        hits:    0,
        misses:  0,
      }),
      max_size: capacity.get(),
    }
  }

  #[must_use]
  pub fn from_config(config: &CacheConfig) -> Self {
    Self::new(config.max_size)
  }

  fn lock(&self, op: &'static str) -> MutexGuard<'_, CacheState> {
    match self.state.lock() {
      Ok(guard) => guard,
      Err(poisoned) => {
        warn!("Recovered from poisoned render cache lock during {op}");
        poisoned.into_inner()
      },
    }
  }

  /// Look up a rendered note, counting a hit or a miss.
  ///
  /// A hit marks the entry as most recently used.
  pub fn get(
    &self,
    vault_id: &str,
    note_path: &str,
    modified_at: Option<Timestamp>,
  ) -> Option<String> {
    let key = cache_key(vault_id, note_path, modified_at);
    let mut state = self.lock("get");

    let found = state.entries.get(&key).cloned();
    if found.is_some() {
      state.hits += 1;
      debug!("Render cache hit: {vault_id}/{note_path}");
    } else {
      state.misses += 1;
      debug!("Render cache miss: {vault_id}/{note_path}");
    }
    found
  }

  /// Store a rendered note, evicting the least recently used entry if the
  /// cache is full.
  pub fn set(
    &self,
    vault_id: &str,
    note_path: &str,
    modified_at: Option<Timestamp>,
    html: String,
  ) {
    let key = cache_key(vault_id, note_path, modified_at);
    let mut state = self.lock("set");
    if let Some((evicted, _)) = state.entries.push(key.clone(), html)
      && evicted != key
    {
      debug!("Render cache evicted one entry");
    }
  }

  /// Check for an entry without touching recency or the counters.
  #[must_use]
  pub fn contains(
    &self,
    vault_id: &str,
    note_path: &str,
    modified_at: Option<Timestamp>,
  ) -> bool {
    let key = cache_key(vault_id, note_path, modified_at);
    self.lock("contains").entries.contains(&key)
  }

  /// Drop every entry and reset the counters, returning how many entries
  /// were dropped.
  pub fn clear(&self) -> usize {
    let mut state = self.lock("clear");
    let dropped = state.entries.len();
    state.entries.clear();
    state.hits = 0;
    state.misses = 0;
    drop(state);

    info!("Render cache cleared ({dropped} entries)");
    dropped
  }

  /// Invalidate cached renders.
  ///
  /// Without a note path this clears the whole cache, every vault included,
  /// since keys are digests and cannot be filtered by vault. With a note
  /// path nothing is dropped: a changed note already has a new key.
  pub fn invalidate(&self, vault_id: &str, note_path: Option<&str>) -> usize {
    match note_path {
      Some(path) => {
        debug!("Nothing to invalidate for {vault_id}/{path}");
        0
      },
      None => {
        info!("Invalidating render cache for vault {vault_id}");
        self.clear()
      },
    }
  }

  #[must_use]
  pub fn stats(&self) -> CacheStats {
    let state = self.lock("stats");
    CacheStats::new(
      state.hits,
      state.misses,
      state.entries.len(),
      self.max_size,
    )
  }

  #[must_use]
  pub const fn max_size(&self) -> usize {
    self.max_size
  }
}

impl Default for RenderCache {
  fn default() -> Self {
    Self::new(DEFAULT_CACHE_SIZE)
  }
}

impl std::fmt::Debug for RenderCache {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RenderCache")
      .field("stats", &self.stats())
      .finish()
  }
}
