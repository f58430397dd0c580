//! Core types shared by the cache layer and its storage backends.

use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde_json::Value;

use super::key::QueryKey;

/// A cached query result.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
  /// Response payload as last received
  pub data: Value,
  /// When the payload was stored
  pub cached_at: DateTime<Utc>,
  /// Set by invalidation; the next read must refetch
  pub invalidated: bool,
}

/// Trait for cache storage backends.
pub trait CacheStorage: Send + Sync {
  /// Short backend name for logs.
  fn name(&self) -> &'static str;

  /// Look up the entry stored for `key`.
  fn get(&self, key: &QueryKey) -> Result<Option<CacheEntry>>;

  /// Store `data` for `key`, clearing any invalidation mark.
  fn put(&self, key: &QueryKey, data: &Value) -> Result<()>;

  /// Mark every entry whose key starts with `prefix` as invalidated.
  /// Returns the number of entries marked.
  fn invalidate(&self, prefix: &QueryKey) -> Result<usize>;

  /// Drop every entry.
  fn clear(&self) -> Result<()>;
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::CacheFresh,
      cached_at: Some(cached_at),
    }
  }

  /// Stale data served because the network failed.
  pub fn offline(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Offline,
      cached_at: Some(cached_at),
    }
  }
}

/// Indicates where returned data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, still considered fresh
  CacheFresh,
  /// Network unavailable, serving stale cached data
  Offline,
}
