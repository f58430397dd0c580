//! Cache layer that orchestrates caching logic with network fetching.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use super::key::QueryKey;
use super::storage::MemoryStorage;
use super::traits::{CacheEntry, CacheResult, CacheStorage};
use crate::api::ApiError;

/// Capacity of the invalidation channel; slow subscribers see `Lagged`
/// and refetch unconditionally.
const INVALIDATION_CAPACITY: usize = 64;

/// Cache layer that manages caching logic and network fetching.
///
/// Each client owns its own layer, so tests can build isolated instances.
/// Clones share the same storage and invalidation channel.
#[derive(Clone)]
pub struct CacheLayer {
  storage: Arc<dyn CacheStorage>,
  /// How long before cached data is considered stale
  stale_time: Duration,
  /// Serve stale data when the network fails
  offline_fallback: bool,
  invalidations: broadcast::Sender<QueryKey>,
}

impl CacheLayer {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: impl CacheStorage + 'static) -> Self {
    let (invalidations, _) = broadcast::channel(INVALIDATION_CAPACITY);
    Self {
      storage: Arc::new(storage),
      stale_time: Duration::minutes(1),
      offline_fallback: false,
      invalidations,
    }
  }

  /// In-memory cache with default settings.
  pub fn in_memory() -> Self {
    Self::new(MemoryStorage::new())
  }

  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  pub fn with_offline_fallback(mut self, enabled: bool) -> Self {
    self.offline_fallback = enabled;
    self
  }

  pub fn storage_name(&self) -> &'static str {
    self.storage.name()
  }

  fn is_stale(&self, cached_at: DateTime<Utc>) -> bool {
    Utc::now() - cached_at > self.stale_time
  }

  fn is_fresh(&self, entry: &CacheEntry) -> bool {
    !entry.invalidated && !self.is_stale(entry.cached_at)
  }

  /// Fetch with a cache-first strategy.
  ///
  /// 1. Fresh, non-invalidated entry: return it without a request
  /// 2. Otherwise fetch and store the result
  /// 3. On network failure, return the stale entry when offline fallback is on
  pub async fn fetch<T, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<CacheResult<T>, ApiError>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
  {
    let cached = self.storage.get(key).map_err(ApiError::cache)?;

    if let Some(entry) = &cached {
      if self.is_fresh(entry) {
        match serde_json::from_value::<T>(entry.data.clone()) {
          Ok(data) => {
            trace!(key = %key, "cache hit");
            return Ok(CacheResult::from_cache(data, entry.cached_at));
          }
          Err(e) => warn!(key = %key, error = %e, "cached entry has unexpected shape, refetching"),
        }
      }
    }

    debug!(key = %key, cached = cached.is_some(), "cache miss, fetching");
    match fetcher().await {
      Ok(data) => {
        self.store(key, &data)?;
        Ok(CacheResult::from_network(data))
      }
      Err(err) => {
        if self.offline_fallback {
          if let Some(entry) = cached {
            if let Ok(data) = serde_json::from_value::<T>(entry.data) {
              warn!(key = %key, error = %err, "network failed, serving stale cache");
              return Ok(CacheResult::offline(data, entry.cached_at));
            }
          }
        }
        Err(err)
      }
    }
  }

  /// Read the cached value without fetching, fresh or not.
  pub fn peek<T: DeserializeOwned>(&self, key: &QueryKey) -> Result<Option<T>, ApiError> {
    let entry = self.storage.get(key).map_err(ApiError::cache)?;
    Ok(entry.and_then(|e| serde_json::from_value(e.data).ok()))
  }

  /// Seed or overwrite a slot directly.
  pub fn set_data<T: Serialize>(&self, key: &QueryKey, data: &T) -> Result<(), ApiError> {
    self.store(key, data)
  }

  fn store<T: Serialize>(&self, key: &QueryKey, data: &T) -> Result<(), ApiError> {
    let value = serde_json::to_value(data)
      .map_err(|e| ApiError::Cache(format!("failed to serialize {}: {}", key, e)))?;
    self.storage.put(key, &value).map_err(ApiError::cache)
  }

  /// Mark every slot under `prefix` stale and notify subscribed queries.
  pub fn invalidate(&self, prefix: &QueryKey) -> Result<usize, ApiError> {
    let marked = self.storage.invalidate(prefix).map_err(ApiError::cache)?;
    debug!(prefix = %prefix, marked, "invalidated");
    // No subscribers is not an error
    let _ = self.invalidations.send(prefix.clone());
    Ok(marked)
  }

  pub fn invalidate_all(&self, prefixes: &[QueryKey]) -> Result<(), ApiError> {
    for prefix in prefixes {
      self.invalidate(prefix)?;
    }
    Ok(())
  }

  /// Subscribe to invalidation signals.
  pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
    self.invalidations.subscribe()
  }

  /// Drop every slot and tell every subscribed query to refetch.
  pub fn clear(&self) -> Result<(), ApiError> {
    self.storage.clear().map_err(ApiError::cache)?;
    debug!("cache cleared");
    let _ = self.invalidations.send(QueryKey::root());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::CacheSource;
  use std::sync::atomic::{AtomicU32, Ordering};

  fn counting_fetch(
    counter: &AtomicU32,
  ) -> impl Future<Output = Result<Vec<u32>, ApiError>> + '_ {
    async move {
      let n = counter.fetch_add(1, Ordering::SeqCst);
      Ok(vec![n])
    }
  }

  #[tokio::test]
  async fn test_second_read_is_served_from_cache() {
    let cache = CacheLayer::in_memory();
    let key = QueryKey::new("categories");
    let counter = AtomicU32::new(0);

    let first = cache.fetch(&key, || counting_fetch(&counter)).await.unwrap();
    assert_eq!(first.source, CacheSource::Network);

    let second = cache.fetch(&key, || counting_fetch(&counter)).await.unwrap();
    assert_eq!(second.source, CacheSource::CacheFresh);
    assert_eq!(second.data, vec![0]);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_invalidation_forces_refetch() {
    let cache = CacheLayer::in_memory();
    let key = QueryKey::new("order_list").with(1i64);
    let counter = AtomicU32::new(0);

    cache.fetch(&key, || counting_fetch(&counter)).await.unwrap();
    cache.invalidate(&QueryKey::new("order_list")).unwrap();

    let after = cache.fetch(&key, || counting_fetch(&counter)).await.unwrap();
    assert_eq!(after.source, CacheSource::Network);
    assert_eq!(after.data, vec![1]);
  }

  #[tokio::test]
  async fn test_expired_entries_refetch() {
    let cache = CacheLayer::in_memory().with_stale_time(Duration::milliseconds(-1));
    let key = QueryKey::new("wallet");
    let counter = AtomicU32::new(0);

    cache.fetch(&key, || counting_fetch(&counter)).await.unwrap();
    cache.fetch(&key, || counting_fetch(&counter)).await.unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_errors_propagate_without_fallback() {
    let cache = CacheLayer::in_memory();
    let key = QueryKey::new("cart");
    cache.set_data(&key, &vec![7u32]).unwrap();
    cache.invalidate(&key).unwrap();

    let result = cache
      .fetch(&key, || async { Err::<Vec<u32>, _>(ApiError::validation("down")) })
      .await;
    assert!(result.is_err());
  }

  #[tokio::test]
  async fn test_offline_fallback_serves_stale_entry() {
    let cache = CacheLayer::in_memory().with_offline_fallback(true);
    let key = QueryKey::new("cart");
    cache.set_data(&key, &vec![7u32]).unwrap();
    cache.invalidate(&key).unwrap();

    let result = cache
      .fetch(&key, || async { Err::<Vec<u32>, _>(ApiError::validation("down")) })
      .await
      .unwrap();
    assert_eq!(result.source, CacheSource::Offline);
    assert_eq!(result.data, vec![7]);
  }

  #[tokio::test]
  async fn test_subscribers_receive_invalidated_prefix() {
    let cache = CacheLayer::in_memory();
    let mut rx = cache.subscribe();
    cache.invalidate(&QueryKey::new("favorites")).unwrap();
    assert_eq!(rx.recv().await.unwrap(), QueryKey::new("favorites"));
  }

  #[tokio::test]
  async fn test_clear_broadcasts_root() {
    let cache = CacheLayer::in_memory();
    cache.set_data(&QueryKey::new("cart"), &vec![1u32]).unwrap();
    let mut rx = cache.subscribe();
    cache.clear().unwrap();
    assert_eq!(rx.recv().await.unwrap(), QueryKey::root());
    assert_eq!(cache.peek::<Vec<u32>>(&QueryKey::new("cart")).unwrap(), None);
  }
}
