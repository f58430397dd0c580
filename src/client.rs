//! Marketplace client with transparent caching.

use std::future::Future;
use std::sync::Arc;

use color_eyre::Result;
use tracing::info;

use crate::api::{ApiError, Credentials, RequestClient};
use crate::cache::{CacheLayer, MemoryStorage, QueryKey, SqliteStorage};
use crate::config::Config;
use crate::progress::ProgressSink;
use crate::query::{Mutation, Query};

/// Local, synchronous checks run before a mutation touches the network.
pub trait Validate {
  fn validate(&self) -> Result<(), ApiError>;
}

impl Validate for () {
  fn validate(&self) -> Result<(), ApiError> {
    Ok(())
  }
}

/// Marketplace client.
///
/// Reads go through the cache layer keyed by `QueryKey`; writes validate
/// their input, send the request and invalidate the keys they affect.
/// Resource operations are implemented in `crate::resources`.
#[derive(Clone)]
pub struct DecorClient {
  http: RequestClient,
  cache: CacheLayer,
}

impl DecorClient {
  pub fn new(http: RequestClient, cache: CacheLayer) -> Self {
    Self { http, cache }
  }

  /// Build the client described by the configuration.
  pub fn from_config(
    config: &Config,
    credentials: Credentials,
    progress: Arc<dyn ProgressSink>,
  ) -> Result<Self> {
    let http = RequestClient::new(&config.api.base_url)?
      .with_credentials(credentials)
      .with_progress(progress);

    let cache = if config.cache.persist {
      CacheLayer::new(SqliteStorage::open()?)
    } else {
      CacheLayer::new(MemoryStorage::new())
    };
    let cache = cache
      .with_stale_time(config.cache.stale_time()?)
      .with_offline_fallback(config.cache.offline_fallback);

    info!(
      base_url = %config.api.base_url,
      storage = cache.storage_name(),
      "client ready"
    );
    Ok(Self::new(http, cache))
  }

  pub fn http(&self) -> &RequestClient {
    &self.http
  }

  pub fn cache(&self) -> &CacheLayer {
    &self.cache
  }

  pub fn credentials(&self) -> &Credentials {
    self.http.credentials()
  }

  /// Serve `key` from the cache, awaiting `request` only on a miss.
  ///
  /// `request` is lazy: on a hit it is dropped without being polled, so no
  /// network call is made.
  pub async fn cached<T, Fut>(&self, key: &QueryKey, request: Fut) -> Result<T, ApiError>
  where
    T: serde::Serialize + serde::de::DeserializeOwned,
    Fut: Future<Output = Result<T, ApiError>>,
  {
    self.cache.fetch(key, || request).await.map(|r| r.data)
  }

  /// Validate `input`, run `request`, then invalidate `invalidates`.
  ///
  /// Invalidation happens only after a successful response.
  pub async fn mutate<I, T, Fut>(
    &self,
    input: &I,
    invalidates: &[QueryKey],
    request: Fut,
  ) -> Result<T, ApiError>
  where
    I: Validate + ?Sized,
    Fut: Future<Output = Result<T, ApiError>>,
  {
    input.validate()?;
    let output = request.await?;
    self.cache.invalidate_all(invalidates)?;
    Ok(output)
  }

  /// Build a query handle reading `key`.
  ///
  /// When `enabled` is false the handle never calls `fetch`.
  pub fn query<T, F, Fut>(&self, key: QueryKey, enabled: bool, fetch: F) -> Query<T>
  where
    T: Send + 'static,
    F: Fn(DecorClient) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    let client = self.clone();
    Query::new(move || {
      let request = fetch(client.clone());
      async move { request.await.map_err(|e| e.to_string()) }
    })
    .enabled(enabled)
    .keyed(key, &self.cache)
  }

  /// Build a mutation handle around an operation of this client.
  pub fn mutation<I, O, F, Fut>(&self, action: F) -> Mutation<I, O>
  where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(DecorClient, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, ApiError>> + Send + 'static,
  {
    let client = self.clone();
    Mutation::new(move |input| {
      let request = action(client.clone(), input);
      async move { request.await.map_err(|e| e.to_string()) }
    })
  }
}
