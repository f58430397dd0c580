//! Async query and mutation handles for views.
//!
//! Inspired by TanStack Query: a `Query<T>` owns a fetcher closure and the
//! loading/success/error state derived from it; a `Mutation<I, O>` does the
//! same for writes. Results travel back over a channel and are picked up by
//! `poll()` on each UI tick.
//!
//! # Example
//!
//! ```ignore
//! let mut query = order::order_list_query(&client, PageParams::default());
//! query.fetch();
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//!
//! match query.state() {
//!     QueryState::Loading => render_skeleton(),
//!     QueryState::Success(orders) => render_orders(orders),
//!     QueryState::Error(e) => render_error(e),
//!     QueryState::Idle => {}
//! }
//! ```

use futures::future::BoxFuture;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use crate::cache::{CacheLayer, QueryKey};

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started, or is disabled
  Idle,
  /// Query is currently fetching data
  Loading,
  /// Query completed successfully
  Success(T),
  /// Query failed with an error
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_success(&self) -> bool {
    matches!(self, QueryState::Success(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

/// A factory function that creates futures for fetching data
type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T, String>> + Send + Sync>;

/// Async query for data fetching with state management.
///
/// Query<T> encapsulates:
/// - The fetching logic (via a closure)
/// - Loading/success/error states
/// - Whether it may fetch at all (`enabled`)
/// - A subscription to cache invalidations for its key
pub struct Query<T> {
  state: QueryState<T>,
  fetcher: FetcherFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, String>>>,
  fetched_at: Option<Instant>,
  enabled: bool,
  key: Option<QueryKey>,
  invalidations: Option<broadcast::Receiver<QueryKey>>,
  /// Set by a matching invalidation while no refetch could start
  needs_refetch: bool,
}

impl<T: Send + 'static> Query<T> {
  /// Create a new query with the given fetcher function.
  ///
  /// The fetcher is called each time `fetch()` or `refetch()` starts a
  /// request.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      fetcher: Box::new(move || Box::pin(fetcher())),
      receiver: None,
      fetched_at: None,
      enabled: true,
      key: None,
      invalidations: None,
      needs_refetch: false,
    }
  }

  /// Only allow fetching when `enabled` is true.
  ///
  /// A disabled query never calls its fetcher and stays `Idle`.
  pub fn enabled(mut self, enabled: bool) -> Self {
    self.enabled = enabled;
    self
  }

  /// Attach the cache key this query reads, subscribing to invalidations.
  pub fn keyed(mut self, key: QueryKey, cache: &CacheLayer) -> Self {
    self.key = Some(key);
    self.invalidations = Some(cache.subscribe());
    self
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  pub fn key(&self) -> Option<&QueryKey> {
    self.key.as_ref()
  }

  pub fn is_enabled(&self) -> bool {
    self.enabled
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  pub fn is_success(&self) -> bool {
    self.state.is_success()
  }

  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  pub fn error(&self) -> Option<&str> {
    self.state.error()
  }

  /// Time since the last successful fetch.
  pub fn age(&self) -> Option<Duration> {
    self.fetched_at.map(|t| t.elapsed())
  }

  /// Start fetching data if enabled and not already loading.
  pub fn fetch(&mut self) {
    if !self.enabled || self.state.is_loading() {
      return;
    }
    self.start_fetch();
  }

  /// Force a refetch, discarding any pending result.
  pub fn refetch(&mut self) {
    if !self.enabled {
      return;
    }
    self.receiver = None;
    self.start_fetch();
  }

  /// Poll for results from a pending fetch and for invalidations.
  ///
  /// Returns `true` if the state changed (data arrived, error occurred, or
  /// an invalidation started a refetch). Call this in the event loop tick.
  pub fn poll(&mut self) -> bool {
    let mut changed = self.poll_result();
    if self.take_invalidation() {
      self.needs_refetch = true;
    }
    if self.needs_refetch && self.enabled && !self.state.is_loading() {
      debug!(key = ?self.key.as_ref().map(|k| k.description()), "refetching invalidated query");
      self.needs_refetch = false;
      self.start_fetch();
      changed = true;
    }
    changed
  }

  fn poll_result(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(Ok(data)) => {
        self.state = QueryState::Success(data);
        self.fetched_at = Some(Instant::now());
        self.receiver = None;
        true
      }
      Ok(Err(error)) => {
        self.state = QueryState::Error(error);
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.state = QueryState::Error("Query was cancelled".to_string());
        self.receiver = None;
        true
      }
    }
  }

  /// Drain invalidation signals; true if any covers this query's key.
  fn take_invalidation(&mut self) -> bool {
    let (Some(rx), Some(key)) = (&mut self.invalidations, &self.key) else {
      return false;
    };
    let mut hit = false;
    loop {
      match rx.try_recv() {
        Ok(prefix) => hit |= key.starts_with(&prefix),
        Err(broadcast::error::TryRecvError::Lagged(_)) => hit = true,
        Err(_) => break,
      }
    }
    hit
  }

  fn start_fetch(&mut self) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = QueryState::Loading;

    let future = (self.fetcher)();
    tokio::spawn(async move {
      let result = future.await;
      // Receiver may have been dropped by a refetch
      let _ = tx.send(result);
    });
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("enabled", &self.enabled)
      .field("key", &self.key)
      .field("fetched_at", &self.fetched_at)
      .finish_non_exhaustive()
  }
}

/// The state of a mutation
#[derive(Debug, Clone)]
pub enum MutationState<O> {
  Idle,
  Pending,
  Success(O),
  Error(String),
}

type ActionFn<I, O> = Box<dyn Fn(I) -> BoxFuture<'static, Result<O, String>> + Send + Sync>;

/// Handle for a write operation.
///
/// `mutate` runs the action in the background; `poll` collects the outcome.
/// Validation and cache invalidation live in the action itself (see
/// `DecorClient::mutate`).
pub struct Mutation<I, O> {
  state: MutationState<O>,
  action: ActionFn<I, O>,
  receiver: Option<mpsc::UnboundedReceiver<Result<O, String>>>,
}

impl<I: Send + 'static, O: Send + 'static> Mutation<I, O> {
  pub fn new<F, Fut>(action: F) -> Self
  where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, String>> + Send + 'static,
  {
    Self {
      state: MutationState::Idle,
      action: Box::new(move |input| Box::pin(action(input))),
      receiver: None,
    }
  }

  pub fn state(&self) -> &MutationState<O> {
    &self.state
  }

  pub fn is_pending(&self) -> bool {
    matches!(self.state, MutationState::Pending)
  }

  /// Start the mutation. A second call while pending supersedes the first
  /// result.
  pub fn mutate(&mut self, input: I) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = MutationState::Pending;

    let future = (self.action)(input);
    tokio::spawn(async move {
      let _ = tx.send(future.await);
    });
  }

  /// Collect the outcome. Returns the finished state once, when it changes.
  pub fn poll(&mut self) -> Option<&MutationState<O>> {
    let rx = self.receiver.as_mut()?;
    let next = match rx.try_recv() {
      Ok(Ok(output)) => MutationState::Success(output),
      Ok(Err(error)) => MutationState::Error(error),
      Err(mpsc::error::TryRecvError::Empty) => return None,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        MutationState::Error("Mutation was cancelled".to_string())
      }
    };
    self.receiver = None;
    self.state = next;
    Some(&self.state)
  }

  pub fn reset(&mut self) {
    self.receiver = None;
    self.state = MutationState::Idle;
  }
}
