//! Global progress indicator for in-flight requests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Receives start/done signals around every request.
pub trait ProgressSink: Send + Sync {
  fn start(&self);
  fn done(&self);
}

/// Counts in-flight requests; the UI shows a spinner while it is non-zero.
#[derive(Debug, Default)]
pub struct ActivityIndicator {
  active: AtomicUsize,
}

impl ActivityIndicator {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn active(&self) -> usize {
    self.active.load(Ordering::SeqCst)
  }

  pub fn is_busy(&self) -> bool {
    self.active() > 0
  }
}

impl ProgressSink for ActivityIndicator {
  fn start(&self) {
    self.active.fetch_add(1, Ordering::SeqCst);
  }

  fn done(&self) {
    let _ = self
      .active
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)));
  }
}

/// Sink that ignores all signals.
pub struct NoProgress;

impl ProgressSink for NoProgress {
  fn start(&self) {}
  fn done(&self) {}
}

/// Signals `start` on creation and `done` when dropped, so the indicator is
/// released on success, error, early return and cancellation alike.
pub struct ProgressGuard {
  sink: Arc<dyn ProgressSink>,
}

impl ProgressGuard {
  pub fn begin(sink: Arc<dyn ProgressSink>) -> Self {
    sink.start();
    Self { sink }
  }
}

impl Drop for ProgressGuard {
  fn drop(&mut self) {
    self.sink.done();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_guard_brackets_activity() {
    let indicator = Arc::new(ActivityIndicator::new());
    {
      let _a = ProgressGuard::begin(indicator.clone());
      let _b = ProgressGuard::begin(indicator.clone());
      assert_eq!(indicator.active(), 2);
    }
    assert!(!indicator.is_busy());
  }

  #[test]
  fn test_done_never_underflows() {
    let indicator = ActivityIndicator::new();
    indicator.done();
    assert_eq!(indicator.active(), 0);
  }

  #[tokio::test]
  async fn test_guard_released_when_future_is_dropped() {
    let indicator = Arc::new(ActivityIndicator::new());
    let sink: Arc<dyn ProgressSink> = indicator.clone();
    let pending = tokio::spawn(async move {
      let _guard = ProgressGuard::begin(sink);
      std::future::pending::<()>().await;
    });
    tokio::task::yield_now().await;
    assert!(indicator.is_busy());

    pending.abort();
    let _ = pending.await;
    assert!(!indicator.is_busy());
  }
}
