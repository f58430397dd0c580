//! The signed-in session, persisted between runs.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cache::CacheStorage;
use crate::config;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
  pub token: String,
  pub email: Option<String>,
  pub signed_in_at: DateTime<Utc>,
}

impl Session {
  pub fn new(token: String, email: Option<String>) -> Self {
    Self {
      token,
      email,
      signed_in_at: Utc::now(),
    }
  }
}

/// Reads and writes `session.json`.
pub struct SessionStore {
  path: PathBuf,
}

impl SessionStore {
  /// Store in the data directory.
  pub fn open() -> Result<Self> {
    Ok(Self::at(config::data_dir()?.join("session.json")))
  }

  pub fn at(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// The stored session; `None` when signed out or the file is unreadable.
  pub fn load(&self) -> Option<Session> {
    let contents = std::fs::read_to_string(&self.path).ok()?;
    match serde_json::from_str(&contents) {
      Ok(session) => Some(session),
      Err(e) => {
        debug!(path = %self.path.display(), error = %e, "ignoring unreadable session");
        None
      }
    }
  }

  pub fn save(&self, session: &Session) -> Result<()> {
    let json = serde_json::to_string_pretty(session)?;
    std::fs::write(&self.path, json)
      .map_err(|e| eyre!("Failed to write session {}: {}", self.path.display(), e))
  }

  /// Remove the stored session. Clearing a missing session succeeds.
  pub fn clear(&self) -> Result<()> {
    match std::fs::remove_file(&self.path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(eyre!("Failed to remove session {}: {}", self.path.display(), e)),
    }
  }

  /// Forget the session and drop the cached reads made under it.
  pub fn sign_out(&self, cache: Option<&dyn CacheStorage>) -> Result<()> {
    self.clear()?;
    if let Some(cache) = cache {
      cache.clear()?;
      debug!(storage = cache.name(), "cleared cache on sign out");
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_store(name: &str) -> SessionStore {
    let dir = std::env::temp_dir().join(format!("decorhub-session-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    SessionStore::at(dir.join("session.json"))
  }

  #[test]
  fn test_save_load_clear() {
    let store = temp_store("roundtrip");
    assert!(store.load().is_none());

    let session = Session::new("abc".into(), Some("a@b.c".into()));
    store.save(&session).unwrap();
    assert_eq!(store.load(), Some(session));

    store.clear().unwrap();
    assert!(store.load().is_none());
    store.clear().unwrap();
  }

  #[test]
  fn test_sign_out_drops_persisted_cache() {
    use crate::cache::{QueryKey, SqliteStorage};

    let store = temp_store("sign-out");
    store.save(&Session::new("abc".into(), None)).unwrap();
    let cache = SqliteStorage::in_memory().unwrap();
    cache.put(&QueryKey::new("cart"), &serde_json::json!({"items": [1]})).unwrap();

    store.sign_out(Some(&cache as &dyn CacheStorage)).unwrap();
    assert!(store.load().is_none());
    assert!(cache.get(&QueryKey::new("cart")).unwrap().is_none());
  }

  #[test]
  fn test_corrupt_file_is_signed_out() {
    let store = temp_store("corrupt");
    std::fs::write(store.path(), "{not json").unwrap();
    assert!(store.load().is_none());
  }
}
