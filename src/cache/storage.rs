//! Cache storage backends: in-memory and SQLite.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::key::QueryKey;
use super::traits::{CacheEntry, CacheStorage};

/// Process-local storage; the default backend.
#[derive(Default)]
pub struct MemoryStorage {
  entries: Mutex<HashMap<QueryKey, CacheEntry>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<QueryKey, CacheEntry>>> {
    self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

impl CacheStorage for MemoryStorage {
  fn name(&self) -> &'static str {
    "memory"
  }

  fn get(&self, key: &QueryKey) -> Result<Option<CacheEntry>> {
    Ok(self.lock()?.get(key).cloned())
  }

  fn put(&self, key: &QueryKey, data: &Value) -> Result<()> {
    self.lock()?.insert(
      key.clone(),
      CacheEntry {
        data: data.clone(),
        cached_at: Utc::now(),
        invalidated: false,
      },
    );
    Ok(())
  }

  fn invalidate(&self, prefix: &QueryKey) -> Result<usize> {
    let mut entries = self.lock()?;
    let mut marked = 0;
    for (key, entry) in entries.iter_mut() {
      if key.starts_with(prefix) {
        entry.invalidated = true;
        marked += 1;
      }
    }
    Ok(marked)
  }

  fn clear(&self) -> Result<()> {
    self.lock()?.clear();
    Ok(())
  }
}

/// SQLite-based storage, so cached pages survive restarts.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

/// Schema for the query cache table.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS query_cache (
    query_hash TEXT PRIMARY KEY,
    tag TEXT NOT NULL,
    query_key TEXT NOT NULL,
    data BLOB NOT NULL,
    cached_at TEXT NOT NULL,
    invalidated INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_query_cache_tag ON query_cache(tag);
"#;

impl SqliteStorage {
  /// Open the cache database at the default location.
  pub fn open() -> Result<Self> {
    Self::open_at(&Self::default_path()?)
  }

  /// Open (or create) the cache database at `path`.
  pub fn open_at(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;
    Self::with_connection(conn)
  }

  /// Cache held in memory by SQLite; used by tests.
  pub fn in_memory() -> Result<Self> {
    let conn =
      Connection::open_in_memory().map_err(|e| eyre!("Failed to open in-memory cache: {}", e))?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn default_path() -> Result<PathBuf> {
    Ok(crate::config::data_dir()?.join("cache.db"))
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

impl CacheStorage for SqliteStorage {
  fn name(&self) -> &'static str {
    "sqlite"
  }

  fn get(&self, key: &QueryKey) -> Result<Option<CacheEntry>> {
    let conn = self.lock()?;
    let row: Option<(Vec<u8>, String, bool)> = conn
      .query_row(
        "SELECT data, cached_at, invalidated FROM query_cache WHERE query_hash = ?",
        params![key.cache_hash()],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read cache entry {}: {}", key, e))?;

    match row {
      Some((data, cached_at, invalidated)) => {
        let data: Value = serde_json::from_slice(&data)
          .map_err(|e| eyre!("Failed to deserialize cache entry {}: {}", key, e))?;
        Ok(Some(CacheEntry {
          data,
          cached_at: parse_datetime(&cached_at)?,
          invalidated,
        }))
      }
      None => Ok(None),
    }
  }

  fn put(&self, key: &QueryKey, data: &Value) -> Result<()> {
    let conn = self.lock()?;
    let bytes = serde_json::to_vec(data).map_err(|e| eyre!("Failed to serialize entry: {}", e))?;
    let query_key =
      serde_json::to_string(key).map_err(|e| eyre!("Failed to serialize key: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO query_cache (query_hash, tag, query_key, data, cached_at, invalidated)
         VALUES (?, ?, ?, ?, ?, 0)",
        params![
          key.cache_hash(),
          key.tag(),
          query_key,
          bytes,
          Utc::now().to_rfc3339()
        ],
      )
      .map_err(|e| eyre!("Failed to store cache entry {}: {}", key, e))?;

    Ok(())
  }

  fn invalidate(&self, prefix: &QueryKey) -> Result<usize> {
    let conn = self.lock()?;

    // Prefix matching happens on the decoded key; the tag narrows the scan.
    let candidates: Vec<(String, String)> = {
      let mut stmt = conn
        .prepare("SELECT query_hash, query_key FROM query_cache WHERE tag = ?")
        .map_err(|e| eyre!("Failed to prepare invalidation scan: {}", e))?;
      let rows = stmt
        .query_map(params![prefix.tag()], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(|e| eyre!("Failed to scan cache keys: {}", e))?;
      rows.filter_map(|r| r.ok()).collect()
    };

    let mut marked = 0;
    for (hash, raw_key) in candidates {
      let Ok(value) = serde_json::from_str::<Value>(&raw_key) else {
        continue;
      };
      if !key_from_value(value).starts_with(prefix) {
        continue;
      }
      conn
        .execute(
          "UPDATE query_cache SET invalidated = 1 WHERE query_hash = ?",
          params![hash],
        )
        .map_err(|e| eyre!("Failed to invalidate cache entry: {}", e))?;
      marked += 1;
    }

    Ok(marked)
  }

  fn clear(&self) -> Result<()> {
    self
      .lock()?
      .execute("DELETE FROM query_cache", [])
      .map_err(|e| eyre!("Failed to clear cache: {}", e))?;
    Ok(())
  }
}

/// Rebuild a key from its stored JSON array form.
fn key_from_value(value: Value) -> QueryKey {
  let mut parts = match value {
    Value::Array(parts) => parts.into_iter(),
    other => vec![other].into_iter(),
  };
  let tag = match parts.next() {
    Some(Value::String(tag)) => tag,
    _ => String::new(),
  };
  parts.fold(QueryKey::new(&tag), |key, part| key.with(part))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}
