use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use url::Url;

pub const JWT_SECRET_VAR: &str = "DECORHUB_JWT_SECRET";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  /// Custom title for the header (defaults to the API host)
  pub title: Option<String>,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub guard: GuardConfig,
  #[serde(default)]
  pub images: ImagesConfig,
  #[serde(default)]
  pub ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Seconds a cached response stays fresh
  pub stale_secs: u64,
  /// Keep the cache in SQLite under the data dir instead of in memory
  pub persist: bool,
  /// Serve stale data when the network fails
  pub offline_fallback: bool,
}

impl CacheConfig {
  /// `stale_secs` as a duration, rejecting values chrono cannot hold.
  pub fn stale_time(&self) -> Result<chrono::Duration> {
    i64::try_from(self.stale_secs)
      .ok()
      .and_then(chrono::Duration::try_seconds)
      .ok_or_else(|| eyre!("cache.stale_secs {} is out of range", self.stale_secs))
  }
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      stale_secs: 60,
      persist: false,
      offline_fallback: false,
    }
  }
}

/// Role numbers as issued in the session token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GuardRule {
  pub prefix: String,
  pub roles: Vec<u8>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
  /// Evaluated in order; the first matching prefix wins
  pub rules: Vec<GuardRule>,
  /// Paths outside these prefixes are never guarded
  pub matcher: Vec<String>,
  pub login_path: String,
  pub unauthorized_path: String,
}

impl Default for GuardConfig {
  fn default() -> Self {
    Self {
      rules: vec![
        GuardRule {
          prefix: "/admin".into(),
          roles: vec![1],
        },
        GuardRule {
          prefix: "/seller".into(),
          roles: vec![2, 3],
        },
      ],
      matcher: vec!["/admin".into(), "/seller".into()],
      login_path: "/authen/login".into(),
      unauthorized_path: "/unauthorized".into(),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImagesConfig {
  /// Remote hosts product images may be loaded from (case-insensitive)
  #[serde(default, deserialize_with = "deserialize_lowercase_set")]
  pub allowed_hosts: BTreeSet<String>,
}

fn deserialize_lowercase_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let v: Vec<String> = Vec::deserialize(deserializer)?;
  Ok(v.into_iter().map(|s| s.to_lowercase()).collect())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
  pub page_size: u32,
  pub skeleton_rows: usize,
}

impl Default for UiConfig {
  fn default() -> Self {
    Self {
      page_size: 10,
      skeleton_rows: 5,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./decorhub.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/decorhub/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/decorhub/config.yaml\n\
                 See decorhub.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("decorhub.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("decorhub").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    Url::parse(&config.api.base_url)
      .map_err(|e| eyre!("api.base_url {:?} is not a valid URL: {}", config.api.base_url, e))?;
    config.cache.stale_time()?;
    Ok(config)
  }

  /// Header title: the configured one or the API host.
  pub fn display_title(&self) -> String {
    if let Some(title) = &self.title {
      return title.clone();
    }
    Url::parse(&self.api.base_url)
      .ok()
      .and_then(|u| u.host_str().map(str::to_string))
      .unwrap_or_else(|| self.api.base_url.clone())
  }

  /// True when `url` is an http(s) URL on an allowed image host.
  pub fn is_image_host_allowed(&self, url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
      return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
      return false;
    }
    parsed
      .host_str()
      .map(|host| self.images.allowed_hosts.contains(&host.to_lowercase()))
      .unwrap_or(false)
  }

  /// Get the token verification secret from the environment.
  pub fn jwt_secret() -> Result<String> {
    std::env::var(JWT_SECRET_VAR)
      .map_err(|_| eyre!("Token secret not found. Set the {} environment variable.", JWT_SECRET_VAR))
  }
}

/// Directory for the session, logs and the persistent cache.
pub fn data_dir() -> Result<PathBuf> {
  let dir = dirs::data_dir()
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("decorhub");
  std::fs::create_dir_all(&dir)
    .map_err(|e| eyre!("Failed to create data directory {}: {}", dir.display(), e))?;
  Ok(dir)
}
