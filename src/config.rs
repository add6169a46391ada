use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::api::cache::DEFAULT_PAGE_SIZE;
use crate::cache::CacheConfig;

/// Base URL of the public catalog backend
pub const CATALOG_BASE_URL: &str = "https://dummyjson.com";
/// Where the bespoke service listens unless told otherwise
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:4000";

pub const MODE_ENV: &str = "ADMINQ_API_MODE";
pub const BASE_ENV: &str = "ADMINQ_API_BASE";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  pub cache: CacheSettings,
  /// Rows per page in list commands
  pub page_size: Option<u32>,
  /// Directory for log files (defaults to the platform data directory)
  pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
  /// Public read-mostly catalog with offset pagination
  #[default]
  #[serde(alias = "dummy")]
  Catalog,
  /// Bespoke service with page-based pagination
  #[serde(alias = "node")]
  Service,
}

impl FromStr for BackendMode {
  type Err = color_eyre::Report;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().as_str() {
      "catalog" | "dummy" => Ok(Self::Catalog),
      "service" | "node" => Ok(Self::Service),
      other => Err(eyre!(
        "Unknown API mode '{}' (expected catalog, dummy, service or node)",
        other
      )),
    }
  }
}

impl fmt::Display for BackendMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Catalog => f.write_str("catalog"),
      Self::Service => f.write_str("service"),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
  pub mode: BackendMode,
  /// Service base URL; ignored in catalog mode
  pub base_url: Option<String>,
}

impl ApiConfig {
  /// The URL requests go to. The catalog always lives at the same place.
  pub fn base_url(&self) -> &str {
    match self.mode {
      BackendMode::Catalog => CATALOG_BASE_URL,
      BackendMode::Service => self.base_url.as_deref().unwrap_or(DEFAULT_SERVICE_URL),
    }
  }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheSettings {
  pub stale_time_secs: u64,
  pub gc_time_secs: u64,
}

impl Default for CacheSettings {
  fn default() -> Self {
    Self {
      stale_time_secs: 60,
      gc_time_secs: 300,
    }
  }
}

impl CacheSettings {
  pub fn to_cache_config(&self) -> CacheConfig {
    CacheConfig {
      stale_time: seconds(self.stale_time_secs),
      gc_time: seconds(self.gc_time_secs),
    }
  }
}

fn seconds(secs: u64) -> chrono::Duration {
  let secs = i64::try_from(secs).unwrap_or(i64::MAX).min(i64::MAX / 1000);
  chrono::Duration::seconds(secs)
}

impl Config {
  /// Load configuration from file, then apply environment overrides.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./adminq.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/adminq/config.yaml
  ///
  /// Without any file the defaults are used.
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

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };

    config.apply_overrides(
      std::env::var(MODE_ENV).ok().as_deref(),
      std::env::var(BASE_ENV).ok().as_deref(),
    )?;

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("adminq.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("adminq").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  /// Apply `ADMINQ_API_MODE` / `ADMINQ_API_BASE` values over the file.
  pub fn apply_overrides(&mut self, mode: Option<&str>, base_url: Option<&str>) -> Result<()> {
    if let Some(mode) = mode.filter(|m| !m.trim().is_empty()) {
      self.api.mode = mode.parse()?;
    }
    if let Some(base_url) = base_url.map(str::trim).filter(|b| !b.is_empty()) {
      self.api.base_url = Some(base_url.to_string());
    }
    Ok(())
  }

  pub fn page_size(&self) -> u32 {
    self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1)
  }

  /// Directory for log files.
  pub fn log_dir(&self) -> PathBuf {
    self.log_dir.clone().unwrap_or_else(|| {
      dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("adminq")
    })
  }
}
