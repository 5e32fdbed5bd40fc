//! Layered configuration: defaults, then an optional TOML file, then
//! `SCRY_`-prefixed environment variables.
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `SCRY_SRS__MAX_EASE=3.0` sets `srs.max_ease`.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use scry_core::params::{Params, ParamsConfig};
use serde::Deserialize;

/// Top-level configuration for the `scry` binary.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  /// SQLite database file. A leading `~/` expands to `$HOME`.
  pub store_path: PathBuf,
  /// Scheduling parameter overrides.
  pub srs:        ParamsConfig,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("~/.local/share/scry/scry.db"),
      srs:        ParamsConfig::default(),
    }
  }
}

impl AppConfig {
  /// Load from `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("SCRY")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .context("failed to read config")?
      .try_deserialize()
      .context("failed to deserialise AppConfig")
  }

  /// Validated scheduling parameters.
  pub fn params(&self) -> anyhow::Result<Params> {
    Params::from_config(&self.srs).context("invalid [srs] parameters")
  }

  /// The store path with `~` expanded.
  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
