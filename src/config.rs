use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::constants;

/// User preferences persisted in `prefs.toml`.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Config {
  pub theme_name: Option<String>,
  pub poll_interval_secs: Option<u64>,
  pub api_base_url: Option<String>,
  pub discard_stale_responses: Option<bool>,
}

fn project_dirs() -> Option<ProjectDirs> {
  ProjectDirs::from("", "", "dzr")
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = project_dirs() {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(config_file)
        && let Ok(config) = toml::from_str(&content)
      {
        return config;
      }
    }
    Self::default()
  }

  pub fn save(&self) {
    if let Some(proj_dirs) = project_dirs() {
      let config_dir = proj_dirs.config_dir();
      if std::fs::create_dir_all(config_dir).is_ok() {
        let config_file = config_dir.join("prefs.toml");
        if let Ok(content) = toml::to_string(self) {
          let _ = std::fs::write(config_file, content);
        }
      }
    }
  }
}

/// Effective runtime settings: CLI overrides, then `prefs.toml`, then embedded constants.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
  pub api_base_url: String,
  pub poll_interval: Duration,
  pub popular_limit: usize,
  pub discard_stale_responses: bool,
  pub profile_path: PathBuf,
}

/// Values supplied on the command line. `None` means "not given".
#[derive(Debug, Default, Clone)]
pub struct Overrides {
  pub data_dir: Option<PathBuf>,
  pub poll_interval_secs: Option<u64>,
  pub api_base_url: Option<String>,
}

impl Settings {
  pub fn resolve(config: &Config, overrides: &Overrides) -> Self {
    let c = constants();
    let api_base_url = overrides
      .api_base_url
      .clone()
      .or_else(|| config.api_base_url.clone())
      .unwrap_or_else(|| c.api_base_url.clone());
    // A zero interval would spin the poller.
    let poll_secs =
      overrides.poll_interval_secs.or(config.poll_interval_secs).filter(|s| *s > 0).unwrap_or(c.poll_interval_secs);
    let data_dir = overrides.data_dir.clone().unwrap_or_else(default_data_dir);

    Self {
      api_base_url: api_base_url.trim_end_matches('/').to_string(),
      poll_interval: Duration::from_secs(poll_secs),
      popular_limit: c.popular_limit,
      discard_stale_responses: config.discard_stale_responses.unwrap_or(false),
      profile_path: data_dir.join(&c.profile_file),
    }
  }
}

/// Platform data directory, falling back to the working directory when no home is known.
pub fn default_data_dir() -> PathBuf {
  project_dirs().map(|d| d.data_dir().to_path_buf()).unwrap_or_else(|| PathBuf::from("."))
}

/// Directory for rolling log files.
pub fn log_dir() -> PathBuf {
  project_dirs().map(|d| d.data_local_dir().join("logs")).unwrap_or_else(|| PathBuf::from("logs"))
}
