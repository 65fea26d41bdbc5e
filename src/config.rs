// Client configuration and the single writer that persists it.
//
// The file is plain JSON so it stays compatible with configs written by
// older clients (`api_url`, `time_out` keys). Unknown keys such as display
// options are preserved on rewrite.

use crate::error::ClientError;
use crate::types::TrainType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_SERVER: &str = "http://localhost:8000";
pub const DEFAULT_API_PREFIX: &str = "/api/v1/training/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MODEL_REFRESH_SECS: u64 = 300;
/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV: &str = "DISTIA_CONFIG";

/// How the client picks a server out of `servers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// Ping each server in order and use the first that answers.
    #[default]
    Probe,
    /// Use `servers[index]` without any liveness check.
    Fixed { index: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_servers")]
    pub servers: Vec<String>,
    #[serde(rename = "api_url", alias = "api_path_prefix", default = "default_api_prefix")]
    pub api_path_prefix: String,
    #[serde(rename = "time_out", default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub resolution: ResolutionStrategy,
    #[serde(default = "default_tasks")]
    pub tasks: Vec<TrainType>,
    #[serde(default = "default_model_refresh")]
    pub model_refresh_secs: u64,
    /// Anything else in the file (titles, layout, table paths...).
    #[serde(flatten)]
    pub display: Map<String, Value>,
}

fn default_servers() -> Vec<String> {
    vec![DEFAULT_SERVER.to_string()]
}

fn default_api_prefix() -> String {
    DEFAULT_API_PREFIX.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_tasks() -> Vec<TrainType> {
    vec![TrainType::Classification, TrainType::Regression]
}

fn default_model_refresh() -> u64 {
    DEFAULT_MODEL_REFRESH_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            token: None,
            servers: default_servers(),
            api_path_prefix: default_api_prefix(),
            timeout_seconds: default_timeout(),
            resolution: ResolutionStrategy::default(),
            tasks: default_tasks(),
            model_refresh_secs: default_model_refresh(),
            display: Map::new(),
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn model_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.model_refresh_secs.max(1))
    }

    /// The API prefix with exactly one leading and one trailing slash, ready
    /// to sit between a base URL and an endpoint path.
    pub fn api_prefix(&self) -> String {
        let trimmed = self.api_path_prefix.trim_matches('/');
        if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{trimmed}/")
        }
    }

    /// Look up a free-form display option, e.g. a window title.
    pub fn display_option(&self, key: &str) -> Option<&str> {
        self.display.get(key).and_then(Value::as_str)
    }

    fn validate(&self, path: &Path) -> Result<(), ClientError> {
        if self.timeout_seconds == 0 {
            return Err(ClientError::Config {
                path: path.to_path_buf(),
                reason: "time_out must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

/// Owner of the configuration file. All writes go through `save`, which
/// holds a lock for the whole write and swaps the file in with a rename so
/// readers never see a half-written document.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ConfigStore {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// `$DISTIA_CONFIG`, or `<config dir>/distia/config.json`.
    pub fn default_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        let dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        dir.join("distia").join("config.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the configuration, or return the defaults when the file does not
    /// exist yet. A malformed file is an error, never silently replaced.
    pub fn load(&self) -> Result<ClientConfig, ClientError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no config file, using defaults");
            return Ok(ClientConfig::default());
        }
        let raw = fs::read_to_string(&self.path)?;
        let cfg: ClientConfig = serde_json::from_str(&raw).map_err(|source| ClientError::ConfigParse {
            path: self.path.clone(),
            source,
        })?;
        cfg.validate(&self.path)?;
        Ok(cfg)
    }

    pub fn save(&self, cfg: &ClientConfig) -> Result<(), ClientError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let body = serde_json::to_string_pretty(cfg).map_err(|source| ClientError::ConfigParse {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.tmp_path();
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(body.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "config saved");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "config.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
