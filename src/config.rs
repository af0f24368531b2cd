//! Configuration loader and validator for the TechEndeavor client.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub api: Api,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    /// Directory holding the credential database.
    pub data_dir: String,
}

/// External blog API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Api {
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("techendeavor/{}", env!("CARGO_PKG_VERSION"))
}

impl App {
    /// Returns `data_dir` with a leading `~/` expanded to `$HOME`.
    pub fn resolved_data_dir(&self) -> String {
        match self.data_dir.strip_prefix("~/") {
            Some(rest) => match std::env::var("HOME") {
                Ok(home) => format!("{}/{}", home.trim_end_matches('/'), rest),
                Err(_) => self.data_dir.clone(),
            },
            None => self.data_dir.clone(),
        }
    }
}

impl Api {
    /// Parsed base URL, always ending in `/` so relative joins keep the path prefix.
    pub fn url(&self) -> Result<Url, ConfigError> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw)
            .map_err(|_| ConfigError::Invalid("api.base_url must be an absolute URL"))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Invalid("api.base_url must use http or https"));
        }
        Ok(url)
    }

    /// Key under which the credential is persisted: one credential per API origin.
    pub fn origin(&self) -> Result<String, ConfigError> {
        Ok(self.url()?.origin().ascii_serialization())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(self.app.resolved_data_dir())
    }

    /// SQLite URL for the credential store, honouring `DATABASE_URL` when set.
    pub fn database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| {
            format!("sqlite://{}/techendeavor.db", self.app.resolved_data_dir())
        })
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }
    if cfg.api.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("api.base_url must be non-empty"));
    }
    cfg.api.url()?;
    if cfg.api.timeout_seconds == 0 {
        return Err(ConfigError::Invalid("api.timeout_seconds must be > 0"));
    }
    if cfg.api.user_agent.trim().is_empty() {
        return Err(ConfigError::Invalid("api.user_agent must be non-empty"));
    }
    Ok(())
}

/// Returns the example YAML printed by `techendeavor example-config`.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"

api:
  base_url: "http://localhost:8000/"
  timeout_seconds: 30
  user_agent: "techendeavor/0.1"
"#
}
