use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_VERSION: u64 = 1;

/// Every endpoint lives under this versioned prefix.
pub const API_PREFIX: &str = "/api/v1";

const DEFAULT_LOCAL_ORIGIN: &str = "http://localhost:3000";

/// Which backend the client talks to. The default is fixed at build time by
/// the `production` cargo feature; a config file can still pin either one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn current() -> Self {
        if cfg!(feature = "production") {
            Self::Production
        } else {
            Self::Local
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::current()
    }
}

/// Where the password-reset token goes on the wire. Deployed backends
/// disagree, so this is configuration rather than a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetTokenPlacement {
    /// `POST /reset-password?token=<token>`
    #[default]
    Query,
    /// `POST /reset-password/<token>`
    Path,
    /// `POST /reset-password` with `token` in the JSON body
    Body,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Unsupported config version {0}")]
    Version(u64),
}

fn default_local_url() -> String {
    option_env!("TASKBOARD_API_URL_LOCAL")
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}{}", DEFAULT_LOCAL_ORIGIN, API_PREFIX))
}

// Without a deployed URL baked in at build time, production falls back to local.
fn default_production_url() -> String {
    option_env!("TASKBOARD_API_URL_PROD")
        .map(str::to_string)
        .unwrap_or_else(default_local_url)
}

fn default_version() -> u64 {
    CONFIG_VERSION
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct TaskboardConfig {
    #[serde(default = "default_version")]
    pub version: u64,
    pub environment: Environment,
    pub local_api_url: String,
    pub production_api_url: String,
    pub reset_token_placement: ResetTokenPlacement,
    pub debug_logging: bool,
}

impl Default for TaskboardConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            environment: Environment::current(),
            local_api_url: default_local_url(),
            production_api_url: default_production_url(),
            reset_token_placement: ResetTokenPlacement::default(),
            debug_logging: false,
        }
    }
}

impl TaskboardConfig {
    /// Config pointing at an arbitrary API root, e.g. a mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let url = base_url.into();
        Self {
            environment: Environment::Local,
            local_api_url: url.clone(),
            production_api_url: url,
            ..Self::default()
        }
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("taskboard")
            .join("config.json")
    }

    /// API root for the selected environment, without a trailing slash.
    pub fn base_url(&self) -> &str {
        let url = match self.environment {
            Environment::Local => &self.local_api_url,
            Environment::Production => &self.production_api_url,
        };
        url.trim_end_matches('/')
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::Version(config.version));
        }
        Ok(config)
    }

    /// Load from the default location, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load_or_default() -> Self {
        let path = Self::default_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        let text = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, text).map_err(io_err)
    }
}
