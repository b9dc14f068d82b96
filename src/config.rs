//! Settings file (`config.ron`) plus command-line overrides

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::{DEFAULT_BASE_URL, DEFAULT_ERROR_DISMISS_MS};

const CONFIG_FILE: &str = "config.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dashboard backend, without trailing `/api`
    pub base_url: String,
    /// How long a failed modal stays up before closing itself
    pub error_dismiss_ms: u64,
    /// Periodic refresh of stats and catalog; off when unset
    pub refresh_interval_secs: Option<u64>,
    pub request_timeout_secs: u64,
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            error_dismiss_ms: DEFAULT_ERROR_DISMISS_MS,
            refresh_interval_secs: None,
            request_timeout_secs: 10,
            log_dir: None,
        }
    }
}

/// Values given on the command line win over the file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub error_dismiss_ms: Option<u64>,
    pub refresh_interval_secs: Option<u64>,
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs_next::config_dir().map(|dir| dir.join("pokedash").join(CONFIG_FILE))
    }

    /// Load `path`, or the default location when `None`.
    ///
    /// A missing default file means defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };
        match std::fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text).map_err(|source| ConfigError::Parse { path, source }),
            Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    pub fn parse(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::de::from_str(text)
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(base_url) = overrides.base_url {
            self.base_url = base_url;
        }
        if let Some(ms) = overrides.error_dismiss_ms {
            self.error_dismiss_ms = ms;
        }
        if let Some(secs) = overrides.refresh_interval_secs {
            // 0 on the command line turns a configured refresh off
            self.refresh_interval_secs = (secs > 0).then_some(secs);
        }
        if overrides.log_dir.is_some() {
            self.log_dir = overrides.log_dir;
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
