//! Startup configuration, read once from a TOML file.
//!
//! ```toml
//! [login]
//! username = "bot"
//! password = "hunter2"      # or RELAYBOT_PASSWORD
//!
//! [sentry]
//! dir = "sentry"
//!
//! [server]
//! url = "ws://127.0.0.1:27020"
//!
//! [watch]
//! activity = 570            # leave out to watch nothing
//! name = "Dota 2"
//! ```
//!
//! Every section except `[login]` may be left out.

use std::fs;
use std::path::{Path, PathBuf};

use relaybot::presence::WatchedActivity;
use relaybot::protocol::ActivityId;
use serde::Deserialize;

/// Why the configuration could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing required setting {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub login: LoginConfig,
    #[serde(default)]
    pub sentry: SentryConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LoginConfig {
    pub username: String,
    pub password: String,
}

/// Where trust tokens are kept.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SentryConfig {
    pub dir: PathBuf,
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("sentry"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:27020".to_string(),
        }
    }
}

/// The activity to report on. Without the section the default activity
/// is watched; a section without `activity` watches nothing.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    #[serde(default)]
    pub activity: Option<u64>,
    #[serde(default)]
    pub name: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        let watched = WatchedActivity::default();
        Self {
            activity: watched.activity.map(|id| id.0),
            name: watched.label,
        }
    }
}

impl WatchConfig {
    pub fn to_watched(&self) -> WatchedActivity {
        match self.activity {
            Some(id) => WatchedActivity::new(ActivityId(id), self.name.clone()),
            None => WatchedActivity::none(),
        }
    }
}

impl Config {
    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    /// [`ConfigError::Read`] if the file can't be read,
    /// [`ConfigError::Parse`] if it isn't valid configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Applies command-line overrides. `None` keeps the file's value.
    pub fn override_with(
        &mut self,
        username: Option<String>,
        password: Option<String>,
        server: Option<String>,
    ) {
        if let Some(username) = username {
            self.login.username = username;
        }
        if let Some(password) = password {
            self.login.password = password;
        }
        if let Some(url) = server {
            self.server.url = url;
        }
    }

    /// Checks that the settings needed to log on are present.
    ///
    /// # Errors
    /// [`ConfigError::Missing`] naming the first empty required setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.login.username.trim().is_empty() {
            return Err(ConfigError::Missing("login.username"));
        }
        if self.login.password.is_empty() {
            return Err(ConfigError::Missing("login.password"));
        }
        if self.server.url.trim().is_empty() {
            return Err(ConfigError::Missing("server.url"));
        }
        Ok(())
    }
}
