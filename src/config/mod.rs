//! Configuration management for cytube-feeder.
//!
//! Tunables are read from `~/.config/cytube-feeder/config.toml`. If the file
//! doesn't exist, a default configuration with comments is created.
//!
//! Connection settings for the CyTube channel never live in the file; they
//! come from the environment (a `.env` file in the working directory is
//! honoured):
//!
//! - `CYTUBE_URL` - base URL of the CyTube instance
//! - `CYTUBE_URL_CHANNEL_NAME` - channel to queue into
//! - `CYTUBE_USERNAME` / `CYTUBE_PASSWORD` - account with queue rights

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use url::Url;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feeds: FeedsConfig,
    pub storage: StorageConfig,
    pub cytube: CytubeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    /// Feed URL with `{id}` standing in for the channel id
    pub url_template: String,
    /// Entries whose title contains this (any case) are ignored
    pub exclude_marker: String,
    /// Stripped from entry ids to get the id the queue understands
    pub content_id_prefix: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Concurrent feed fetches (1 = one at a time)
    pub workers: usize,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            url_template: "https://www.youtube.com/feeds/videos.xml?channel_id={id}".to_string(),
            exclude_marker: "#shorts".to_string(),
            content_id_prefix: "yt:video:".to_string(),
            timeout_secs: 10,
            workers: 1,
        }
    }
}

impl FeedsConfig {
    pub fn feed_url(&self, feed_id: &str) -> String {
        self.url_template.replace("{id}", feed_id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path (default: `<data dir>/cytube-feeder/content.db`)
    pub database: Option<PathBuf>,
    /// Channel list path (default: `channel-ids.txt` in the working directory)
    pub channel_list: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CytubeConfig {
    pub media_type: String,
    pub position: String,
    pub temporary: bool,
    /// How long to wait for each server reply, in seconds
    pub response_timeout_secs: u64,
}

impl Default for CytubeConfig {
    fn default() -> Self {
        Self {
            media_type: "yt".to_string(),
            position: "end".to_string(),
            temporary: true,
            response_timeout_secs: 15,
        }
    }
}

/// Where and as whom to connect. Taken from the environment only.
#[derive(Clone)]
pub struct CytubeCredentials {
    pub base_url: Url,
    pub channel: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for CytubeCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CytubeCredentials")
            .field("base_url", &self.base_url.as_str())
            .field("channel", &self.channel)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl CytubeCredentials {
    pub const URL_VAR: &'static str = "CYTUBE_URL";
    pub const CHANNEL_VAR: &'static str = "CYTUBE_URL_CHANNEL_NAME";
    pub const USERNAME_VAR: &'static str = "CYTUBE_USERNAME";
    pub const PASSWORD_VAR: &'static str = "CYTUBE_PASSWORD";

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingEnv(key))
        };

        let raw_url = get(Self::URL_VAR)?;
        let base_url = Url::parse(&raw_url).map_err(|e| ConfigError::InvalidUrl {
            value: raw_url.clone(),
            source: e,
        })?;

        Ok(Self {
            base_url,
            channel: get(Self::CHANNEL_VAR)?,
            username: get(Self::USERNAME_VAR)?,
            password: get(Self::PASSWORD_VAR)?,
        })
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.clone(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/cytube-feeder/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("cytube-feeder").join("config.toml"))
    }

    /// Database path, falling back to `<data dir>/cytube-feeder/content.db`.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.storage.database {
            return Ok(path.clone());
        }

        let data_dir = dirs::data_dir().ok_or(ConfigError::NoConfigDir)?;
        let app_dir = data_dir.join("cytube-feeder");
        fs::create_dir_all(&app_dir).map_err(|e| ConfigError::Io {
            path: app_dir.clone(),
            source: e,
        })?;
        Ok(app_dir.join("content.db"))
    }

    pub fn channel_list_path(&self) -> PathBuf {
        self.storage
            .channel_list
            .clone()
            .unwrap_or_else(|| PathBuf::from("channel-ids.txt"))
    }

    fn create_default_config(path: &PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> String {
        r##"# cytube-feeder configuration
#
# Connection details are NOT read from this file. Set CYTUBE_URL,
# CYTUBE_URL_CHANNEL_NAME, CYTUBE_USERNAME and CYTUBE_PASSWORD in the
# environment or in a .env file next to where you run the tool.

[feeds]
# {id} is replaced with each channel id from the channel list
url_template = "https://www.youtube.com/feeds/videos.xml?channel_id={id}"

# Videos whose title contains this marker (any case) are never queued
exclude_marker = "#shorts"

# Prefix removed from entry ids to get the video id
content_id_prefix = "yt:video:"

# Per-feed request timeout in seconds
timeout_secs = 10

# Feeds fetched at the same time
workers = 1

[storage]
# database = "/path/to/content.db"
# channel_list = "channel-ids.txt"

[cytube]
media_type = "yt"
position = "end"
temporary = true

# Seconds to wait for each reply from the server
response_timeout_secs = 15
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("Invalid URL {value}: {source}")]
    InvalidUrl {
        value: String,
        source: url::ParseError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert_eq!(config.feeds.exclude_marker, "#shorts");
        assert_eq!(config.feeds.workers, 1);
        assert_eq!(config.cytube.position, "end");
        assert!(config.cytube.temporary);
        assert!(config.storage.database.is_none());
    }

    #[test]
    fn test_partial_config() {
        let content = r#"
[feeds]
workers = 4
"#;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.feeds.workers, 4);
        assert_eq!(config.feeds.timeout_secs, 10);
        assert_eq!(config.cytube.media_type, "yt");
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.feeds.content_id_prefix, "yt:video:");
        assert_eq!(config.channel_list_path(), PathBuf::from("channel-ids.txt"));
    }

    #[test]
    fn test_feed_url_substitutes_id() {
        let feeds = FeedsConfig::default();
        assert_eq!(
            feeds.feed_url("UC123"),
            "https://www.youtube.com/feeds/videos.xml?channel_id=UC123"
        );
    }

    #[test]
    fn test_explicit_database_path_is_used() {
        let content = r#"
[storage]
database = "/tmp/feeder.db"
"#;
        let config: Config = toml::from_str(content).unwrap();
        assert_eq!(config.database_path().unwrap(), PathBuf::from("/tmp/feeder.db"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[feeds]\nexclude_marker = \"#live\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.feeds.exclude_marker, "#live");
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[feeds\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_credentials_from_lookup() {
        let vars = env(&[
            ("CYTUBE_URL", "https://cytu.be/"),
            ("CYTUBE_URL_CHANNEL_NAME", "movienight"),
            ("CYTUBE_USERNAME", "bot"),
            ("CYTUBE_PASSWORD", "hunter2"),
        ]);
        let creds = CytubeCredentials::from_lookup(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(creds.base_url.as_str(), "https://cytu.be/");
        assert_eq!(creds.channel, "movienight");
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }

    #[test]
    fn test_credentials_missing_var_is_named() {
        let vars = env(&[
            ("CYTUBE_URL", "https://cytu.be/"),
            ("CYTUBE_URL_CHANNEL_NAME", "movienight"),
            ("CYTUBE_USERNAME", "  "),
        ]);
        let err = CytubeCredentials::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv("CYTUBE_USERNAME")));
    }

    #[test]
    fn test_credentials_invalid_url() {
        let vars = env(&[
            ("CYTUBE_URL", "not a url"),
            ("CYTUBE_URL_CHANNEL_NAME", "c"),
            ("CYTUBE_USERNAME", "u"),
            ("CYTUBE_PASSWORD", "p"),
        ]);
        let err = CytubeCredentials::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }
}
