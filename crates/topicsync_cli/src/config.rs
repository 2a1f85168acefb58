//! Configuration file support for topicsync.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Conventional variables: `DISCOURSE_URL`, `DISCOURSE_API_KEY`,
//!    `DISCOURSE_API_USERNAME`, `DISCOURSE_WEBHOOK_SECRET`
//! 3. Environment variables prefixed with `TOPICSYNC_`, nested with `__`
//!    (e.g., `TOPICSYNC_DATABASE__URL`, `TOPICSYNC_SERVER__SERVICE_TOKEN`)
//! 4. Config file (./topicsync.toml, then ~/.config/topicsync/config.toml)
//! 5. Built-in defaults
//!
//! The database URL defaults to `sqlite://~/.local/state/topicsync/topicsync.db`
//! on Linux (using the XDG state directory) if not explicitly configured.
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "postgres:///hamprep"
//!
//! [discourse]
//! url = "https://forum.openhamprep.com"
//! api_key = "..."          # or DISCOURSE_API_KEY
//! api_username = "system"
//! webhook_secret = "..."   # or DISCOURSE_WEBHOOK_SECRET
//! requests_per_second = 4
//!
//! [sync]
//! batch_size = 50
//! max_topic_pages = 100
//! technician_category = "Technician Questions"
//!
//! [server]
//! bind = "127.0.0.1:8787"
//! service_token = "..."
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use topicsync::forum::DISCOURSE_DEFAULT_RPS;
use topicsync::sync::{CategoryNames, MAX_TOPIC_PAGES, SyncConfig as EngineConfig};

const APP_NAME: &str = "topicsync";

/// Conventional environment variables and the keys they override.
const CONVENTIONAL_ENV: [(&str, &str); 4] = [
    ("DISCOURSE_URL", "discourse.url"),
    ("DISCOURSE_API_KEY", "discourse.api_key"),
    ("DISCOURSE_API_USERNAME", "discourse.api_username"),
    ("DISCOURSE_WEBHOOK_SECRET", "discourse.webhook_secret"),
];

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub discourse: DiscourseConfig,
    pub sync: SyncConfig,
    pub server: ServerConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL.
    /// Supports sqlite:// and postgres:// schemes.
    pub url: Option<String>,
}

/// Discourse connection.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DiscourseConfig {
    /// Forum base URL, e.g. `https://forum.example.com`.
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub api_username: String,
    /// Shared secret for webhook signatures.
    pub webhook_secret: Option<String>,
    pub requests_per_second: u32,
    /// Whether to disable proactive rate limiting.
    pub no_rate_limit: bool,
}

impl Default for DiscourseConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            api_username: "system".to_string(),
            webhook_secret: None,
            requests_per_second: DISCOURSE_DEFAULT_RPS,
            no_rate_limit: false,
        }
    }
}

/// Default sync options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Batch size when none is given on the command line.
    pub batch_size: Option<i64>,
    pub max_topic_pages: u32,
    pub technician_category: String,
    pub general_category: String,
    pub extra_category: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let names = CategoryNames::default();
        Self {
            batch_size: None,
            max_topic_pages: MAX_TOPIC_PAGES,
            technician_category: names.technician,
            general_category: names.general,
            extra_category: names.extra,
        }
    }
}

/// HTTP endpoint settings for `topicsync serve`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Bearer token required on `POST /sync`.
    pub service_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8787".to_string(),
            service_token: None,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Falls back to defaults (with a warning) if the sources cannot be read.
    pub fn load() -> Self {
        match Self::build(|key| std::env::var(key).ok()) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config: {}", e);
                Config::default()
            }
        }
    }

    fn build(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("topicsync.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./topicsync.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("TOPICSYNC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        for (var, key) in CONVENTIONAL_ENV {
            builder = builder.set_override_option(key, env(var).filter(|v| !v.is_empty()))?;
        }

        builder.build()?.try_deserialize()
    }

    /// Get the database URL, falling back to the default state directory path.
    ///
    /// The `mode=rwc` parameter creates the SQLite file if it doesn't exist.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("topicsync.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    /// Engine configuration derived from the `[sync]` section.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_topic_pages: self.sync.max_topic_pages,
            categories: CategoryNames {
                technician: self.sync.technician_category.clone(),
                general: self.sync.general_category.clone(),
                extra: self.sync.extra_category.clone(),
            },
            ..EngineConfig::default()
        }
    }

    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the default state directory path.
    ///
    /// On Linux, this is `$XDG_STATE_HOME/topicsync` or `~/.local/state/topicsync`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| {
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}
