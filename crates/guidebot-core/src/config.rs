//! Configuration and settings management
//!
//! Loads layered settings (config files + environment) and defines
//! storage and retry constants shared by the transports.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default directory holding the JSON data files.
pub const DEFAULT_STORAGE_DIR: &str = "data";
/// File name of the guide catalog inside the storage directory.
pub const GUIDES_FILE: &str = "guides.json";
/// File name of the registered users roster inside the storage directory.
pub const USERS_FILE: &str = "users.json";
/// File name of the menu media record inside the storage directory.
pub const MENU_MEDIA_FILE: &str = "menu_media.json";

// Telegram API retry configuration
/// Initial backoff for retried Telegram API calls
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Upper bound for a single backoff delay
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4000;
/// Maximum retry attempts for a Telegram API call
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;

/// Maximum number of admin notifications in flight at once
pub const NOTIFY_MAX_CONCURRENCY: usize = 8;

/// Build the layered configuration source used by every settings struct.
///
/// Sources, later ones override earlier ones:
/// `config/default`, `config/{RUN_MODE}`, `config/local`,
/// `APP__`-prefixed environment and finally plain environment variables.
///
/// # Errors
///
/// Returns a `ConfigError` if a present source cannot be parsed.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Local overrides, never checked into git
        .add_source(File::with_name("config/local").required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        // Environment::default() maps UPPER_SNAKE_CASE to snake_case keys
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

/// Where the bot keeps its JSON files and which texts it uses for the catalog.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageSettings {
    /// Directory for `guides.json`, `users.json` and `menu_media.json`
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Override for the "no guides yet" notice
    pub no_guides_message: Option<String>,
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STORAGE_DIR)
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            no_guides_message: None,
        }
    }
}

impl StorageSettings {
    /// Load storage settings from the layered configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        build_config()?.try_deserialize()
    }

    /// Path of the guide catalog file
    #[must_use]
    pub fn guides_path(&self) -> PathBuf {
        self.storage_dir.join(GUIDES_FILE)
    }

    /// Path of the users roster file
    #[must_use]
    pub fn users_path(&self) -> PathBuf {
        self.storage_dir.join(USERS_FILE)
    }

    /// Path of the menu media file
    #[must_use]
    pub fn menu_media_path(&self) -> PathBuf {
        self.storage_dir.join(MENU_MEDIA_FILE)
    }
}

/// Parses a list of Telegram ids separated by commas, semicolons or whitespace.
///
/// Tokens that are not integers are skipped.
///
/// # Examples
///
/// ```
/// use guidebot_core::config::parse_id_list;
/// let ids = parse_id_list("1, 2;3 x");
/// assert_eq!(ids, vec![1, 2, 3]);
/// ```
#[must_use]
pub fn parse_id_list(raw: &str) -> Vec<i64> {
    raw.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .filter_map(|id| id.parse::<i64>().ok())
        .collect()
}
