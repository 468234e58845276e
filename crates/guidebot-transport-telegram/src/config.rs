//! Telegram transport settings.

use config::ConfigError;
use guidebot_core::config::{parse_id_list, StorageSettings};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Telegram transport settings loaded from environment variables.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TelegramSettings {
    /// Telegram Bot API token.
    pub telegram_token: String,
    /// Comma-separated list of admin user IDs.
    #[serde(rename = "admin_ids")]
    pub admin_ids_str: Option<String>,
    /// Channel users must join before receiving guides, e.g. `@channel`.
    pub subscription_channel: Option<String>,
    /// First-time subscription prompt (HTML).
    pub subscription_prompt: Option<String>,
    /// Reminder for users who are still not subscribed (HTML).
    pub subscription_reminder: Option<String>,
    /// Label of the "check again" button.
    pub subscription_button: Option<String>,
    /// Channel inspected by `/check_channel`; defaults to the subscription channel.
    pub audit_channel: Option<String>,
}

/// Combined settings used by the Telegram transport layer.
#[derive(Clone)]
pub struct BotSettings {
    /// Storage settings shared with the core.
    pub storage: Arc<StorageSettings>,
    /// Telegram-specific settings.
    pub telegram: Arc<TelegramSettings>,
}

impl BotSettings {
    /// Create a new combined settings bundle.
    #[must_use]
    pub fn new(storage: StorageSettings, telegram: TelegramSettings) -> Self {
        Self {
            storage: Arc::new(storage),
            telegram: Arc::new(telegram),
        }
    }
}

/// Resolved subscription gate configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSettings {
    /// Channel as `@username`
    pub channel: String,
    /// Prompt shown when access is first denied
    pub prompt: String,
    /// Prompt shown on repeated denials
    pub reminder: String,
    /// Button label
    pub button: String,
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Normalizes `channel`, `@channel` and `https://t.me/channel` to `@channel`.
///
/// # Examples
///
/// ```
/// use guidebot_transport_telegram::config::normalize_channel;
/// assert_eq!(normalize_channel("https://t.me/guides"), "@guides");
/// assert_eq!(normalize_channel("@guides"), "@guides");
/// ```
#[must_use]
pub fn normalize_channel(raw: &str) -> String {
    let trimmed = raw.trim();
    let name = trimmed
        .strip_prefix("https://t.me/")
        .or_else(|| trimmed.strip_prefix("http://t.me/"))
        .or_else(|| trimmed.strip_prefix("t.me/"))
        .unwrap_or(trimmed)
        .trim_start_matches('@')
        .trim_end_matches('/');
    format!("@{name}")
}

impl TelegramSettings {
    /// Create new settings by loading from environment and files.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        guidebot_core::config::build_config()?.try_deserialize()
    }

    /// Returns the admin user IDs in configuration order.
    #[must_use]
    pub fn admin_ids(&self) -> Vec<i64> {
        self.admin_ids_str
            .as_deref()
            .map(parse_id_list)
            .unwrap_or_default()
    }

    /// Subscription gate settings; `None` unless channel, prompt and button are all set.
    #[must_use]
    pub fn subscription(&self) -> Option<SubscriptionSettings> {
        let channel = non_empty(self.subscription_channel.as_ref())?;
        let prompt = non_empty(self.subscription_prompt.as_ref())?;
        let button = non_empty(self.subscription_button.as_ref())?;
        let reminder = non_empty(self.subscription_reminder.as_ref()).unwrap_or_else(|| prompt.clone());

        Some(SubscriptionSettings {
            channel: normalize_channel(&channel),
            prompt,
            reminder,
            button,
        })
    }

    /// Channel inspected by `/check_channel`, as `@username`.
    #[must_use]
    pub fn audit_channel(&self) -> Option<String> {
        non_empty(self.audit_channel.as_ref())
            .or_else(|| non_empty(self.subscription_channel.as_ref()))
            .map(|c| normalize_channel(&c))
    }
}

/// Time-to-live (seconds) for confirmed subscriptions.
/// Default: 5 minutes.
pub const SUBSCRIPTION_CACHE_TTL_SECS: u64 = 300;
/// Maximum number of cached confirmed subscriptions.
pub const SUBSCRIPTION_CACHE_MAX_SIZE: u64 = 10_000;

/// Get subscription cache TTL from env or default.
///
/// Environment variable: `SUBSCRIPTION_CACHE_TTL_SECS`.
#[must_use]
pub fn get_subscription_cache_ttl() -> u64 {
    std::env::var("SUBSCRIPTION_CACHE_TTL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(SUBSCRIPTION_CACHE_TTL_SECS)
}

/// Get subscription cache max size from env or default.
///
/// Environment variable: `SUBSCRIPTION_CACHE_MAX_SIZE`.
#[must_use]
pub fn get_subscription_cache_max_size() -> u64 {
    std::env::var("SUBSCRIPTION_CACHE_MAX_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(SUBSCRIPTION_CACHE_MAX_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> TelegramSettings {
        TelegramSettings {
            telegram_token: "dummy".to_string(),
            ..TelegramSettings::default()
        }
    }

    #[test]
    fn test_admin_ids_parsing() {
        let mut settings = settings();
        assert!(settings.admin_ids().is_empty());

        settings.admin_ids_str = Some("333; 444, 555".to_string());
        assert_eq!(settings.admin_ids(), vec![333, 444, 555]);
    }

    #[test]
    fn test_subscription_requires_channel_prompt_and_button() {
        let mut settings = settings();
        settings.subscription_channel = Some("goalevaya".to_string());
        settings.subscription_prompt = Some("Подпишитесь".to_string());
        assert!(settings.subscription().is_none());

        settings.subscription_button = Some("Проверить".to_string());
        let subscription = settings.subscription().expect("enabled");
        assert_eq!(subscription.channel, "@goalevaya");
        assert_eq!(subscription.reminder, "Подпишитесь");
    }

    #[test]
    fn test_blank_values_disable_subscription() {
        let mut settings = settings();
        settings.subscription_channel = Some("@c".to_string());
        settings.subscription_prompt = Some("   ".to_string());
        settings.subscription_button = Some("ok".to_string());
        assert!(settings.subscription().is_none());
    }

    #[test]
    fn test_audit_channel_falls_back_to_subscription_channel() {
        let mut settings = settings();
        assert!(settings.audit_channel().is_none());

        settings.subscription_channel = Some("https://t.me/main".to_string());
        assert_eq!(settings.audit_channel().as_deref(), Some("@main"));

        settings.audit_channel = Some("@other".to_string());
        assert_eq!(settings.audit_channel().as_deref(), Some("@other"));
    }
}
