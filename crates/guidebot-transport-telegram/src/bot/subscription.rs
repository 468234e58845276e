//! Channel subscription gate
//!
//! Users must be members of the configured channel before they receive
//! guides. Confirmed members are cached for a while so browsing the menu
//! does not hit `getChatMember` on every click.

use crate::config::SubscriptionSettings;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{Recipient, UserId};
use tracing::{debug, error};

/// Tells whether a user belongs to a channel
#[async_trait]
pub trait MembershipChecker: Send + Sync {
    /// `Ok(false)` when the user is not a member or unknown to Telegram
    async fn is_member(&self, channel: &str, user_id: i64) -> Result<bool>;
}

/// Whether a Bot API error means "this user is not in the chat"
///
/// # Examples
///
/// ```
/// use guidebot_transport_telegram::bot::subscription::is_user_missing_error;
/// assert!(is_user_missing_error("Bad Request: USER_NOT_PARTICIPANT"));
/// assert!(!is_user_missing_error("Bad Request: chat not found"));
/// ```
#[must_use]
pub fn is_user_missing_error(description: &str) -> bool {
    let normalized = description.to_lowercase();
    normalized.contains("user not found") || normalized.contains("user_not_participant")
}

/// Membership lookups through `getChatMember`
pub struct TelegramMembership {
    bot: Bot,
}

impl TelegramMembership {
    /// Create a checker using `bot`
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl MembershipChecker for TelegramMembership {
    async fn is_member(&self, channel: &str, user_id: i64) -> Result<bool> {
        let recipient = Recipient::ChannelUsername(channel.to_string());
        match self
            .bot
            .get_chat_member(recipient, UserId(user_id.cast_unsigned()))
            .await
        {
            // owner, administrator, member, or restricted while still a member
            Ok(member) => Ok(member.kind.is_present()),
            Err(e) if is_user_missing_error(&e.to_string()) => Ok(false),
            Err(e) => Err(anyhow!("getChatMember failed for {channel}: {e}")),
        }
    }
}

/// Result of running the gate for one user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Gate disabled or user subscribed
    Allowed,
    /// User is not in the channel
    NotSubscribed,
    /// Telegram could not answer
    CheckFailed,
}

/// Subscription gate with a cache of confirmed members
pub struct SubscriptionGuard {
    settings: Option<SubscriptionSettings>,
    checker: Arc<dyn MembershipChecker>,
    confirmed: Cache<i64, ()>,
}

impl SubscriptionGuard {
    /// Create the guard; `settings == None` disables the gate
    #[must_use]
    pub fn new(
        settings: Option<SubscriptionSettings>,
        checker: Arc<dyn MembershipChecker>,
        ttl_secs: u64,
        max_capacity: u64,
    ) -> Self {
        let confirmed = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            settings,
            checker,
            confirmed,
        }
    }

    /// Gate configuration, if enabled
    #[must_use]
    pub const fn settings(&self) -> Option<&SubscriptionSettings> {
        self.settings.as_ref()
    }

    /// Membership checker shared with the channel audit
    #[must_use]
    pub fn checker(&self) -> Arc<dyn MembershipChecker> {
        Arc::clone(&self.checker)
    }

    /// Run the gate for `user_id`
    pub async fn check(&self, user_id: i64) -> GateOutcome {
        let Some(settings) = &self.settings else {
            return GateOutcome::Allowed;
        };

        if self.confirmed.get(&user_id).await.is_some() {
            debug!(user_id, "Subscription confirmed from cache");
            return GateOutcome::Allowed;
        }

        match self.checker.is_member(&settings.channel, user_id).await {
            Ok(true) => {
                self.confirmed.insert(user_id, ()).await;
                GateOutcome::Allowed
            }
            Ok(false) => GateOutcome::NotSubscribed,
            Err(e) => {
                error!(user_id, channel = %settings.channel, error = %e, "Failed to verify subscription status");
                GateOutcome::CheckFailed
            }
        }
    }
}
