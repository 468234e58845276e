//! Channel subscription audit
//!
//! `/check_channel` arms the conversation; the initiator's next text is a
//! list of usernames which are looked up in the roster and checked against
//! the channel one by one.

use crate::bot::subscription::MembershipChecker;
use crate::bot::views::AuditStatus;
use chrono::Utc;
use guidebot_core::session::{ChannelAudit, SessionStore};
use guidebot_core::storage::{StorageError, UserRegistry};
use lazy_regex::{regex_is_match, regex_replace};
use std::collections::HashMap;
use tracing::{error, info};

/// Parse a username list, one entry per line
///
/// Accepts `@name`, `name` and `https://t.me/name`; anything that is not a
/// valid Telegram username is dropped.
///
/// # Examples
///
/// ```
/// use guidebot_transport_telegram::bot::channel_audit::extract_usernames;
/// let names = extract_usernames("@alice_1\n\n https://t.me/bob_the_builder \n@no");
/// assert_eq!(names, vec!["alice_1", "bob_the_builder"]);
/// ```
#[must_use]
pub fn extract_usernames(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.strip_prefix('@').unwrap_or(line))
        .map(|line| regex_replace!(r"(?i)^https?://t\.me/", line, "").into_owned())
        .filter(|name| regex_is_match!(r"^[a-zA-Z0-9_]{5,32}$", name))
        .collect()
}

/// What to do with an incoming text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditSubmission {
    /// No audit pending for this sender
    NotPending,
    /// Audit consumed but nothing usable was sent
    Empty,
    /// Usernames to check, without the at sign
    Usernames(Vec<String>),
}

/// Arm the audit for `initiator_id` in this conversation
pub async fn begin(sessions: &dyn SessionStore, conversation_id: i64, initiator_id: i64) {
    let mut session = sessions.get(conversation_id).await;
    session.channel_audit = Some(ChannelAudit {
        initiator_id,
        requested_at: Utc::now(),
    });
    sessions.set(conversation_id, session).await;
    info!(conversation_id, initiator_id, "Channel audit requested");
}

/// Take the pending audit if `user_id` started it
///
/// The audit is cleared on the first text from the initiator, whatever it
/// contains.
pub async fn take_submission(
    sessions: &dyn SessionStore,
    conversation_id: i64,
    user_id: i64,
    text: &str,
) -> AuditSubmission {
    let mut session = sessions.get(conversation_id).await;
    let owned = session
        .channel_audit
        .as_ref()
        .is_some_and(|audit| audit.initiator_id == user_id);
    if !owned || text.starts_with('/') {
        return AuditSubmission::NotPending;
    }

    session.channel_audit = None;
    sessions.set(conversation_id, session).await;

    let usernames = extract_usernames(text);
    if usernames.is_empty() {
        AuditSubmission::Empty
    } else {
        AuditSubmission::Usernames(usernames)
    }
}

/// Check every username against `channel`
///
/// # Errors
///
/// Returns a `StorageError` if the roster cannot be read.
pub async fn check_usernames(
    users: &dyn UserRegistry,
    checker: &dyn MembershipChecker,
    channel: &str,
    usernames: &[String],
) -> Result<Vec<(String, AuditStatus)>, StorageError> {
    let roster: HashMap<String, i64> = users
        .list()
        .await?
        .into_iter()
        .filter_map(|user| {
            user.username
                .filter(|name| !name.is_empty())
                .map(|name| (name.to_lowercase(), user.id))
        })
        .collect();

    let mut rows = Vec::with_capacity(usernames.len());
    for username in usernames {
        let status = match roster.get(&username.to_lowercase()) {
            None => AuditStatus::NotRegistered,
            Some(&user_id) => match checker.is_member(channel, user_id).await {
                Ok(true) => AuditStatus::Subscribed,
                Ok(false) => AuditStatus::NotSubscribed,
                Err(e) => {
                    error!(user_id, username = %username, error = %e, "Audit membership check failed");
                    AuditStatus::CheckFailed(e.to_string())
                }
            },
        };
        rows.push((username.clone(), status));
    }
    Ok(rows)
}
