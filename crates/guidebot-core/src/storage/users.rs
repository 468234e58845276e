//! Roster of users who have started the bot.

use super::{JsonFile, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Profile fields taken from the Telegram `from` payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    /// Telegram user id
    pub id: i64,
    /// `@username` without the at sign
    pub username: Option<String>,
    /// First name
    pub first_name: Option<String>,
    /// Last name
    pub last_name: Option<String>,
    /// IETF language tag reported by the client
    pub language_code: Option<String>,
}

/// A persisted roster entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    /// Telegram user id
    pub id: i64,
    /// Username at registration time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// First name at registration time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Last name at registration time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Client language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    /// First time the user was seen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_at: Option<DateTime<Utc>>,
    /// When the user accepted the terms, if ever
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consented_at: Option<DateTime<Utc>>,
}

impl RegisteredUser {
    /// Whether the user has accepted the terms
    #[must_use]
    pub const fn has_consented(&self) -> bool {
        self.consented_at.is_some()
    }
}

/// Interface for the users roster
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRegistry: Send + Sync {
    /// Register the user unless already present; returns the stored record
    async fn register(&self, profile: &UserProfile) -> Result<RegisteredUser, StorageError>;
    /// Look a user up by id
    async fn get(&self, id: i64) -> Result<Option<RegisteredUser>, StorageError>;
    /// Record consent, registering the user first if needed
    async fn record_consent(&self, profile: &UserProfile) -> Result<RegisteredUser, StorageError>;
    /// All users in registration order
    async fn list(&self) -> Result<Vec<RegisteredUser>, StorageError>;
}

/// Roster stored in `users.json`
pub struct JsonUserRegistry {
    file: JsonFile<Vec<RegisteredUser>>,
}

impl JsonUserRegistry {
    /// Create a roster backed by the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }
}

fn new_record(profile: &UserProfile) -> RegisteredUser {
    RegisteredUser {
        id: profile.id,
        username: profile.username.clone(),
        first_name: profile.first_name.clone(),
        last_name: profile.last_name.clone(),
        language_code: profile.language_code.clone(),
        registered_at: Some(Utc::now()),
        consented_at: None,
    }
}

fn find_or_insert<'a>(
    users: &'a mut Vec<RegisteredUser>,
    profile: &UserProfile,
) -> (&'a mut RegisteredUser, bool) {
    match users.iter().position(|u| u.id == profile.id) {
        Some(position) => (&mut users[position], false),
        None => {
            users.push(new_record(profile));
            let last = users.len() - 1;
            (&mut users[last], true)
        }
    }
}

#[async_trait]
impl UserRegistry for JsonUserRegistry {
    async fn register(&self, profile: &UserProfile) -> Result<RegisteredUser, StorageError> {
        if let Some(existing) = self.get(profile.id).await? {
            return Ok(existing);
        }

        let (user, inserted) = self
            .file
            .modify(|users| {
                let (user, inserted) = find_or_insert(users, profile);
                (user.clone(), inserted)
            })
            .await?;

        if inserted {
            info!(user_id = user.id, username = ?user.username, "User registered");
        }
        Ok(user)
    }

    async fn get(&self, id: i64) -> Result<Option<RegisteredUser>, StorageError> {
        let users = self.file.load().await?;
        Ok(users.into_iter().find(|u| u.id == id))
    }

    async fn record_consent(&self, profile: &UserProfile) -> Result<RegisteredUser, StorageError> {
        let user = self
            .file
            .modify(|users| {
                let (user, _) = find_or_insert(users, profile);
                if user.consented_at.is_none() {
                    user.consented_at = Some(Utc::now());
                }
                user.clone()
            })
            .await?;

        info!(user_id = user.id, "User accepted the terms");
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<RegisteredUser>, StorageError> {
        self.file.load().await
    }
}
