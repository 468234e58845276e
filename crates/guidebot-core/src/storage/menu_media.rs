//! The banner shown above the guide menu.

use super::{JsonFile, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Kind of media attached to the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Photo, sent with `sendPhoto`
    Photo,
    /// Video, sent with `sendVideo`
    Video,
}

/// Stored menu media
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuMedia {
    /// Media kind
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Telegram file id
    pub file_id: String,
    /// Optional caption sent along with the media
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Last update time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Admin who uploaded the media
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<i64>,
}

/// Interface for menu media storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MenuMediaStore: Send + Sync {
    /// Current media, `None` when unset or incomplete
    async fn get(&self) -> Result<Option<MenuMedia>, StorageError>;
    /// Replace the media
    async fn save(&self, media: MenuMedia) -> Result<(), StorageError>;
}

/// Menu media stored in `menu_media.json`
pub struct JsonMenuMediaStore {
    file: JsonFile<Option<serde_json::Value>>,
}

impl JsonMenuMediaStore {
    /// Create a store backed by the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }
}

#[async_trait]
impl MenuMediaStore for JsonMenuMediaStore {
    async fn get(&self) -> Result<Option<MenuMedia>, StorageError> {
        let raw = self.file.load().await?;
        // Anything that is not a complete record counts as "no media"
        Ok(raw
            .and_then(|value| serde_json::from_value::<MenuMedia>(value).ok())
            .filter(|media| !media.file_id.is_empty()))
    }

    async fn save(&self, media: MenuMedia) -> Result<(), StorageError> {
        let value = serde_json::to_value(&media).map_err(|source| StorageError::Json {
            path: self.file.path().to_path_buf(),
            source,
        })?;
        self.file.store(Some(value)).await?;
        info!(kind = ?media.kind, updated_by = ?media.updated_by, "Menu media updated");
        Ok(())
    }
}
