//! Guide catalog backed by a JSON array on disk.

use super::{JsonFile, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

/// A distributable guide document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guide {
    /// Stable identifier, typed by admins when deleting
    pub id: String,
    /// Title shown on the guide button and as document caption
    pub title: String,
    /// Telegram file id of the document; empty while not uploadable yet
    #[serde(default)]
    pub file_id: String,
    /// Creation timestamp, absent for records seeded by hand
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Guide {
    /// Whether the guide can be sent to users
    #[must_use]
    pub fn is_available(&self) -> bool {
        !self.file_id.is_empty()
    }
}

/// Interface for guide catalogs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GuideCatalog: Send + Sync {
    /// All guides in insertion order, including ones without a file
    async fn list_all(&self) -> Result<Vec<Guide>, StorageError>;
    /// Guides that have a file and can be distributed
    async fn list_available(&self) -> Result<Vec<Guide>, StorageError>;
    /// Look a guide up by id
    async fn get_by_id(&self, id: &str) -> Result<Option<Guide>, StorageError>;
    /// Append a new guide and return the stored record
    async fn create(&self, title: &str, file_id: &str) -> Result<Guide, StorageError>;
    /// Remove a guide, returning it if it existed
    async fn delete_by_id(&self, id: &str) -> Result<Option<Guide>, StorageError>;
}

/// Catalog stored in `guides.json`
pub struct JsonGuideCatalog {
    file: JsonFile<Vec<Guide>>,
}

impl JsonGuideCatalog {
    /// Create a catalog backed by the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }
}

#[async_trait]
impl GuideCatalog for JsonGuideCatalog {
    async fn list_all(&self) -> Result<Vec<Guide>, StorageError> {
        self.file.load().await
    }

    async fn list_available(&self) -> Result<Vec<Guide>, StorageError> {
        let guides = self.file.load().await?;
        Ok(guides.into_iter().filter(Guide::is_available).collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Guide>, StorageError> {
        let guides = self.file.load().await?;
        Ok(guides.into_iter().find(|g| g.id == id))
    }

    async fn create(&self, title: &str, file_id: &str) -> Result<Guide, StorageError> {
        let guide = self
            .file
            .modify(|guides| {
                let guide = Guide {
                    id: next_guide_id(guides),
                    title: title.to_string(),
                    file_id: file_id.to_string(),
                    created_at: Some(Utc::now()),
                };
                guides.push(guide.clone());
                guide
            })
            .await?;

        info!(guide_id = %guide.id, title = %guide.title, "Guide created");
        Ok(guide)
    }

    async fn delete_by_id(&self, id: &str) -> Result<Option<Guide>, StorageError> {
        let removed = self
            .file
            .modify(|guides| {
                let position = guides.iter().position(|g| g.id == id)?;
                Some(guides.remove(position))
            })
            .await?;

        if let Some(guide) = &removed {
            info!(guide_id = %guide.id, title = %guide.title, "Guide deleted");
        }
        Ok(removed)
    }
}

/// Short id that admins can type back, unique within `existing`.
fn next_guide_id(existing: &[Guide]) -> String {
    loop {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(8);
        if !existing.iter().any(|g| g.id == id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_in(dir: &tempfile::TempDir) -> JsonGuideCatalog {
        JsonGuideCatalog::new(dir.path().join("guides.json"))
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let catalog = catalog_in(&dir);

        let created = catalog.create("Roof Guide", "doc123").await.expect("create");
        let fetched = catalog
            .get_by_id(&created.id)
            .await
            .expect("get")
            .expect("present");

        assert_eq!(fetched.title, "Roof Guide");
        assert_eq!(fetched.file_id, "doc123");
        assert!(fetched.created_at.is_some());
    }

    #[tokio::test]
    async fn test_delete_then_get_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let catalog = catalog_in(&dir);

        let created = catalog.create("Land", "doc1").await.expect("create");
        let removed = catalog.delete_by_id(&created.id).await.expect("delete");

        assert_eq!(removed.map(|g| g.title), Some("Land".to_string()));
        assert!(catalog.get_by_id(&created.id).await.expect("get").is_none());
        assert!(catalog.delete_by_id(&created.id).await.expect("delete").is_none());
    }

    #[tokio::test]
    async fn test_available_excludes_guides_without_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("guides.json");
        std::fs::write(
            &path,
            r#"[
                {"id": "choose-developer", "title": "Developer", "fileId": ""},
                {"id": "choose-land-plot", "title": "Land plot", "fileId": "BQAC"}
            ]"#,
        )
        .expect("write");
        let catalog = JsonGuideCatalog::new(&path);

        assert_eq!(catalog.list_all().await.expect("all").len(), 2);
        let available = catalog.list_available().await.expect("available");
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, "choose-land-plot");
    }

    #[tokio::test]
    async fn test_file_id_filled_in_by_hand_makes_guide_available() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("guides.json");
        std::fs::write(&path, r#"[{"id": "choose-developer", "title": "Developer", "fileId": ""}]"#)
            .expect("write");
        let catalog = JsonGuideCatalog::new(&path);
        assert!(catalog.list_available().await.expect("available").is_empty());

        std::fs::write(
            &path,
            r#"[{"id": "choose-developer", "title": "Developer", "fileId": "BQAC"}]"#,
        )
        .expect("edit");
        assert_eq!(catalog.list_available().await.expect("available").len(), 1);

        catalog.create("Roof", "doc").await.expect("create");
        let developer = catalog
            .get_by_id("choose-developer")
            .await
            .expect("get")
            .expect("present");
        assert_eq!(developer.file_id, "BQAC");
        assert_eq!(catalog.list_all().await.expect("all").len(), 2);
    }

    #[tokio::test]
    async fn test_persisted_layout_uses_camel_case() {
        let dir = tempfile::tempdir().expect("tempdir");
        let catalog = catalog_in(&dir);
        catalog.create("Roof", "doc").await.expect("create");

        let raw = std::fs::read_to_string(dir.path().join("guides.json")).expect("read");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        let record = &value[0];
        assert!(record.get("fileId").is_some());
        assert!(record.get("createdAt").is_some());
        assert_eq!(record["title"], "Roof");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let mut guides = Vec::new();
        for _ in 0..50 {
            let id = next_guide_id(&guides);
            assert_eq!(id.len(), 8);
            guides.push(Guide {
                id,
                title: "t".to_string(),
                file_id: String::new(),
                created_at: None,
            });
        }
        let mut ids: Vec<_> = guides.iter().map(|g| g.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 50);
    }
}
