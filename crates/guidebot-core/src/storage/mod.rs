//! Storage layer for guides, registered users and menu media
//!
//! Every collection lives in its own pretty-printed JSON file. A missing or
//! empty file reads as the empty value of the collection, never as an error.

/// Guide catalog repository
pub mod guides;
/// Menu media repository
pub mod menu_media;
/// Registered users roster
pub mod users;

pub use guides::{Guide, GuideCatalog, JsonGuideCatalog};
pub use menu_media::{JsonMenuMediaStore, MediaKind, MenuMedia, MenuMediaStore};
pub use users::{JsonUserRegistry, RegisteredUser, UserProfile, UserRegistry};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Standard I/O error
    #[error("IO error on {path}: {source}")]
    Io {
        /// File the operation was performed on
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// Error during JSON serialization or deserialization
    #[error("JSON error on {path}: {source}")]
    Json {
        /// File the operation was performed on
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

/// A single JSON document on disk holding a value of type `T`.
///
/// Every read goes to the file, so edits made by hand while the bot runs are
/// picked up. [`JsonFile::modify`] re-reads the file under a lock and
/// serializes read-modify-write cycles of concurrent callers.
pub struct JsonFile<T> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _value: PhantomData<fn() -> T>,
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned + Default + Send + Sync,
{
    /// Create a handle for the file at `path`. Nothing is read until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            _value: PhantomData,
        }
    }

    /// Path of the underlying file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current value from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(&self) -> Result<T, StorageError> {
        self.read_from_disk().await
    }

    /// Apply `modifier` to the current value and persist the result.
    ///
    /// The closure's return value is handed back to the caller once the write
    /// has succeeded. On failure the file is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if reading, serializing or writing fails.
    pub async fn modify<F, R>(&self, modifier: F) -> Result<R, StorageError>
    where
        F: FnOnce(&mut T) -> R,
    {
        let _guard = self.write_lock.lock().await;
        let mut value = self.read_from_disk().await?;

        let result = modifier(&mut value);
        self.write_to_disk(&value).await?;
        Ok(result)
    }

    /// Replace the stored value entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if serializing or writing fails.
    pub async fn store(&self, value: T) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        self.write_to_disk(&value).await
    }

    async fn read_from_disk(&self) -> Result<T, StorageError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Storage file missing, starting empty");
                return Ok(T::default());
            }
            Err(source) => {
                error!(path = %self.path.display(), error = %source, "Failed to read storage file");
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if content.trim().is_empty() {
            return Ok(T::default());
        }

        serde_json::from_str(&content).map_err(|source| {
            error!(path = %self.path.display(), error = %source, "Failed to parse storage file");
            StorageError::Json {
                path: self.path.clone(),
                source,
            }
        })
    }

    async fn write_to_disk(&self, value: &T) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await.map_err(io_err)?;
        }

        let body = serde_json::to_string_pretty(value).map_err(|source| StorageError::Json {
            path: self.path.clone(),
            source,
        })?;

        // Write to a sibling file first so a crash never leaves half a document behind
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}
