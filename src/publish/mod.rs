//! Media library publishing
//!
//! Commits a merged file to the media library once the user has granted
//! write access. The exported file itself is never moved or modified.

pub mod library;

pub use library::{DirectoryLibrary, DirectoryPermission};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Publish errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublishError {
    #[error("Permission to access the media library was denied")]
    PermissionDenied,

    #[error("File to publish not found: {0}")]
    SourceMissing(String),

    #[error("Failed to save to the media library: {0}")]
    Commit(String),
}

/// Library write permission as reported by the authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionStatus {
    NotDetermined,
    Granted,
    Denied,
}

/// Grants or refuses write access to the media library
#[async_trait]
pub trait PermissionAuthority: Send + Sync {
    /// Current status, without prompting
    async fn status(&self) -> PermissionStatus;

    /// Ask the user; resolves once they answer
    async fn request(&self) -> PermissionStatus;
}

/// The system-managed media store
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    /// Import `source` as a new library item in one atomic step.
    ///
    /// Returns the location of the new item.
    async fn import_video(&self, source: &Path) -> Result<PathBuf, String>;
}

/// Saves merged videos to the media library
#[derive(Clone)]
pub struct LibraryPublisher {
    authority: Arc<dyn PermissionAuthority>,
    library: Arc<dyn MediaLibrary>,
}

impl LibraryPublisher {
    pub fn new(authority: Arc<dyn PermissionAuthority>, library: Arc<dyn MediaLibrary>) -> Self {
        Self { authority, library }
    }

    /// Import `location` into the library, asking for permission first if
    /// it has not been granted yet.
    pub async fn publish(&self, location: &Path) -> Result<PathBuf, PublishError> {
        let status = match self.authority.status().await {
            PermissionStatus::Granted => PermissionStatus::Granted,
            current => {
                tracing::info!("Library permission is {:?}, requesting access", current);
                self.authority.request().await
            }
        };

        if status != PermissionStatus::Granted {
            tracing::warn!("Permission to access the media library was denied");
            return Err(PublishError::PermissionDenied);
        }

        if !location.exists() {
            return Err(PublishError::SourceMissing(location.to_string_lossy().to_string()));
        }

        let item = self
            .library
            .import_video(location)
            .await
            .map_err(PublishError::Commit)?;

        tracing::info!("Merged video saved to library: {:?}", item);
        Ok(item)
    }
}
