//! Background track selection
//!
//! Holds the location of the audio file picked by the user. The picker hands
//! over `file://` URIs or plain paths; both are normalized into a local path.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Selection errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Unsupported location scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid location: {0}")]
    InvalidLocation(String),
}

/// A local media file, normalized from a URI or path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaLocation(PathBuf);

impl MediaLocation {
    /// Parse a picker result (`file:///…` URI or plain filesystem path)
    pub fn parse(raw: &str) -> Result<Self, SelectionError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SelectionError::InvalidLocation("empty location".to_string()));
        }

        if let Some(rest) = raw.strip_prefix("file://") {
            // Only the empty host (file:///abs) and file://localhost/abs are local
            let path = match rest.strip_prefix("localhost") {
                _ if rest.starts_with('/') => rest,
                Some(path) if path.starts_with('/') => path,
                _ => {
                    return Err(SelectionError::InvalidLocation(format!(
                        "{}: not a local file",
                        raw
                    )))
                }
            };
            let decoded = urlencoding::decode(path)
                .map_err(|e| SelectionError::InvalidLocation(format!("{}: {}", raw, e)))?;
            return Ok(Self(PathBuf::from(decoded.into_owned())));
        }

        if let Some((scheme, _)) = raw.split_once("://") {
            return Err(SelectionError::UnsupportedScheme(scheme.to_string()));
        }

        Ok(Self(PathBuf::from(raw)))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn into_path(self) -> PathBuf {
        self.0
    }

    /// Last path component, for display next to the picker button
    pub fn display_name(&self) -> String {
        self.0
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.0.to_string_lossy().to_string())
    }
}

impl From<PathBuf> for MediaLocation {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

/// The currently chosen background track.
///
/// Single writer (the picker), many readers. Readers take a snapshot; the
/// assembler never sees later changes to the selection.
#[derive(Debug, Clone, Default)]
pub struct AudioSelection {
    location: Arc<RwLock<Option<MediaLocation>>>,
}

impl AudioSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the first picked location, replacing any earlier pick.
    ///
    /// An empty pick leaves the selection unchanged and returns `Ok(None)`.
    pub fn select<S: AsRef<str>>(
        &self,
        picked: &[S],
    ) -> Result<Option<MediaLocation>, SelectionError> {
        let Some(first) = picked.first() else {
            return Ok(None);
        };

        let location = MediaLocation::parse(first.as_ref())?;
        tracing::info!("Selected audio track: {}", location.display_name());
        *self.location.write() = Some(location.clone());
        Ok(Some(location))
    }

    pub fn clear(&self) {
        *self.location.write() = None;
    }

    /// Copy of the current selection
    pub fn snapshot(&self) -> Option<MediaLocation> {
        self.location.read().clone()
    }
}
