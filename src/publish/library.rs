//! Directory-backed media library
//!
//! Items are plain files in a library directory. Imports go through a
//! temporary file in that directory and are persisted under a name that is
//! not yet taken, so a reader never sees a half-written item.

use super::{MediaLibrary, PermissionAuthority, PermissionStatus};
use crate::utils::paths::unique_media_path;
use async_trait::async_trait;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Copy `source` into `dir` atomically, returning the new item's path
fn import_into(dir: &Path, source: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let file_name = source
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "source has no file name"))?;
    let mut destination = dir.join(file_name);
    if destination.exists() {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "video".to_string());
        let extension = source
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "mov".to_string());
        destination = unique_media_path(dir, &stem, &extension);
    }

    let mut temp = NamedTempFile::new_in(dir)?;
    let mut reader = fs::File::open(source)?;
    io::copy(&mut reader, temp.as_file_mut())?;
    temp.as_file().sync_all()?;

    temp.persist_noclobber(&destination).map_err(|e| e.error)?;
    Ok(destination)
}

/// Media library stored in a directory
pub struct DirectoryLibrary {
    dir: PathBuf,
}

impl DirectoryLibrary {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl MediaLibrary for DirectoryLibrary {
    async fn import_video(&self, source: &Path) -> Result<PathBuf, String> {
        let dir = self.dir.clone();
        let source = source.to_path_buf();

        tokio::task::spawn_blocking(move || import_into(&dir, &source))
            .await
            .map_err(|e| format!("Import task panicked: {}", e))?
            .map_err(|e| e.to_string())
    }
}

/// Grants library access when the library directory is writable
pub struct DirectoryPermission {
    dir: PathBuf,
}

impl DirectoryPermission {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

fn probe_writable(dir: &Path) -> bool {
    tempfile::tempfile_in(dir).is_ok()
}

#[async_trait]
impl PermissionAuthority for DirectoryPermission {
    async fn status(&self) -> PermissionStatus {
        let dir = self.dir.clone();
        let writable = tokio::task::spawn_blocking(move || dir.is_dir() && probe_writable(&dir))
            .await
            .unwrap_or(false);

        if writable {
            PermissionStatus::Granted
        } else {
            PermissionStatus::NotDetermined
        }
    }

    async fn request(&self) -> PermissionStatus {
        let dir = self.dir.clone();
        let granted = tokio::task::spawn_blocking(move || {
            if let Err(e) = fs::create_dir_all(&dir) {
                tracing::warn!("Cannot create library directory {:?}: {}", dir, e);
                return false;
            }
            probe_writable(&dir)
        })
        .await
        .unwrap_or(false);

        if granted {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }
}
