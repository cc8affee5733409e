//! Output file naming
//!
//! Raw captures and merged exports share the media directory, so every name
//! carries a timestamp and is checked against the disk before use.

use chrono::Utc;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Prefix for raw camera captures
pub const CAPTURE_PREFIX: &str = "output";

/// Prefix for merged video + audio exports
pub const MERGED_PREFIX: &str = "merged_output";

/// Build a fresh path `<dir>/<prefix>_<unix-seconds>.<extension>`.
///
/// Falls back to a uuid suffix when the timestamped name is already taken,
/// e.g. two recordings stopped within the same second.
pub fn unique_media_path(dir: &Path, prefix: &str, extension: &str) -> PathBuf {
    let timestamp = Utc::now().timestamp();
    let candidate = dir.join(format!("{}_{}.{}", prefix, timestamp, extension));
    if !candidate.exists() {
        return candidate;
    }

    loop {
        let suffix = Uuid::new_v4().simple().to_string();
        let candidate = dir.join(format!(
            "{}_{}_{}.{}",
            prefix,
            timestamp,
            &suffix[..8],
            extension
        ));
        if !candidate.exists() {
            tracing::debug!("Timestamped name taken, using {:?}", candidate);
            return candidate;
        }
    }
}
