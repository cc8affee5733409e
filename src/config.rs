//! Pipeline configuration
//!
//! Built in process by the embedding shell. Nothing here is read from or
//! written to disk.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Directory name used under the platform documents/videos folders
const APP_DIR_NAME: &str = "Kadence";

/// Camera input settings for the ffmpeg capture device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSettings {
    /// ffmpeg demuxer for the camera (`v4l2`, `avfoundation`, `dshow`)
    pub input_format: String,

    /// Device name passed to `-i`
    pub input_device: String,

    /// Requested capture frame rate
    pub frame_rate: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        #[cfg(target_os = "macos")]
        {
            Self {
                input_format: "avfoundation".to_string(),
                input_device: "0:0".to_string(),
                frame_rate: 30,
            }
        }

        #[cfg(target_os = "windows")]
        {
            Self {
                input_format: "dshow".to_string(),
                input_device: "video=Integrated Camera".to_string(),
                frame_rate: 30,
            }
        }

        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            Self {
                input_format: "v4l2".to_string(),
                input_device: "/dev/video0".to_string(),
                frame_rate: 30,
            }
        }
    }
}

/// Configuration for the capture → merge → publish pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Application-private directory for raw captures and merged exports
    pub media_dir: PathBuf,

    /// Directory backing the media library
    pub library_dir: PathBuf,

    /// Camera capture settings
    pub capture: CaptureSettings,

    /// ffmpeg binary used for capture and export
    pub ffmpeg_path: PathBuf,

    /// ffprobe binary used to inspect assets
    pub ffprobe_path: PathBuf,

    /// ffplay binary used for monitor playback
    pub ffplay_path: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let media_dir = dirs::document_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR_NAME);
        let library_dir = dirs::video_dir()
            .unwrap_or_else(|| media_dir.clone())
            .join(APP_DIR_NAME);

        Self {
            media_dir,
            library_dir,
            capture: CaptureSettings::default(),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            ffplay_path: PathBuf::from("ffplay"),
        }
    }
}

impl PipelineConfig {
    /// Use `media_dir` for captures and `media_dir/library` for published items
    pub fn with_media_dir(media_dir: impl Into<PathBuf>) -> Self {
        let media_dir = media_dir.into();
        Self {
            library_dir: media_dir.join("library"),
            media_dir,
            ..Self::default()
        }
    }
}
