//! Merge types and configuration
//!
//! This module defines the request/outcome pair for one merge job, the
//! export quality preset, progress tracking, and error handling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Kind of elementary stream a track carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Video => write!(f, "video"),
            TrackKind::Audio => write!(f, "audio"),
        }
    }
}

/// Output container. Fixed to QuickTime movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    #[default]
    Mov,
}

impl ContainerFormat {
    /// Get the file extension for this container
    pub fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::Mov => "mov",
        }
    }

    /// Get the FFmpeg muxer name
    pub fn muxer(&self) -> &'static str {
        match self {
            ContainerFormat::Mov => "mov",
        }
    }
}

/// Export quality. Fixed to the highest available preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportQuality {
    #[default]
    Highest,
}

impl ExportQuality {
    /// Get the CRF value for H.264 encoding
    pub fn crf(&self) -> u8 {
        match self {
            // CRF 1 is visually lossless and still plays back as yuv420p
            ExportQuality::Highest => 1,
        }
    }

    /// Get the FFmpeg preset for H.264 encoding
    pub fn h264_preset(&self) -> &'static str {
        match self {
            ExportQuality::Highest => "veryslow",
        }
    }

    /// AAC bitrate for the merged audio track
    pub fn audio_bitrate(&self) -> &'static str {
        match self {
            ExportQuality::Highest => "192k",
        }
    }
}

/// One assembly job: a finished recording plus the chosen track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    /// Recorded video file
    pub video_location: PathBuf,
    /// Selected background track
    pub audio_location: PathBuf,
    /// Freshly generated path for the merged file
    pub output_location: PathBuf,
}

/// Terminal result of one merge job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum MergeOutcome {
    /// Merged file written; it holds one video and one audio stream
    #[serde(rename_all = "camelCase")]
    Success { output_location: PathBuf },
    /// Merge failed; no retry was attempted
    Failed { error: MergeError },
    /// Export engine reported cancellation
    Cancelled,
}

impl MergeOutcome {
    pub fn failed(error: MergeError) -> Self {
        MergeOutcome::Failed { error }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MergeOutcome::Success { .. })
    }

    pub fn error(&self) -> Option<&MergeError> {
        match self {
            MergeOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Merge errors, each fatal to its job only
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "detail")]
pub enum MergeError {
    #[error("missing {0} stream")]
    TrackMissing(TrackKind),

    #[error("Composition insert failed: {0}")]
    CompositionInsert(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("unknown export status")]
    UnknownExportStatus(String),
}

/// Export progress stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ExportStage {
    /// Inspecting sources and building the composition
    Preparing,
    /// Encoding the composition
    Encoding,
    /// Export completed successfully
    Complete,
}

/// Export progress information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportProgress {
    /// Progress percentage (0.0 to 100.0)
    pub percent: f32,
    /// Current stage of export
    pub stage: ExportStage,
    /// Output time written so far (milliseconds)
    pub written_ms: u64,
    /// Total output duration (milliseconds)
    pub total_ms: u64,
}

impl ExportProgress {
    pub fn preparing() -> Self {
        Self {
            percent: 0.0,
            stage: ExportStage::Preparing,
            written_ms: 0,
            total_ms: 0,
        }
    }

    pub fn encoding(written_ms: u64, total_ms: u64) -> Self {
        let percent = if total_ms > 0 {
            (written_ms.min(total_ms) as f32 / total_ms as f32) * 99.0
        } else {
            0.0
        };
        Self {
            percent,
            stage: ExportStage::Encoding,
            written_ms,
            total_ms,
        }
    }

    pub fn complete(total_ms: u64) -> Self {
        Self {
            percent: 100.0,
            stage: ExportStage::Complete,
            written_ms: total_ms,
            total_ms,
        }
    }
}

/// Status reported by an export engine when it stops
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    Completed,
    Failed(String),
    Cancelled,
    /// Anything the engine reports outside the three terminal states
    Unrecognized(String),
}
