//! Composition building
//!
//! A composition places the recorded video and the background track on one
//! timeline. The video's duration decides the length of everything: the
//! audio is cut at that point and never looped.

use super::probe::{AssetInfo, StreamInfo};
use super::types::{MergeError, TrackKind};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Half-open time range `[start, start + duration)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Duration,
    pub duration: Duration,
}

impl TimeRange {
    pub fn from_zero(duration: Duration) -> Self {
        Self {
            start: Duration::ZERO,
            duration,
        }
    }

    pub fn end(&self) -> Duration {
        self.start + self.duration
    }
}

/// One source stream inserted into the composition
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionTrack {
    pub kind: TrackKind,
    /// Source file
    pub source: PathBuf,
    /// Position among the source's streams of this kind
    pub stream_index: usize,
    /// Portion of the source stream that is used
    pub source_range: TimeRange,
    /// Where the range lands on the composition timeline
    pub insert_at: Duration,
}

/// Video and audio aligned on one timeline
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub video: CompositionTrack,
    pub audio: CompositionTrack,
    /// Total length, always the video's duration
    pub duration: Duration,
}

impl Composition {
    /// Portion of the timeline that carries audible audio
    pub fn audible_range(&self) -> TimeRange {
        TimeRange {
            start: self.audio.insert_at,
            duration: self.audio.source_range.duration,
        }
    }
}

/// Build the two-track composition.
///
/// The video stream's full length `D` becomes the composition length. The
/// audio range is `[0, min(A, D))`; when `A` is unknown the full `[0, D)` is
/// requested and the exporter stops at `D`.
pub fn build_composition(
    video_path: &Path,
    video_asset: &AssetInfo,
    video_stream: &StreamInfo,
    audio_path: &Path,
    audio_asset: &AssetInfo,
    audio_stream: &StreamInfo,
) -> Result<Composition, MergeError> {
    let video_duration = video_asset
        .stream_duration(video_stream)
        .ok_or_else(|| MergeError::CompositionInsert("video duration is unknown".to_string()))?;
    if video_duration.is_zero() {
        return Err(MergeError::CompositionInsert("video has zero duration".to_string()));
    }

    let audio_span = match audio_asset.stream_duration(audio_stream) {
        Some(audio_duration) => audio_duration.min(video_duration),
        None => video_duration,
    };
    if audio_span.is_zero() {
        return Err(MergeError::CompositionInsert("audio has zero duration".to_string()));
    }

    Ok(Composition {
        video: CompositionTrack {
            kind: TrackKind::Video,
            source: video_path.to_path_buf(),
            stream_index: video_stream.kind_index,
            source_range: TimeRange::from_zero(video_duration),
            insert_at: Duration::ZERO,
        },
        audio: CompositionTrack {
            kind: TrackKind::Audio,
            source: audio_path.to_path_buf(),
            stream_index: audio_stream.kind_index,
            source_range: TimeRange::from_zero(audio_span),
            insert_at: Duration::ZERO,
        },
        duration: video_duration,
    })
}
