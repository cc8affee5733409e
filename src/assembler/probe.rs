//! Asset inspection
//!
//! Reads the stream layout and durations of a media file so the assembler
//! can pick the first video and first audio stream.

use super::types::TrackKind;
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Inspection errors
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("FFprobe error: {0}")]
    Ffprobe(String),

    #[error("Unreadable probe output: {0}")]
    Parse(String),
}

/// One elementary stream inside an asset
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    /// Absolute stream index in the container
    pub index: usize,
    /// Position among streams of the same kind (for `-map 0:v:N`)
    pub kind_index: usize,
    pub kind: TrackKind,
    pub codec: String,
    /// Stream duration when the container records one
    pub duration: Option<Duration>,
}

/// Stream metadata of one media file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssetInfo {
    pub streams: Vec<StreamInfo>,
    /// Container duration
    pub duration: Option<Duration>,
}

impl AssetInfo {
    /// First stream of the given kind
    pub fn first_stream(&self, kind: TrackKind) -> Option<&StreamInfo> {
        self.streams.iter().find(|s| s.kind == kind)
    }

    /// Duration of a stream, falling back to the container duration
    pub fn stream_duration(&self, stream: &StreamInfo) -> Option<Duration> {
        stream.duration.or(self.duration)
    }
}

/// Reads stream metadata from media files
#[async_trait]
pub trait MediaInspector: Send + Sync {
    async fn inspect(&self, path: &Path) -> Result<AssetInfo, ProbeError>;
}

/// Inspector backed by the ffprobe CLI
pub struct FfprobeInspector {
    ffprobe_path: PathBuf,
}

impl FfprobeInspector {
    pub fn new(ffprobe_path: PathBuf) -> Self {
        Self { ffprobe_path }
    }
}

#[async_trait]
impl MediaInspector for FfprobeInspector {
    async fn inspect(&self, path: &Path) -> Result<AssetInfo, ProbeError> {
        if !path.exists() {
            return Err(ProbeError::NotFound(path.to_string_lossy().to_string()));
        }

        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| ProbeError::Ffprobe(format!("Failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::Ffprobe(format!("ffprobe failed: {}", stderr.trim())));
        }

        let json = String::from_utf8_lossy(&output.stdout);
        let info = parse_probe_output(&json).map_err(|e| ProbeError::Parse(format!("{:#}", e)))?;

        tracing::debug!(
            "Inspected {:?}: {} streams, duration {:?}",
            path,
            info.streams.len(),
            info.duration
        );
        Ok(info)
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    index: usize,
    codec_type: Option<String>,
    codec_name: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Parse a seconds string such as "10.033333"
fn parse_seconds(raw: &str) -> anyhow::Result<Duration> {
    let secs: f64 = raw
        .trim()
        .parse()
        .with_context(|| format!("invalid duration {:?}", raw))?;
    Duration::try_from_secs_f64(secs).with_context(|| format!("duration out of range: {}", secs))
}

/// Parse `ffprobe -print_format json -show_streams -show_format` output.
///
/// Streams other than audio/video (subtitles, data) are skipped.
pub(crate) fn parse_probe_output(json: &str) -> anyhow::Result<AssetInfo> {
    let probe: ProbeOutput =
        serde_json::from_str(json).context("ffprobe output is not valid JSON")?;

    let duration = match probe.format.and_then(|f| f.duration) {
        Some(raw) => Some(parse_seconds(&raw).context("format duration")?),
        None => None,
    };

    let mut video_count = 0;
    let mut audio_count = 0;
    let mut streams = Vec::new();

    for stream in probe.streams {
        let (kind, counter) = match stream.codec_type.as_deref() {
            Some("video") => (TrackKind::Video, &mut video_count),
            Some("audio") => (TrackKind::Audio, &mut audio_count),
            _ => continue,
        };

        let stream_duration = match stream.duration.as_deref() {
            Some(raw) => Some(
                parse_seconds(raw).with_context(|| format!("duration of stream {}", stream.index))?,
            ),
            None => None,
        };

        streams.push(StreamInfo {
            index: stream.index,
            kind_index: *counter,
            kind,
            codec: stream.codec_name.unwrap_or_else(|| "unknown".to_string()),
            duration: stream_duration,
        });
        *counter += 1;
    }

    Ok(AssetInfo { streams, duration })
}
