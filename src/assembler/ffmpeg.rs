//! FFmpeg export engine
//!
//! Renders a composition with a single ffmpeg invocation: both sources are
//! trimmed through a filter_complex, encoded to H.264/AAC and muxed into a
//! QuickTime file.

use super::composition::{Composition, CompositionTrack};
use super::export::{ExportEngine, ExportJob, ProgressCallback};
use super::types::{ExportProgress, ExportStatus, TrackKind};
use crate::utils::process::stderr_tail;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

/// ffmpeg's exit code when interrupted by a signal or a `q` on stdin
const FFMPEG_INTERRUPTED_EXIT: i32 = 255;

/// Export engine backed by the ffmpeg CLI
pub struct FfmpegExportEngine {
    ffmpeg_path: PathBuf,
}

impl FfmpegExportEngine {
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self { ffmpeg_path }
    }
}

fn secs(duration: Duration) -> String {
    format!("{:.3}", duration.as_secs_f64())
}

/// Build the trim filter for one track, writing to `[label]`
fn build_track_filter(track: &CompositionTrack, input_index: usize, label: &str) -> String {
    let range = track.source_range;
    match track.kind {
        TrackKind::Video => format!(
            "[{}:v:{}]trim=start={}:duration={},setpts=PTS-STARTPTS[{}]",
            input_index,
            track.stream_index,
            secs(range.start),
            secs(range.duration),
            label
        ),
        TrackKind::Audio => {
            let mut filter = format!(
                "[{}:a:{}]atrim=start={}:duration={},asetpts=PTS-STARTPTS",
                input_index,
                track.stream_index,
                secs(range.start),
                secs(range.duration)
            );
            if !track.insert_at.is_zero() {
                filter.push_str(&format!(",adelay=delays={}:all=1", track.insert_at.as_millis()));
            }
            filter.push_str(&format!("[{}]", label));
            filter
        }
    }
}

/// Build the filter_complex aligning both tracks on the composition timeline
pub(crate) fn build_filter_complex(composition: &Composition) -> String {
    [
        build_track_filter(&composition.video, 0, "vout"),
        build_track_filter(&composition.audio, 1, "aout"),
    ]
    .join(";")
}

/// Build the complete ffmpeg argument list for an export job
pub(crate) fn export_args(job: &ExportJob) -> Vec<String> {
    let composition = &job.composition;
    let mut args = vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-i".to_string(),
        composition.video.source.to_string_lossy().to_string(),
        "-i".to_string(),
        composition.audio.source.to_string_lossy().to_string(),
        "-filter_complex".to_string(),
        build_filter_complex(composition),
        "-map".to_string(),
        "[vout]".to_string(),
        "-map".to_string(),
        "[aout]".to_string(),
        "-t".to_string(),
        secs(composition.duration),
    ];

    // Video codec options
    args.extend([
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        job.quality.h264_preset().to_string(),
        "-crf".to_string(),
        job.quality.crf().to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
    ]);

    // Audio codec
    args.extend([
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        job.quality.audio_bitrate().to_string(),
    ]);

    if job.optimize_for_network {
        args.extend(["-movflags".to_string(), "+faststart".to_string()]);
    }

    args.extend(["-f".to_string(), job.container.muxer().to_string()]);

    // Progress output for tracking
    args.extend([
        "-progress".to_string(),
        "pipe:1".to_string(),
        "-nostats".to_string(),
    ]);

    args.push(job.output_path.to_string_lossy().to_string());
    args
}

/// Output time (ms) from one `-progress` line.
///
/// ffmpeg reports microseconds under both `out_time_us` and the misnamed
/// `out_time_ms`.
pub(crate) fn parse_progress_line(line: &str) -> Option<u64> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        "out_time_us" | "out_time_ms" => value.trim().parse::<u64>().ok().map(|us| us / 1000),
        _ => None,
    }
}

/// Map an ffmpeg exit to the engine status
pub(crate) fn status_from_exit(success: bool, code: Option<i32>, stderr: &str) -> ExportStatus {
    if success {
        return ExportStatus::Completed;
    }
    match code {
        // Killed by a signal
        None => ExportStatus::Cancelled,
        Some(FFMPEG_INTERRUPTED_EXIT) => ExportStatus::Cancelled,
        Some(code) => ExportStatus::Failed(format!(
            "FFmpeg exited with code {}: {}",
            code,
            stderr_tail(stderr)
        )),
    }
}

#[async_trait]
impl ExportEngine for FfmpegExportEngine {
    async fn export(&self, job: &ExportJob, progress: ProgressCallback) -> ExportStatus {
        if let Some(parent) = job.output_path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return ExportStatus::Failed(format!("Cannot create {:?}: {}", parent, e));
            }
        }

        let args = export_args(job);
        tracing::info!("Starting FFmpeg export: {:?}", args);

        let mut process = match Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(process) => process,
            Err(e) => return ExportStatus::Failed(format!("Failed to start FFmpeg: {}", e)),
        };

        let stderr = process.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut log = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut log).await;
            }
            log
        });

        let total_ms = job.composition.duration.as_millis() as u64;
        if let Some(stdout) = process.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if let Some(written_ms) = parse_progress_line(&line) {
                            progress(ExportProgress::encoding(written_ms, total_ms));
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!("Failed to read FFmpeg progress: {}", e);
                        break;
                    }
                }
            }
        }

        let status = match process.wait().await {
            Ok(status) => status,
            Err(e) => return ExportStatus::Failed(format!("Failed to wait for FFmpeg: {}", e)),
        };
        let log = stderr_task.await.unwrap_or_default();

        let export_status = status_from_exit(status.success(), status.code(), &log);
        tracing::info!("FFmpeg export finished: {:?}", export_status);
        export_status
    }
}
