//! In-process fakes for every collaborator seam

use crate::assembler::{
    AssetInfo, ExportEngine, ExportJob, ExportStatus, MediaInspector, ProbeError, ProgressCallback,
    StreamInfo, TrackKind,
};
use crate::capture::{CaptureDevice, CaptureError, FinishNotifier};
use crate::playback::{AudioPlayer, PlaybackError};
use crate::publish::{MediaLibrary, PermissionAuthority, PermissionStatus};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Contents `FakeEngine` writes for a complete merged file
const MERGED_FILE: &[u8] = b"merged:video+audio";

/// Contents `FakeEngine` writes for a merged file that lost its audio
const VIDEO_ONLY_FILE: &[u8] = b"merged:video";

/// Shared, ordered record of calls made on fakes
pub type PlayerLog = Arc<Mutex<Vec<String>>>;

#[derive(Debug, Clone, Copy)]
enum CameraMode {
    Writes,
    FailsWrite,
    Unavailable,
    Silent,
}

/// Camera that writes a small file when stopped
pub struct FakeCamera {
    mode: CameraMode,
    starts: Arc<AtomicUsize>,
    log: Option<PlayerLog>,
    session: Option<(PathBuf, FinishNotifier)>,
}

impl FakeCamera {
    fn with_mode(mode: CameraMode) -> Self {
        Self {
            mode,
            starts: Arc::new(AtomicUsize::new(0)),
            log: None,
            session: None,
        }
    }

    pub fn new() -> Self {
        Self::with_mode(CameraMode::Writes)
    }

    /// Finishes every session with a write failure
    pub fn failing_write() -> Self {
        Self::with_mode(CameraMode::FailsWrite)
    }

    /// Refuses to start
    pub fn unavailable() -> Self {
        Self::with_mode(CameraMode::Unavailable)
    }

    /// Drops the notifier without reporting
    pub fn silent() -> Self {
        Self::with_mode(CameraMode::Silent)
    }

    /// Record "camera stop" into `log` when stopped
    pub fn logging(mut self, log: PlayerLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn start_count(&self) -> Arc<AtomicUsize> {
        self.starts.clone()
    }
}

#[async_trait]
impl CaptureDevice for FakeCamera {
    fn id(&self) -> &str {
        "fake-camera"
    }

    async fn start_recording(
        &mut self,
        destination: &Path,
        notifier: FinishNotifier,
    ) -> Result<(), CaptureError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if let CameraMode::Unavailable = self.mode {
            return Err(CaptureError::DeviceUnavailable("no camera attached".to_string()));
        }
        self.session = Some((destination.to_path_buf(), notifier));
        Ok(())
    }

    async fn stop_recording(&mut self) {
        let Some((destination, notifier)) = self.session.take() else {
            return;
        };
        if let Some(log) = &self.log {
            log.lock().push("camera stop".to_string());
        }

        match self.mode {
            CameraMode::Writes => {
                let result = std::fs::create_dir_all(destination.parent().unwrap_or(Path::new(".")))
                    .and_then(|_| std::fs::write(&destination, b"recording"))
                    .map(|_| destination)
                    .map_err(|e| CaptureError::WriteFailed(e.to_string()));
                notifier.finish(result);
            }
            CameraMode::FailsWrite => {
                notifier.finish(Err(CaptureError::WriteFailed("disk full".to_string())));
            }
            CameraMode::Unavailable | CameraMode::Silent => drop(notifier),
        }
    }
}

/// Player that only records what it was asked to do
pub struct FakePlayer {
    log: PlayerLog,
}

impl FakePlayer {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Share an existing log
    pub fn with_log(log: PlayerLog) -> Self {
        Self { log }
    }

    pub fn log(&self) -> PlayerLog {
        self.log.clone()
    }
}

#[async_trait]
impl AudioPlayer for FakePlayer {
    async fn play(&mut self, source: &Path) -> Result<(), PlaybackError> {
        self.log.lock().push(format!("play {}", source.display()));
        Ok(())
    }

    async fn stop(&mut self) {
        self.log.lock().push("stop".to_string());
    }
}

/// Inspector answering from registered stream layouts.
///
/// Files that no longer exist on disk are reported as not found.
#[derive(Clone, Default)]
pub struct FakeInspector {
    assets: Arc<Mutex<HashMap<PathBuf, AssetInfo>>>,
}

impl FakeInspector {
    pub fn new() -> Self {
        Self::default()
    }

    fn stream(
        index: usize,
        kind: TrackKind,
        codec: &str,
        duration: Option<Duration>,
    ) -> StreamInfo {
        StreamInfo {
            index,
            kind_index: 0,
            kind,
            codec: codec.to_string(),
            duration,
        }
    }

    fn single_stream(kind: TrackKind, codec: &str, duration: Duration) -> AssetInfo {
        AssetInfo {
            streams: vec![Self::stream(0, kind, codec, Some(duration))],
            duration: Some(duration),
        }
    }

    /// Layout of a file written by `FakeEngine`, recognized by its contents
    fn exported(path: &Path) -> Option<AssetInfo> {
        let contents = std::fs::read(path).ok()?;
        let mut streams = vec![Self::stream(0, TrackKind::Video, "h264", None)];
        if contents == MERGED_FILE {
            streams.push(Self::stream(1, TrackKind::Audio, "aac", None));
        } else if contents != VIDEO_ONLY_FILE {
            return None;
        }
        Some(AssetInfo {
            streams,
            duration: None,
        })
    }

    /// Register `path` as a video-only asset
    pub fn add_video(&self, path: &Path, duration: Duration) {
        self.assets.lock().insert(
            path.to_path_buf(),
            Self::single_stream(TrackKind::Video, "h264", duration),
        );
    }

    /// Register `path` as an audio-only asset
    pub fn add_audio(&self, path: &Path, duration: Duration) {
        self.assets.lock().insert(
            path.to_path_buf(),
            Self::single_stream(TrackKind::Audio, "aac", duration),
        );
    }
}

#[async_trait]
impl MediaInspector for FakeInspector {
    async fn inspect(&self, path: &Path) -> Result<AssetInfo, ProbeError> {
        if !path.exists() {
            return Err(ProbeError::NotFound(path.to_string_lossy().to_string()));
        }
        let registered = self.assets.lock().get(path).cloned();
        registered
            .or_else(|| Self::exported(path))
            .ok_or_else(|| ProbeError::NotFound(path.to_string_lossy().to_string()))
    }
}

/// Export engine returning a fixed status
pub struct FakeEngine {
    status: ExportStatus,
    output: Option<&'static [u8]>,
    gate: Option<Arc<Notify>>,
    jobs: Arc<Mutex<Vec<ExportJob>>>,
}

impl FakeEngine {
    /// Writes a video + audio output file and completes
    pub fn completing() -> Self {
        Self {
            status: ExportStatus::Completed,
            output: Some(MERGED_FILE),
            gate: None,
            jobs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reports `status` without writing anything
    pub fn with_status(status: ExportStatus) -> Self {
        Self {
            status,
            output: None,
            gate: None,
            jobs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Completes, but the written file has no audio stream
    pub fn completing_without_audio() -> Self {
        Self {
            output: Some(VIDEO_ONLY_FILE),
            ..Self::completing()
        }
    }

    /// Completes only after the returned gate is notified
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let engine = Self {
            gate: Some(gate.clone()),
            ..Self::completing()
        };
        (engine, gate)
    }

    /// Jobs received so far
    pub fn jobs(&self) -> Arc<Mutex<Vec<ExportJob>>> {
        self.jobs.clone()
    }
}

#[async_trait]
impl ExportEngine for FakeEngine {
    async fn export(&self, job: &ExportJob, _progress: ProgressCallback) -> ExportStatus {
        self.jobs.lock().push(job.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(contents) = self.output {
            if let Err(e) = std::fs::write(&job.output_path, contents) {
                return ExportStatus::Failed(e.to_string());
            }
        }
        self.status.clone()
    }
}

/// Permission authority with scripted answers
#[derive(Clone)]
pub struct FakeAuthority {
    status: PermissionStatus,
    answer: PermissionStatus,
    requests: Arc<AtomicUsize>,
}

impl FakeAuthority {
    /// Reports `status`, and `answer` once asked
    pub fn new(status: PermissionStatus, answer: PermissionStatus) -> Self {
        Self {
            status,
            answer,
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionAuthority for FakeAuthority {
    async fn status(&self) -> PermissionStatus {
        self.status
    }

    async fn request(&self) -> PermissionStatus {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}

/// Library that remembers what it imported
pub struct FakeLibrary {
    failure: Option<String>,
    imports: Arc<Mutex<Vec<PathBuf>>>,
}

impl FakeLibrary {
    pub fn new() -> Self {
        Self {
            failure: None,
            imports: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Rejects every import with `reason`
    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::new()
        }
    }

    pub fn imports(&self) -> Arc<Mutex<Vec<PathBuf>>> {
        self.imports.clone()
    }
}

#[async_trait]
impl MediaLibrary for FakeLibrary {
    async fn import_video(&self, source: &Path) -> Result<PathBuf, String> {
        if let Some(reason) = &self.failure {
            return Err(reason.clone());
        }
        self.imports.lock().push(source.to_path_buf());
        let name = source.file_name().map(PathBuf::from).unwrap_or_default();
        Ok(PathBuf::from("library").join(name))
    }
}
