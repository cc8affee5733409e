//! Pipeline coordinator
//!
//! Sequences one recording through capture, merge and publish. Each stage
//! starts only after the previous one reported success.

use super::state::{PipelineEvent, PipelineOutcome, PipelineRun, PipelineStage};
use crate::assembler::{
    ContainerFormat, ExportEngine, FfmpegExportEngine, FfprobeInspector, MediaAssembler,
    MediaInspector, MergeOutcome, MergeRequest, ProgressCallback,
};
use crate::capture::{CaptureController, CaptureDevice, FfmpegCaptureDevice, RecordingState};
use crate::config::PipelineConfig;
use crate::playback::{AudioPlayer, FfplayPlayer, MonitorPlayback};
use crate::publish::{
    DirectoryLibrary, DirectoryPermission, LibraryPublisher, MediaLibrary, PermissionAuthority,
};
use crate::selection::{AudioSelection, MediaLocation};
use crate::utils::paths::{unique_media_path, CAPTURE_PREFIX, MERGED_PREFIX};
use crate::utils::{AppError, AppResult};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, oneshot, Mutex};

/// The collaborators a pipeline drives
pub struct PipelineParts {
    pub device: Box<dyn CaptureDevice>,
    pub player: Box<dyn AudioPlayer>,
    pub inspector: Arc<dyn MediaInspector>,
    pub engine: Arc<dyn ExportEngine>,
    pub authority: Arc<dyn PermissionAuthority>,
    pub library: Arc<dyn MediaLibrary>,
}

impl PipelineParts {
    /// ffmpeg-backed parts with a directory library
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            device: Box::new(FfmpegCaptureDevice::new(
                config.ffmpeg_path.clone(),
                config.capture.clone(),
            )),
            player: Box::new(FfplayPlayer::new(config.ffplay_path.clone())),
            inspector: Arc::new(FfprobeInspector::new(config.ffprobe_path.clone())),
            engine: Arc::new(FfmpegExportEngine::new(config.ffmpeg_path.clone())),
            authority: Arc::new(DirectoryPermission::new(config.library_dir.clone())),
            library: Arc::new(DirectoryLibrary::new(config.library_dir.clone())),
        }
    }
}

struct Inner {
    media_dir: PathBuf,
    container: ContainerFormat,
    stage: RwLock<PipelineStage>,
    /// Serializes start/stop transitions
    capture: Mutex<CaptureController>,
    monitor: Mutex<MonitorPlayback>,
    selection: AudioSelection,
    assembler: MediaAssembler,
    publisher: LibraryPublisher,
    event_tx: broadcast::Sender<PipelineEvent>,
}

impl Inner {
    fn set_stage(&self, stage: PipelineStage) {
        *self.stage.write() = stage;
        tracing::debug!("Pipeline stage: {:?}", stage);
        let _ = self.event_tx.send(PipelineEvent::StageChanged(stage));
    }

    /// Report the outcome and return to idle
    fn finish(&self, outcome: PipelineOutcome, tx: oneshot::Sender<PipelineOutcome>) {
        self.set_stage(PipelineStage::Idle);
        let _ = self.event_tx.send(PipelineEvent::Finished(outcome.clone()));
        if tx.send(outcome).is_err() {
            tracing::debug!("Pipeline outcome dropped: run handle no longer waiting");
        }
    }

    async fn merge_and_publish(&self, request: MergeRequest) -> PipelineOutcome {
        let video = request.video_location.clone();
        let events = self.event_tx.clone();
        let progress: ProgressCallback = Arc::new(move |p| {
            let _ = events.send(PipelineEvent::Progress(p));
        });

        match self.assembler.assemble_with_progress(request, progress).await {
            MergeOutcome::Success { output_location } => {
                self.set_stage(PipelineStage::Publishing);
                match self.publisher.publish(&output_location).await {
                    Ok(library_item) => PipelineOutcome::Published {
                        video,
                        output: output_location,
                        library_item,
                    },
                    Err(error) => {
                        tracing::error!("Error saving merged video to library: {}", error);
                        PipelineOutcome::PublishFailed {
                            output: output_location,
                            error,
                        }
                    }
                }
            }
            MergeOutcome::Failed { error } => PipelineOutcome::MergeFailed { video, error },
            MergeOutcome::Cancelled => PipelineOutcome::MergeCancelled { video },
        }
    }
}

/// Drives record → merge → publish for one camera
#[derive(Clone)]
pub struct PipelineCoordinator {
    inner: Arc<Inner>,
}

impl PipelineCoordinator {
    /// Create a coordinator around explicit collaborators
    pub fn new(config: &PipelineConfig, parts: PipelineParts) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        let container = ContainerFormat::default();

        Self {
            inner: Arc::new(Inner {
                media_dir: config.media_dir.clone(),
                container,
                stage: RwLock::new(PipelineStage::Idle),
                capture: Mutex::new(CaptureController::new(parts.device)),
                monitor: Mutex::new(MonitorPlayback::new(parts.player)),
                selection: AudioSelection::new(),
                assembler: MediaAssembler::new(parts.inspector, parts.engine),
                publisher: LibraryPublisher::new(parts.authority, parts.library),
                event_tx,
            }),
        }
    }

    /// Create a coordinator using ffmpeg, ffprobe and ffplay
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config, PipelineParts::from_config(config))
    }

    /// Get the current stage
    pub fn stage(&self) -> PipelineStage {
        *self.inner.stage.read()
    }

    /// Get the camera's recording state
    pub async fn recording_state(&self) -> RecordingState {
        self.inner.capture.lock().await.state()
    }

    /// Subscribe to pipeline events
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.inner.event_tx.subscribe()
    }

    /// The background track selection
    pub fn selection(&self) -> &AudioSelection {
        &self.inner.selection
    }

    /// Take the picker's result; the first entry wins
    pub fn select_audio<S: AsRef<str>>(&self, picked: &[S]) -> AppResult<Option<MediaLocation>> {
        let selected = self.inner.selection.select(picked)?;
        if let Some(location) = &selected {
            tracing::info!("Selected audio: {}", location.display_name());
        }
        Ok(selected)
    }

    pub fn clear_audio(&self) {
        self.inner.selection.clear();
    }

    /// Start recording into a fresh file in the media directory.
    ///
    /// Only allowed while idle; a merge or publish still in flight makes
    /// this fail with `AppError::Busy`. Returns the capture destination.
    pub async fn start_recording(&self) -> AppResult<PathBuf> {
        let mut capture = self.inner.capture.lock().await;

        let stage = self.stage();
        if stage != PipelineStage::Idle {
            tracing::warn!("Refusing to start recording while {:?}", stage);
            return Err(AppError::Busy(stage));
        }

        let destination = unique_media_path(
            &self.inner.media_dir,
            CAPTURE_PREFIX,
            self.inner.container.extension(),
        );
        capture.start(&destination).await?;

        self.inner.set_stage(PipelineStage::Recording);
        let _ = self
            .inner
            .event_tx
            .send(PipelineEvent::RecordingStarted(destination.clone()));

        if let Some(track) = self.inner.selection.snapshot() {
            if let Err(e) = self.inner.monitor.lock().await.play(track.path()).await {
                tracing::warn!("Monitor playback unavailable: {}", e);
            }
        }

        Ok(destination)
    }

    /// Stop recording and hand the capture to the merge and publish stages.
    ///
    /// Returns `None` when nothing is recording, so repeated stops are
    /// harmless.
    pub async fn stop_recording(&self) -> Option<PipelineRun> {
        let mut capture = self.inner.capture.lock().await;
        if !capture.is_recording() {
            tracing::debug!("Stop requested while not recording");
            return None;
        }

        self.inner.monitor.lock().await.stop().await;
        let result = capture.stop().await?;

        let (tx, rx) = oneshot::channel();
        let run = PipelineRun::new(rx);

        let video = match result {
            Ok(video) => video,
            Err(e) => {
                self.inner.finish(PipelineOutcome::CaptureFailed(e), tx);
                return Some(run);
            }
        };
        let _ = self
            .inner
            .event_tx
            .send(PipelineEvent::RecordingFinished(video.clone()));

        let Some(audio) = self.inner.selection.snapshot() else {
            tracing::info!("No audio selected, keeping recording as-is: {:?}", video);
            self.inner
                .finish(PipelineOutcome::RecordedWithoutAudio { video }, tx);
            return Some(run);
        };

        let request = MergeRequest {
            video_location: video,
            audio_location: audio.into_path(),
            output_location: unique_media_path(
                &self.inner.media_dir,
                MERGED_PREFIX,
                self.inner.container.extension(),
            ),
        };

        // Leave Recording before releasing the capture lock so a new start
        // sees the pipeline busy
        self.inner.set_stage(PipelineStage::Assembling);
        drop(capture);

        let inner = self.inner.clone();
        tokio::spawn(async move {
            let outcome = inner.merge_and_publish(request).await;
            inner.finish(outcome, tx);
        });

        Some(run)
    }
}
