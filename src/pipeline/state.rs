//! Pipeline state management
//!
//! Defines the capture → merge → publish state machine, the events it emits
//! and the terminal outcome of one run.

use crate::assembler::{ExportProgress, MergeError};
use crate::capture::CaptureError;
use crate::publish::PublishError;
use crate::utils::AppError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::oneshot;

/// Current stage of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    /// Waiting for a recording to start
    Idle,
    /// Camera is writing the raw capture
    Recording,
    /// Merging the capture with the background track
    Assembling,
    /// Saving the merged file to the media library
    Publishing,
}

impl Default for PipelineStage {
    fn default() -> Self {
        Self::Idle
    }
}

/// Terminal result of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Merged file exported and saved to the library
    Published {
        video: PathBuf,
        output: PathBuf,
        library_item: PathBuf,
    },
    /// Recording kept as-is because no track was selected
    RecordedWithoutAudio { video: PathBuf },
    /// Camera failed to produce a file
    CaptureFailed(CaptureError),
    /// Merge failed; the raw capture is left in place
    MergeFailed { video: PathBuf, error: MergeError },
    /// Export was cancelled
    MergeCancelled { video: PathBuf },
    /// Merged file exists but could not be saved to the library
    PublishFailed { output: PathBuf, error: PublishError },
}

impl PipelineOutcome {
    /// The failure of this run, tagged with the stage it happened in.
    ///
    /// `None` for runs that ended normally, including recordings kept
    /// without a track.
    pub fn error(&self) -> Option<AppError> {
        match self {
            PipelineOutcome::Published { .. } | PipelineOutcome::RecordedWithoutAudio { .. } => {
                None
            }
            PipelineOutcome::CaptureFailed(error) => Some(AppError::Capture(error.clone())),
            PipelineOutcome::MergeFailed { error, .. } => Some(AppError::Merge(error.clone())),
            PipelineOutcome::MergeCancelled { .. } => Some(AppError::MergeCancelled),
            PipelineOutcome::PublishFailed { error, .. } => Some(AppError::Publish(error.clone())),
        }
    }
}

/// Events emitted while the pipeline runs
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// Stage transition
    StageChanged(PipelineStage),
    /// Recording started writing to this file
    RecordingStarted(PathBuf),
    /// Raw capture finalized
    RecordingFinished(PathBuf),
    /// Export progress of the running merge
    Progress(ExportProgress),
    /// Run finished
    Finished(PipelineOutcome),
}

/// Handle to the remainder of a run after recording stopped
#[derive(Debug)]
pub struct PipelineRun {
    outcome: oneshot::Receiver<PipelineOutcome>,
}

impl PipelineRun {
    pub(crate) fn new(outcome: oneshot::Receiver<PipelineOutcome>) -> Self {
        Self { outcome }
    }

    /// Wait for the run to finish.
    ///
    /// `None` only if the background task died before reporting.
    pub async fn outcome(self) -> Option<PipelineOutcome> {
        self.outcome.await.ok()
    }
}
