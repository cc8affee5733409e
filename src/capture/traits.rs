//! Capture trait definitions
//!
//! Platform-agnostic seam between the capture controller and the camera.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::oneshot;

/// Capture errors. All of them end the current session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Failed to write recording: {0}")]
    WriteFailed(String),

    #[error("Recording already in progress")]
    AlreadyRecording,

    #[error("Capture device stopped without reporting a result")]
    Interrupted,
}

/// Terminal result of one recording session
pub type CaptureResult = Result<PathBuf, CaptureError>;

/// One-shot completion handle for a recording session.
///
/// `finish` consumes the notifier, so a session can report at most once.
#[derive(Debug)]
pub struct FinishNotifier {
    tx: oneshot::Sender<CaptureResult>,
}

impl FinishNotifier {
    /// Deliver the session's terminal result
    pub fn finish(self, result: CaptureResult) {
        if self.tx.send(result).is_err() {
            tracing::debug!("Capture result dropped: controller no longer waiting");
        }
    }
}

/// Create a notifier and the receiver the controller waits on
pub fn finish_channel() -> (FinishNotifier, oneshot::Receiver<CaptureResult>) {
    let (tx, rx) = oneshot::channel();
    (FinishNotifier { tx }, rx)
}

/// A camera that can write a recording session to a file
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Device identifier for logging
    fn id(&self) -> &str;

    /// Begin writing to `destination`.
    ///
    /// On `Ok`, the device owns `notifier` and must eventually call
    /// `finish` on it (or drop it, which the controller reads as
    /// `CaptureError::Interrupted`).
    async fn start_recording(
        &mut self,
        destination: &Path,
        notifier: FinishNotifier,
    ) -> Result<(), CaptureError>;

    /// Ask the device to finalize the file. Must be safe to call when idle.
    async fn stop_recording(&mut self);
}

/// Capture session status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingState {
    /// Whether a session is currently running
    pub is_recording: bool,

    /// File produced by the last successful stop
    pub output_location: Option<PathBuf>,
}
