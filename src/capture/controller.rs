//! Capture controller
//!
//! Owns one capture device and turns its start/stop into sessions with a
//! single terminal result each.

use super::traits::{finish_channel, CaptureDevice, CaptureError, CaptureResult, RecordingState};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Drives recording sessions on a capture device
pub struct CaptureController {
    /// The camera
    device: Box<dyn CaptureDevice>,

    /// Current recording state
    state: Arc<RwLock<RecordingState>>,

    /// Completion of the running session, if any
    pending: Option<oneshot::Receiver<CaptureResult>>,
}

impl CaptureController {
    /// Create a controller around a capture device
    pub fn new(device: Box<dyn CaptureDevice>) -> Self {
        Self {
            device,
            state: Arc::new(RwLock::new(RecordingState::default())),
            pending: None,
        }
    }

    /// Get the current recording state
    pub fn state(&self) -> RecordingState {
        self.state.read().clone()
    }

    pub fn is_recording(&self) -> bool {
        self.pending.is_some()
    }

    /// Start a session writing to `destination`.
    ///
    /// A second start while a session runs is rejected with
    /// `CaptureError::AlreadyRecording`; the running session is untouched.
    pub async fn start(&mut self, destination: &Path) -> Result<(), CaptureError> {
        if self.is_recording() {
            tracing::warn!("Ignoring start: device {} already recording", self.device.id());
            return Err(CaptureError::AlreadyRecording);
        }

        tracing::info!("Starting capture on {} to: {:?}", self.device.id(), destination);

        let (notifier, finished) = finish_channel();
        self.device.start_recording(destination, notifier).await?;

        self.pending = Some(finished);
        *self.state.write() = RecordingState {
            is_recording: true,
            output_location: None,
        };
        Ok(())
    }

    /// Stop the running session and wait for its result.
    ///
    /// Returns `None` when no session is running, so repeated stops are
    /// harmless.
    pub async fn stop(&mut self) -> Option<CaptureResult> {
        let Some(finished) = self.pending.take() else {
            tracing::debug!("Stop requested while idle, nothing to do");
            return None;
        };

        self.state.write().is_recording = false;
        self.device.stop_recording().await;

        let result = finished.await.unwrap_or(Err(CaptureError::Interrupted));
        match &result {
            Ok(path) => {
                tracing::info!("Capture finished: {:?}", path);
                self.state.write().output_location = Some(path.clone());
            }
            Err(e) => tracing::error!("Capture failed: {}", e),
        }

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCamera;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_start_stop_produces_file() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("output_1.mov");
        let mut controller = CaptureController::new(Box::new(FakeCamera::new()));

        controller.start(&dest).await.unwrap();
        assert!(controller.state().is_recording);
        assert_eq!(controller.state().output_location, None);

        let result = controller.stop().await.unwrap();
        assert_eq!(result, Ok(dest.clone()));
        assert!(dest.exists());

        let state = controller.state();
        assert!(!state.is_recording);
        assert_eq!(state.output_location, Some(dest));
    }

    #[tokio::test]
    async fn test_second_start_is_rejected() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("first.mov");
        let second = dir.path().join("second.mov");
        let camera = FakeCamera::new();
        let starts = camera.start_count();
        let mut controller = CaptureController::new(Box::new(camera));

        controller.start(&first).await.unwrap();
        assert_eq!(controller.start(&second).await, Err(CaptureError::AlreadyRecording));
        assert_eq!(starts.load(std::sync::atomic::Ordering::SeqCst), 1);

        // The original session still completes normally
        assert_eq!(controller.stop().await, Some(Ok(first)));
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let mut controller = CaptureController::new(Box::new(FakeCamera::new()));
        assert_eq!(controller.stop().await, None);
        assert_eq!(controller.stop().await, None);
        assert_eq!(controller.state(), RecordingState::default());
    }

    #[tokio::test]
    async fn test_repeated_stop_after_session_is_noop() {
        let dir = tempdir().unwrap();
        let mut controller = CaptureController::new(Box::new(FakeCamera::new()));
        controller.start(&dir.path().join("a.mov")).await.unwrap();

        assert!(controller.stop().await.is_some());
        assert_eq!(controller.stop().await, None);
    }

    #[tokio::test]
    async fn test_write_failure_keeps_no_output_location() {
        let dir = tempdir().unwrap();
        let mut controller = CaptureController::new(Box::new(FakeCamera::failing_write()));
        controller.start(&dir.path().join("a.mov")).await.unwrap();

        let result = controller.stop().await.unwrap();
        assert!(matches!(result, Err(CaptureError::WriteFailed(_))));
        assert_eq!(controller.state().output_location, None);
    }

    #[tokio::test]
    async fn test_unavailable_device_fails_start() {
        let dir = tempdir().unwrap();
        let mut controller = CaptureController::new(Box::new(FakeCamera::unavailable()));
        let err = controller.start(&dir.path().join("a.mov")).await.unwrap_err();
        assert!(matches!(err, CaptureError::DeviceUnavailable(_)));
        assert!(!controller.is_recording());
        assert_eq!(controller.stop().await, None);
    }

    #[tokio::test]
    async fn test_dropped_notifier_reads_as_interrupted() {
        let mut controller = CaptureController::new(Box::new(FakeCamera::silent()));
        controller.start(&PathBuf::from("/nonexistent/a.mov")).await.unwrap();
        assert_eq!(controller.stop().await, Some(Err(CaptureError::Interrupted)));
    }
}
