//! Camera capture through an ffmpeg child process
//!
//! ffmpeg reads the camera and writes a QuickTime file. Stopping sends `q`
//! on stdin so ffmpeg finalizes the container before exiting.

use super::traits::{CaptureDevice, CaptureError, CaptureResult, FinishNotifier};
use crate::config::CaptureSettings;
use crate::utils::process::stderr_tail;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Camera device backed by the ffmpeg CLI
pub struct FfmpegCaptureDevice {
    id: String,
    ffmpeg_path: PathBuf,
    settings: CaptureSettings,

    /// Signals the supervisor task to finalize the recording
    stop_tx: Option<oneshot::Sender<()>>,

    /// Supervisor task for the running ffmpeg process
    task: Option<JoinHandle<()>>,
}

impl FfmpegCaptureDevice {
    pub fn new(ffmpeg_path: PathBuf, settings: CaptureSettings) -> Self {
        Self {
            id: format!("ffmpeg-{}", settings.input_device),
            ffmpeg_path,
            settings,
            stop_tx: None,
            task: None,
        }
    }
}

/// Build the ffmpeg arguments for a camera recording
pub(crate) fn capture_args(settings: &CaptureSettings, destination: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-f".to_string(),
        settings.input_format.clone(),
        "-framerate".to_string(),
        settings.frame_rate.to_string(),
        "-i".to_string(),
        settings.input_device.clone(),
        "-an".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "ultrafast".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-f".to_string(),
        "mov".to_string(),
        destination.to_string_lossy().to_string(),
    ]
}

/// How the ffmpeg process ended up leaving the recording loop
enum Exit {
    /// Process ended on its own before stop was requested
    Early(std::io::Result<ExitStatus>),
    /// Stop was requested (or the device was dropped)
    StopRequested,
}

/// Wait for the process to end or for a stop request, then report the file
async fn supervise(
    mut child: Child,
    stop_rx: oneshot::Receiver<()>,
    destination: PathBuf,
) -> CaptureResult {
    let stderr = child.stderr.take();
    let stderr_task = tokio::spawn(async move {
        let mut log = String::new();
        if let Some(mut stderr) = stderr {
            let _ = stderr.read_to_string(&mut log).await;
        }
        log
    });

    let exit = tokio::select! {
        status = child.wait() => Exit::Early(status),
        _ = stop_rx => Exit::StopRequested,
    };

    match exit {
        Exit::Early(status) => {
            let log = stderr_task.await.unwrap_or_default();
            let reason = match status {
                Ok(status) => format!("ffmpeg exited with {}: {}", status, stderr_tail(&log)),
                Err(e) => format!("failed to wait for ffmpeg: {}", e),
            };
            Err(CaptureError::DeviceUnavailable(reason))
        }
        Exit::StopRequested => {
            if let Some(mut stdin) = child.stdin.take() {
                if let Err(e) = stdin.write_all(b"q").await {
                    tracing::warn!("Failed to send quit to ffmpeg capture: {}", e);
                }
            }

            let status = child
                .wait()
                .await
                .map_err(|e| {
                    CaptureError::WriteFailed(format!("failed to wait for ffmpeg: {}", e))
                })?;
            let log = stderr_task.await.unwrap_or_default();

            if !status.success() {
                return Err(CaptureError::WriteFailed(format!(
                    "ffmpeg exited with {}: {}",
                    status,
                    stderr_tail(&log)
                )));
            }
            if !destination.exists() {
                return Err(CaptureError::WriteFailed(format!(
                    "no recording written to {:?}",
                    destination
                )));
            }

            Ok(destination)
        }
    }
}

#[async_trait]
impl CaptureDevice for FfmpegCaptureDevice {
    fn id(&self) -> &str {
        &self.id
    }

    async fn start_recording(
        &mut self,
        destination: &Path,
        notifier: FinishNotifier,
    ) -> Result<(), CaptureError> {
        if self.task.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| {
                    CaptureError::WriteFailed(format!("cannot create {:?}: {}", parent, e))
                })?;
        }

        let args = capture_args(&self.settings, destination);
        tracing::info!("Starting FFmpeg capture: {:?}", args);

        let child = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                CaptureError::DeviceUnavailable(format!("Failed to start FFmpeg: {}", e))
            })?;

        let (stop_tx, stop_rx) = oneshot::channel();
        let destination = destination.to_path_buf();
        let task = tokio::spawn(async move {
            let result = supervise(child, stop_rx, destination).await;
            notifier.finish(result);
        });

        self.stop_tx = Some(stop_tx);
        self.task = Some(task);
        Ok(())
    }

    async fn stop_recording(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Capture supervisor task panicked: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::traits::finish_channel;

    #[test]
    fn test_capture_args_record_video_only_mov() {
        let settings = CaptureSettings {
            input_format: "v4l2".to_string(),
            input_device: "/dev/video2".to_string(),
            frame_rate: 24,
        };
        let args = capture_args(&settings, Path::new("/tmp/output_1.mov"));

        let joined = args.join(" ");
        assert!(joined.contains("-f v4l2 -framerate 24 -i /dev/video2"));
        assert!(args.contains(&"-an".to_string()));
        assert!(joined.contains("-f mov"));
        assert_eq!(args.last().unwrap(), "/tmp/output_1.mov");
    }

    #[tokio::test]
    async fn test_missing_binary_reports_device_unavailable() {
        let mut device = FfmpegCaptureDevice::new(
            PathBuf::from("/nonexistent/kadence-ffmpeg"),
            CaptureSettings::default(),
        );
        let dir = tempfile::tempdir().unwrap();
        let (notifier, _finished) = finish_channel();

        let err = device
            .start_recording(&dir.path().join("a.mov"), notifier)
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::DeviceUnavailable(_)));

        // Stop without a running process is harmless
        device.stop_recording().await;
    }
}
