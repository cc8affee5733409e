//! Monitor playback
//!
//! Plays the selected track while the camera records so the performer can
//! hear it. Best-effort only: nothing here is timed against the capture and
//! none of it ends up in the exported file.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::{Child, Command};

/// Playback errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("Audio source not found: {0}")]
    SourceNotFound(String),

    #[error("Playback backend error: {0}")]
    Backend(String),
}

/// Something that can play an audio file out loud
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    async fn play(&mut self, source: &Path) -> Result<(), PlaybackError>;

    /// Halt playback. Must be safe to call when nothing plays.
    async fn stop(&mut self);
}

/// Player backed by `ffplay` without a window
pub struct FfplayPlayer {
    ffplay_path: PathBuf,
    child: Option<Child>,
}

impl FfplayPlayer {
    pub fn new(ffplay_path: PathBuf) -> Self {
        Self {
            ffplay_path,
            child: None,
        }
    }
}

#[async_trait]
impl AudioPlayer for FfplayPlayer {
    async fn play(&mut self, source: &Path) -> Result<(), PlaybackError> {
        let child = Command::new(&self.ffplay_path)
            .args(["-nodisp", "-autoexit", "-loglevel", "error"])
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PlaybackError::Backend(format!("Failed to start ffplay: {}", e)))?;

        self.child = Some(child);
        Ok(())
    }

    async fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                tracing::debug!("ffplay already gone: {}", e);
            }
        }
    }
}

/// Local playback of the background track during recording
pub struct MonitorPlayback {
    player: Box<dyn AudioPlayer>,
    playing: Option<PathBuf>,
}

impl MonitorPlayback {
    pub fn new(player: Box<dyn AudioPlayer>) -> Self {
        Self {
            player,
            playing: None,
        }
    }

    /// Start playing `source`, replacing whatever was playing
    pub async fn play(&mut self, source: &Path) -> Result<(), PlaybackError> {
        if !source.exists() {
            return Err(PlaybackError::SourceNotFound(source.to_string_lossy().to_string()));
        }

        self.stop().await;
        self.player.play(source).await?;
        tracing::info!("Monitor playback started: {:?}", source);
        self.playing = Some(source.to_path_buf());
        Ok(())
    }

    /// Halt playback immediately; no-op when idle
    pub async fn stop(&mut self) {
        if let Some(source) = self.playing.take() {
            self.player.stop().await;
            tracing::info!("Monitor playback stopped: {:?}", source);
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakePlayer, PlayerLog};
    use tempfile::tempdir;

    fn monitor() -> (MonitorPlayback, PlayerLog) {
        let player = FakePlayer::new();
        let log = player.log();
        (MonitorPlayback::new(Box::new(player)), log)
    }

    #[tokio::test]
    async fn test_play_then_stop() {
        let dir = tempdir().unwrap();
        let track = dir.path().join("track.m4a");
        std::fs::write(&track, b"audio").unwrap();
        let (mut monitor, log) = monitor();

        monitor.play(&track).await.unwrap();
        assert!(monitor.is_playing());
        monitor.stop().await;
        assert!(!monitor.is_playing());

        assert_eq!(
            log.lock().as_slice(),
            &[format!("play {}", track.display()), "stop".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_source_is_rejected_without_touching_player() {
        let (mut monitor, log) = monitor();
        let err = monitor.play(Path::new("/nonexistent/track.m4a")).await.unwrap_err();
        assert!(matches!(err, PlaybackError::SourceNotFound(_)));
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let (mut monitor, log) = monitor();
        monitor.stop().await;
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_play_replaces_current_track() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("a.m4a");
        let second = dir.path().join("b.m4a");
        std::fs::write(&first, b"a").unwrap();
        std::fs::write(&second, b"b").unwrap();
        let (mut monitor, log) = monitor();

        monitor.play(&first).await.unwrap();
        monitor.play(&second).await.unwrap();

        let log = log.lock();
        assert_eq!(log.len(), 3);
        assert_eq!(log[1], "stop");
    }

    #[tokio::test]
    async fn test_ffplay_missing_binary_is_backend_error() {
        let dir = tempdir().unwrap();
        let track = dir.path().join("track.m4a");
        std::fs::write(&track, b"audio").unwrap();
        let mut monitor = MonitorPlayback::new(Box::new(FfplayPlayer::new(PathBuf::from(
            "/nonexistent/kadence-ffplay",
        ))));

        let err = monitor.play(&track).await.unwrap_err();
        assert!(matches!(err, PlaybackError::Backend(_)));
        assert!(!monitor.is_playing());
    }
}
