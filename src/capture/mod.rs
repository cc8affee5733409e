//! Camera capture
//!
//! The controller turns start/stop calls into recording sessions; devices
//! implement the actual camera access.

pub mod controller;
pub mod ffmpeg;
pub mod traits;

pub use controller::CaptureController;
pub use ffmpeg::FfmpegCaptureDevice;
pub use traits::{
    finish_channel, CaptureDevice, CaptureError, CaptureResult, FinishNotifier, RecordingState,
};
