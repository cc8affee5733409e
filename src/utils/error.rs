//! Error types and handling
//!
//! Common error types used across the application. Each pipeline stage owns
//! its own error enum; `AppError` gathers them for the embedding shell.

use crate::assembler::MergeError;
use crate::capture::CaptureError;
use crate::pipeline::PipelineStage;
use crate::publish::PublishError;
use crate::selection::SelectionError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    #[error("Merge cancelled")]
    MergeCancelled,

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Pipeline busy: {0:?} in progress")]
    Busy(PipelineStage),
}

/// Error response for the embedding shell
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        let code = match &error {
            AppError::Capture(_) => "CAPTURE_ERROR",
            AppError::Selection(_) => "SELECTION_ERROR",
            AppError::Merge(MergeError::TrackMissing(_)) => "TRACK_MISSING",
            AppError::Merge(MergeError::CompositionInsert(_)) => "COMPOSITION_INSERT_ERROR",
            AppError::Merge(_) => "EXPORT_ERROR",
            AppError::MergeCancelled => "EXPORT_CANCELLED",
            AppError::Publish(PublishError::PermissionDenied) => "PERMISSION_DENIED",
            AppError::Publish(_) => "PUBLISH_ERROR",
            AppError::Busy(_) => "PIPELINE_BUSY",
        };

        ErrorResponse {
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
