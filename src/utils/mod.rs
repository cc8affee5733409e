//! Shared utilities

pub mod error;
pub mod paths;
pub mod process;

pub use error::{AppError, AppResult, ErrorResponse};
pub use paths::unique_media_path;
