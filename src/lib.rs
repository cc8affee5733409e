//! Kadence - record a video while a backing track plays, then merge the two.
//!
//! This is the main library crate for the Kadence recorder. It provides the
//! capture → merge → publish pipeline and its ffmpeg-backed collaborators.

pub mod assembler;
pub mod capture;
pub mod config;
pub mod pipeline;
pub mod playback;
pub mod publish;
pub mod selection;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{CaptureSettings, PipelineConfig};
pub use pipeline::{PipelineCoordinator, PipelineEvent, PipelineOutcome, PipelineRun, PipelineStage};
pub use utils::{AppError, AppResult, ErrorResponse};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging.
///
/// `RUST_LOG` overrides the default filter. Calling this more than once is
/// harmless; only the first subscriber is installed.
pub fn init_tracing() {
    let installed = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kadence_lib=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Starting Kadence v{}", env!("CARGO_PKG_VERSION"));
    }
}
