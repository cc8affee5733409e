//! Export engine seam
//!
//! An engine renders a composition into a single container file and reports
//! how it stopped.

use super::composition::Composition;
use super::types::{ContainerFormat, ExportProgress, ExportQuality, ExportStatus};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Callback receiving export progress updates
pub type ProgressCallback = Arc<dyn Fn(ExportProgress) + Send + Sync>;

/// Everything an engine needs to render one composition
#[derive(Debug, Clone, PartialEq)]
pub struct ExportJob {
    pub composition: Composition,
    pub output_path: PathBuf,
    pub quality: ExportQuality,
    pub container: ContainerFormat,
    /// Place the index at the front of the file for progressive playback
    pub optimize_for_network: bool,
}

/// Renders compositions to files
#[async_trait]
pub trait ExportEngine: Send + Sync {
    /// Run the export to completion and report its terminal status
    async fn export(&self, job: &ExportJob, progress: ProgressCallback) -> ExportStatus;
}
