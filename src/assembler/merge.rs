//! Media assembler
//!
//! Combines a recorded video with the selected background track: inspect both
//! sources, build the composition, export it, and report exactly one outcome.

use super::composition::build_composition;
use super::export::{ExportEngine, ExportJob, ProgressCallback};
use super::probe::{AssetInfo, MediaInspector, StreamInfo};
use super::types::{
    ContainerFormat, ExportProgress, ExportQuality, ExportStatus, MergeError, MergeOutcome,
    MergeRequest, TrackKind,
};
use std::path::Path;
use std::sync::Arc;

/// Builds and exports video + audio compositions
pub struct MediaAssembler {
    inspector: Arc<dyn MediaInspector>,
    engine: Arc<dyn ExportEngine>,
    quality: ExportQuality,
    container: ContainerFormat,
}

impl MediaAssembler {
    /// Create an assembler exporting at the highest quality into a `.mov`
    /// container
    pub fn new(inspector: Arc<dyn MediaInspector>, engine: Arc<dyn ExportEngine>) -> Self {
        Self {
            inspector,
            engine,
            quality: ExportQuality::Highest,
            container: ContainerFormat::Mov,
        }
    }

    /// Run one merge job
    pub async fn assemble(&self, request: MergeRequest) -> MergeOutcome {
        self.assemble_with_progress(request, Arc::new(|_| {})).await
    }

    /// Run one merge job, forwarding export progress to `progress`
    pub async fn assemble_with_progress(
        &self,
        request: MergeRequest,
        progress: ProgressCallback,
    ) -> MergeOutcome {
        tracing::info!(
            "Assembling {:?} + {:?} -> {:?}",
            request.video_location,
            request.audio_location,
            request.output_location
        );
        progress(ExportProgress::preparing());

        let outcome = match self.run(&request, progress).await {
            Ok(outcome) => outcome,
            Err(error) => MergeOutcome::failed(error),
        };

        match &outcome {
            MergeOutcome::Success { output_location } => {
                tracing::info!("Merged video and audio successfully: {:?}", output_location)
            }
            MergeOutcome::Failed { error } => {
                tracing::error!("Error merging video and audio: {}", error)
            }
            MergeOutcome::Cancelled => tracing::warn!("Merge export cancelled"),
        }
        outcome
    }

    async fn run(
        &self,
        request: &MergeRequest,
        progress: ProgressCallback,
    ) -> Result<MergeOutcome, MergeError> {
        let (video_asset, video_stream) = self
            .first_stream(&request.video_location, TrackKind::Video)
            .await?;
        let (audio_asset, audio_stream) = self
            .first_stream(&request.audio_location, TrackKind::Audio)
            .await?;

        let composition = build_composition(
            &request.video_location,
            &video_asset,
            &video_stream,
            &request.audio_location,
            &audio_asset,
            &audio_stream,
        )?;
        let total_ms = composition.duration.as_millis() as u64;

        tracing::debug!(
            "Composition: {:?} long, audio audible for {:?}",
            composition.duration,
            composition.audible_range().duration
        );

        let job = ExportJob {
            composition,
            output_path: request.output_location.clone(),
            quality: self.quality,
            container: self.container,
            optimize_for_network: true,
        };

        match self.engine.export(&job, progress.clone()).await {
            ExportStatus::Completed => {
                if !job.output_path.exists() {
                    return Err(MergeError::Export(format!(
                        "export reported completion but {:?} was not written",
                        job.output_path
                    )));
                }
                self.verify_output(&job.output_path).await?;
                progress(ExportProgress::complete(total_ms));
                Ok(MergeOutcome::Success {
                    output_location: job.output_path,
                })
            }
            ExportStatus::Failed(reason) => Err(MergeError::Export(reason)),
            ExportStatus::Cancelled => Ok(MergeOutcome::Cancelled),
            ExportStatus::Unrecognized(status) => {
                tracing::warn!("Export engine reported unrecognized status: {}", status);
                Err(MergeError::UnknownExportStatus(status))
            }
        }
    }

    /// Check that the exported file holds both a video and an audio stream
    async fn verify_output(&self, path: &Path) -> Result<(), MergeError> {
        let asset = self.inspector.inspect(path).await.map_err(|e| {
            MergeError::Export(format!("exported file {:?} is unreadable: {}", path, e))
        })?;

        for kind in [TrackKind::Video, TrackKind::Audio] {
            if asset.first_stream(kind).is_none() {
                return Err(MergeError::Export(format!(
                    "exported file {:?} has no {} stream",
                    path, kind
                )));
            }
        }
        Ok(())
    }

    /// Inspect `path` and return its first stream of `kind`.
    ///
    /// An unreadable or missing asset counts as lacking the stream.
    async fn first_stream(
        &self,
        path: &Path,
        kind: TrackKind,
    ) -> Result<(AssetInfo, StreamInfo), MergeError> {
        let asset = self.inspector.inspect(path).await.map_err(|e| {
            tracing::warn!("Cannot inspect {} source {:?}: {}", kind, path, e);
            MergeError::TrackMissing(kind)
        })?;

        let stream = asset
            .first_stream(kind)
            .cloned()
            .ok_or(MergeError::TrackMissing(kind))?;
        Ok((asset, stream))
    }
}
