//! Media assembly
//!
//! This module merges a recorded video with a background track: asset
//! inspection, composition building, export and outcome reporting.

pub mod composition;
pub mod export;
pub mod ffmpeg;
pub mod merge;
pub mod probe;
pub mod types;

pub use composition::{build_composition, Composition, CompositionTrack, TimeRange};
pub use export::{ExportEngine, ExportJob, ProgressCallback};
pub use ffmpeg::FfmpegExportEngine;
pub use merge::MediaAssembler;
pub use probe::{AssetInfo, FfprobeInspector, MediaInspector, ProbeError, StreamInfo};
pub use types::{
    ContainerFormat, ExportProgress, ExportQuality, ExportStage, ExportStatus, MergeError,
    MergeOutcome, MergeRequest, TrackKind,
};
