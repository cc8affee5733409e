//! Recording pipeline
//!
//! Ties capture, monitor playback, merging and publishing together:
//! - PipelineCoordinator owns the state machine and the collaborators
//! - PipelineRun delivers the outcome of one recording after stop

pub mod coordinator;
pub mod state;

pub use coordinator::{PipelineCoordinator, PipelineParts};
pub use state::{PipelineEvent, PipelineOutcome, PipelineRun, PipelineStage};
