//! Render pipeline for coordinating job execution.
//!
//! This module provides the infrastructure for running the render
//! pipeline. Each job consists of a sequence of steps that validate,
//! execute, and record their results.
//!
//! # Architecture
//!
//! ```text
//! Pipeline
//!     ├── Step: BuildTracks   (decode, clean, sequence per-slide audio)
//!     ├── Step: Compose       (frame prep, clip durations, timeline)
//!     └── Step: Encode        (tail fade, manifest, renderer)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use slidecast_core::render::{create_render_pipeline, Context, JobState};
//!
//! let pipeline = create_render_pipeline();
//! let ctx = Context::new(spec, settings, "my_job", work_dir, logger);
//! let mut state = JobState::new("job-123");
//!
//! let result = pipeline.run(&ctx, &mut state)?;
//! println!("Completed: {:?}", result.steps_completed);
//! ```

mod errors;
mod pipeline;
mod processor;
mod step;
pub mod steps;
mod temp;
mod types;

pub use errors::{PipelineResult, RenderError, StepError, StepResult};
pub use pipeline::{CancelHandle, Pipeline, PipelineRunResult};
pub use processor::{spawn_job, RenderProcessor};
pub use step::PipelineStep;
pub use steps::{BuildTracksStep, ComposeStep, EncodeStep};
pub use temp::{manifest_path, timeline_wav_path, TempRegistry};
pub use types::{
    ComposeOutput, Context, EncodeOutput, JobState, ProgressCallback, SlideTrackEntry,
    StepOutcome, TracksOutput,
};

/// Create the standard render pipeline with all steps in order.
///
/// 1. BuildTracks - decode, clean, and sequence per-slide audio
/// 2. Compose - prepare frames, bind durations, assemble the timeline
/// 3. Encode - write the timeline audio and manifest, run the renderer
pub fn create_render_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(BuildTracksStep::new())
        .with_step(ComposeStep::new())
        .with_step(EncodeStep::new())
}
