//! Core types for the render pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::logging::JobLogger;
use crate::models::{AudioFormat, RenderSpec, SlideAudioTrack, Timeline};

use super::temp::TempRegistry;

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (step_name, percent_complete, message)
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// Read-only context passed to pipeline steps.
///
/// Contains the job specification and shared resources that steps can
/// read but not modify. Mutable state goes in `JobState`.
pub struct Context {
    /// Render specification (slides, narration, output path).
    pub spec: RenderSpec,
    /// Engine settings.
    pub settings: Settings,
    /// Job name/identifier.
    pub job_name: String,
    /// Job-specific working directory (under the work root).
    pub work_dir: PathBuf,
    /// Per-job logger.
    pub logger: Arc<JobLogger>,
    /// Registry of temporary files, swept on every exit path.
    pub temp: Arc<TempRegistry>,
    /// Optional progress callback.
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    /// Create a new context for a job.
    pub fn new(
        spec: RenderSpec,
        settings: Settings,
        job_name: impl Into<String>,
        work_dir: PathBuf,
        logger: Arc<JobLogger>,
    ) -> Self {
        Self {
            spec,
            settings,
            job_name: job_name.into(),
            work_dir,
            logger,
            temp: Arc::new(TempRegistry::new()),
            progress_callback: None,
        }
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to the callback (if set).
    pub fn report_progress(&self, step_name: &str, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(step_name, percent, message);
        }
    }

    /// The engine's working audio format for this job.
    pub fn audio_format(&self) -> AudioFormat {
        AudioFormat::mono(self.settings.audio.sample_rate)
    }
}

/// Mutable job state that accumulates results from pipeline steps.
///
/// Each step's output is stored in its own section. Steps add new data;
/// only the Compose step consumes the track list it needs to move into
/// the timeline.
#[derive(Debug, Default)]
pub struct JobState {
    /// Unique job identifier.
    pub job_id: String,
    /// When the job started.
    pub started_at: Option<String>,
    /// Per-slide tracks (from the BuildTracks step).
    pub tracks: Option<TracksOutput>,
    /// Assembled timeline (from the Compose step).
    pub timeline: Option<ComposeOutput>,
    /// Encode results (from the Encode step).
    pub encode: Option<EncodeOutput>,
}

impl JobState {
    /// Create a new job state with the given ID.
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// Check if track building has been completed.
    pub fn has_tracks(&self) -> bool {
        self.tracks.is_some()
    }

    /// Check if the timeline has been composed.
    pub fn has_timeline(&self) -> bool {
        self.timeline.is_some()
    }
}

/// One slide's build result: key, ordering index, image, optional track.
#[derive(Debug)]
pub struct SlideTrackEntry {
    /// Narration key ("slide_3").
    pub key: String,
    /// Parsed numeric slide index.
    pub index: u64,
    /// Source slide image.
    pub image: PathBuf,
    /// Sequenced track, `None` when the slide has no usable narration.
    pub track: Option<SlideAudioTrack>,
}

/// Output from the BuildTracks step.
///
/// The counters surface degradation the step absorbed: skipped files,
/// cleanup fallbacks, and slides left silent.
#[derive(Debug, Default)]
pub struct TracksOutput {
    /// Per-slide results in numeric order. Consumed by the Compose step.
    pub slides: Vec<SlideTrackEntry>,
    /// Listed utterance files that were missing or undecodable.
    pub missing_files: usize,
    /// Utterances that fell back to their unfiltered waveform.
    pub filter_fallbacks: usize,
    /// Slides rendered with a silent default-duration track.
    pub silent_slides: usize,
}

/// Output from the Compose step.
#[derive(Debug)]
pub struct ComposeOutput {
    /// The assembled timeline, ready for encoding.
    pub timeline: Timeline,
}

/// Output from the Encode step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeOutput {
    /// Path to the final video file.
    pub output_path: PathBuf,
    /// Encoder exit code.
    pub exit_code: i32,
    /// Encoder command that was run.
    pub command: String,
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (preconditions not met, but not an error).
    Skipped(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_state_tracks_completion() {
        let mut state = JobState::new("test-123");
        assert!(!state.has_tracks());

        state.tracks = Some(TracksOutput::default());
        assert!(state.has_tracks());
        assert!(!state.has_timeline());
    }

    #[test]
    fn encode_output_serializes() {
        let output = EncodeOutput {
            output_path: PathBuf::from("/output/deck.mp4"),
            exit_code: 0,
            command: "ffmpeg -y ...".to_string(),
        };
        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("deck.mp4"));
        assert!(json.contains("\"exit_code\":0"));
    }
}
