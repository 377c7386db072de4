//! Core enums used throughout the engine.

use serde::{Deserialize, Serialize};

/// Lifecycle of a render job.
///
/// Driven by the processor as the pipeline advances. Utterance- and
/// slide-level problems never change the status; only encoding failures
/// (or missing slide images) move a job to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStatus {
    /// Job created, not yet started.
    #[default]
    Pending,
    /// Building per-slide audio tracks.
    BuildingTracks,
    /// Composing slide clips into the timeline.
    Composing,
    /// Encoding the final video.
    Encoding,
    /// Render finished, output file available.
    Done,
    /// Render failed with a classified error.
    Failed,
}

impl RenderStatus {
    /// Whether the job has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RenderStatus::Done | RenderStatus::Failed)
    }

    /// Display name used in job store messages.
    pub fn name(&self) -> &'static str {
        match self {
            RenderStatus::Pending => "pending",
            RenderStatus::BuildingTracks => "building_tracks",
            RenderStatus::Composing => "composing",
            RenderStatus::Encoding => "encoding",
            RenderStatus::Done => "done",
            RenderStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RenderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
