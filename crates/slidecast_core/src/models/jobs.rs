//! Render job data structures (specs, utterance manifests, results).

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One listed utterance for a slide: who speaks and where the audio lives.
///
/// The path may point to a missing file; that is non-fatal and the
/// utterance is skipped during track building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtteranceSource {
    /// Speaker identifier (e.g. "speaker1").
    pub speaker: String,
    /// Path to the synthesized audio clip.
    pub audio_path: PathBuf,
}

impl UtteranceSource {
    /// Create an utterance source.
    pub fn new(speaker: impl Into<String>, audio_path: impl Into<PathBuf>) -> Self {
        Self {
            speaker: speaker.into(),
            audio_path: audio_path.into(),
        }
    }
}

/// Specification for one render job.
///
/// Slide keys in `narration` follow the `slide_<n>` convention; ordering
/// authority everywhere is the parsed integer, never string comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSpec {
    /// Slide images with fixed-width numeric suffixes (e.g. `slide_003.png`).
    pub slide_images: Vec<PathBuf>,
    /// Ordered utterances per slide key (e.g. "slide_3").
    pub narration: HashMap<String, Vec<UtteranceSource>>,
    /// Caller-supplied output file path.
    pub output_path: PathBuf,
    /// Optional subset of slide indices to render; `None` renders all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide_filter: Option<Vec<u64>>,
}

impl RenderSpec {
    /// Create a spec covering all slides.
    pub fn new(
        slide_images: Vec<PathBuf>,
        narration: HashMap<String, Vec<UtteranceSource>>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            slide_images,
            narration,
            output_path: output_path.into(),
            slide_filter: None,
        }
    }

    /// Restrict the render to the given slide indices.
    pub fn with_slide_filter(mut self, indices: Vec<u64>) -> Self {
        self.slide_filter = Some(indices);
        self
    }

    /// Whether a slide index is included by the filter.
    pub fn includes_slide(&self, index: u64) -> bool {
        match &self.slide_filter {
            Some(indices) => indices.contains(&index),
            None => true,
        }
    }

    /// Utterances listed for a slide key, empty slice when none.
    pub fn utterances_for(&self, slide_key: &str) -> &[UtteranceSource] {
        self.narration
            .get(slide_key)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

/// Result handed back to the job controller after a render attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResult {
    /// Job ID that was processed.
    pub job_id: String,
    /// Whether the render completed successfully.
    pub success: bool,
    /// Path to the output video (if successful).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    /// Classified error kind (if failed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    /// Human-readable error message (if failed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RenderResult {
    /// Create a successful result.
    pub fn success(job_id: impl Into<String>, output_path: PathBuf) -> Self {
        Self {
            job_id: job_id.into(),
            success: true,
            output_path: Some(output_path),
            error_kind: None,
            error: None,
        }
    }

    /// Create a failed result with a classified error.
    pub fn failure(
        job_id: impl Into<String>,
        kind: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            success: false,
            output_path: None,
            error_kind: Some(kind.into()),
            error: Some(error.into()),
        }
    }
}
