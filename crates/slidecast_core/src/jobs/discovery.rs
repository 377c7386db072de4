//! Render spec discovery from the on-disk job layout.
//!
//! The upstream collaborators leave assets in a fixed layout:
//!
//! ```text
//! slides/<job>/slide_001.png
//! audio/<job>/slide_001_001_speaker1.wav
//!             slide_001_002_speaker2.wav
//! ```
//!
//! Slide index, utterance order, and speaker id all come from filenames.
//! Ordering authority is always the parsed integer.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::{RenderSpec, UtteranceSource};
use crate::timeline::slides::{image_slide_index, slide_key, sort_images_by_index};

/// Errors from render spec discovery.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("I/O error reading {dir}: {source}")]
    Io {
        dir: String,
        #[source]
        source: std::io::Error,
    },

    /// Zero slide images is fatal for a render.
    #[error("No slide images found in {0}")]
    NoSlideImages(String),
}

/// Image extensions the slide rasterizer produces.
const SLIDE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Build a render spec from a slides directory and an audio directory.
///
/// The audio directory may be missing or empty; slides then render with
/// their default duration. Zero slide images is an error.
pub fn discover_render_spec(
    slides_dir: &Path,
    audio_dir: &Path,
    output_path: impl Into<PathBuf>,
) -> Result<RenderSpec, DiscoveryError> {
    let mut slide_images = scan_slide_images(slides_dir)?;
    if slide_images.is_empty() {
        return Err(DiscoveryError::NoSlideImages(
            slides_dir.display().to_string(),
        ));
    }
    sort_images_by_index(&mut slide_images);

    let narration = scan_narration(audio_dir)?;

    Ok(RenderSpec::new(slide_images, narration, output_path))
}

/// Collect slide images with a parsable `slide_<n>` stem.
fn scan_slide_images(slides_dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let entries = std::fs::read_dir(slides_dir).map_err(|source| DiscoveryError::Io {
        dir: slides_dir.display().to_string(),
        source,
    })?;

    let mut images = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| DiscoveryError::Io {
            dir: slides_dir.display().to_string(),
            source,
        })?;
        let path = entry.path();

        let is_image = path
            .extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                SLIDE_EXTENSIONS.contains(&ext.as_str())
            })
            .unwrap_or(false);

        if is_image && image_slide_index(&path).is_some() {
            images.push(path);
        }
    }

    Ok(images)
}

/// Collect utterances grouped by slide key, ordered by sequence number.
///
/// Expected stem shape: `slide_<index>_<seq>_<speaker>`; the speaker part
/// may itself contain underscores. Files that don't match are ignored.
fn scan_narration(
    audio_dir: &Path,
) -> Result<HashMap<String, Vec<UtteranceSource>>, DiscoveryError> {
    if !audio_dir.exists() {
        tracing::warn!(
            "Audio directory {} does not exist; rendering without narration",
            audio_dir.display()
        );
        return Ok(HashMap::new());
    }

    let entries = std::fs::read_dir(audio_dir).map_err(|source| DiscoveryError::Io {
        dir: audio_dir.display().to_string(),
        source,
    })?;

    let mut grouped: HashMap<u64, Vec<(u64, UtteranceSource)>> = HashMap::new();
    for entry in entries {
        let entry = entry.map_err(|source| DiscoveryError::Io {
            dir: audio_dir.display().to_string(),
            source,
        })?;
        let path = entry.path();

        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            continue;
        };
        let Some((index, seq, speaker)) = parse_utterance_stem(&stem) else {
            continue;
        };

        grouped
            .entry(index)
            .or_default()
            .push((seq, UtteranceSource::new(speaker, path)));
    }

    let mut narration = HashMap::new();
    for (index, mut utterances) in grouped {
        utterances.sort_by_key(|(seq, _)| *seq);
        narration.insert(
            slide_key(index),
            utterances.into_iter().map(|(_, u)| u).collect(),
        );
    }

    Ok(narration)
}

/// Parse `slide_<index>_<seq>_<speaker>` into its parts.
fn parse_utterance_stem(stem: &str) -> Option<(u64, u64, String)> {
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() < 4 || parts[0] != "slide" {
        return None;
    }

    let index: u64 = parts[1].parse().ok()?;
    let seq: u64 = parts[2].parse().ok()?;
    let speaker = parts[3..].join("_");
    if speaker.is_empty() {
        return None;
    }

    Some((index, seq, speaker))
}
