//! Timeline assembly: ordered concatenation and the global tail fade.
//!
//! Clips are ordered by parsed numeric slide index before concatenation.
//! The assembled timeline's audio gets one global fade-out over its final
//! seconds; the fade shapes amplitude only and never changes duration.

use crate::config::VideoSettings;
use crate::models::{AudioFormat, SlideClip, Timeline, Waveform};

use super::slides::slide_index;

/// Configuration for timeline assembly.
#[derive(Debug, Clone, Copy)]
pub struct AssemblerConfig {
    /// Global audio fade-out over the final seconds, clamped to the
    /// total duration.
    pub tail_fade_secs: f64,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self::from_settings(&VideoSettings::default())
    }
}

impl AssemblerConfig {
    /// Build a config from the video settings section.
    pub fn from_settings(settings: &VideoSettings) -> Self {
        Self {
            tail_fade_secs: settings.tail_fade_secs,
        }
    }
}

/// Assemble labeled clips into a timeline, ordered by numeric slide index.
///
/// Keys without a parsable index sort last in their original relative
/// order (stable sort).
pub fn assemble(labeled_clips: Vec<(String, SlideClip)>) -> Timeline {
    let mut labeled = labeled_clips;
    labeled.sort_by_key(|(key, _)| slide_index(key).unwrap_or(u64::MAX));

    Timeline::new(labeled.into_iter().map(|(_, clip)| clip).collect())
}

/// Concatenate the timeline's audio and apply the global tail fade.
///
/// Clips without a track contribute silence of their display duration,
/// so audio and video stay aligned slide by slide. The returned waveform's
/// duration equals the timeline's total duration.
pub fn render_timeline_audio(
    timeline: &Timeline,
    format: AudioFormat,
    config: &AssemblerConfig,
) -> Waveform {
    let mut audio = Waveform::new(Vec::new(), format);

    for clip in &timeline.clips {
        match &clip.track {
            Some(track) => audio.extend(&track.waveform),
            None => {
                let fill = crate::audio::synthesize_silence(clip.duration_secs, format);
                audio.extend(&fill);
            }
        }
    }

    apply_tail_fade(&mut audio, config.tail_fade_secs);
    audio
}

/// Apply a raised-cosine fade-out over the final `fade_secs`, in place.
///
/// The fade is clamped to the waveform length; sample count never changes.
fn apply_tail_fade(audio: &mut Waveform, fade_secs: f64) {
    if fade_secs <= 0.0 || audio.is_empty() {
        return;
    }

    let fade_len = ((fade_secs * audio.format.sample_rate as f64).round() as usize)
        .min(audio.sample_count());
    let start = audio.sample_count() - fade_len;

    for i in 0..fade_len {
        let phase = std::f64::consts::PI * (i + 1) as f64 / fade_len as f64;
        let gain = 0.5 * (1.0 + phase.cos());
        audio.samples[start + i] *= gain;
    }
}
