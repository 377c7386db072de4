//! Slide composition: binds one slide image to its computed duration.
//!
//! Narrated slides take their track's duration exactly. Slides without
//! usable narration get the configured default duration and a silent
//! track of the same length, so every clip in the timeline carries audio
//! of matching format and concatenation stays well-defined.

use std::path::PathBuf;

use crate::audio::synthesize_silence;
use crate::config::VideoSettings;
use crate::models::{AudioFormat, SlideAudioTrack, SlideClip};

/// Configuration for slide composition.
#[derive(Debug, Clone, Copy)]
pub struct ComposerConfig {
    /// On-screen duration for slides without narration, in seconds.
    pub default_slide_secs: f64,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self::from_settings(&VideoSettings::default())
    }
}

impl ComposerConfig {
    /// Build a config from the video settings section.
    pub fn from_settings(settings: &VideoSettings) -> Self {
        Self {
            default_slide_secs: settings.default_slide_secs,
        }
    }
}

/// Compose one slide clip from a prepared image and an optional track.
///
/// `format` is the engine's working audio format, used to synthesize the
/// silent fill track for no-audio slides.
pub fn compose_slide(
    image: PathBuf,
    track: Option<SlideAudioTrack>,
    config: &ComposerConfig,
    format: AudioFormat,
) -> SlideClip {
    match track {
        Some(track) => SlideClip::narrated(image, track),
        None => {
            let silent = SlideAudioTrack {
                waveform: synthesize_silence(config.default_slide_secs, format),
                utterance_count: 0,
            };
            SlideClip::silent(image, silent)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Waveform;

    const RATE: u32 = 24_000;

    fn track_of(secs: f64) -> SlideAudioTrack {
        let n = (secs * RATE as f64).round() as usize;
        SlideAudioTrack {
            waveform: Waveform::new(vec![0.3; n], AudioFormat::mono(RATE)),
            utterance_count: 1,
        }
    }

    #[test]
    fn narrated_clip_takes_track_duration() {
        let clip = compose_slide(
            PathBuf::from("slide_001.png"),
            Some(track_of(3.3)),
            &ComposerConfig::default(),
            AudioFormat::mono(RATE),
        );

        assert!(clip.narrated);
        assert!((clip.duration_secs - 3.3).abs() < 0.001);
        let track = clip.track.unwrap();
        assert!((track.duration_secs() - clip.duration_secs).abs() < 1e-9);
    }

    #[test]
    fn silent_clip_uses_default_duration() {
        let config = ComposerConfig {
            default_slide_secs: 5.0,
        };
        let clip = compose_slide(
            PathBuf::from("slide_002.png"),
            None,
            &config,
            AudioFormat::mono(RATE),
        );

        assert!(!clip.narrated);
        assert!((clip.duration_secs - 5.0).abs() < 0.001);

        // Format parity: the fill track is real silence in the working format
        let track = clip.track.unwrap();
        assert_eq!(track.utterance_count, 0);
        assert_eq!(track.waveform.format, AudioFormat::mono(RATE));
        assert_eq!(track.waveform.sample_count(), 5 * RATE as usize);
        assert!(track.waveform.samples.iter().all(|&s| s == 0.0));
    }
}
