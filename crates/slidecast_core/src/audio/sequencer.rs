//! Slide track sequencing.
//!
//! Builds one continuous audio track per slide from its ordered
//! utterances: utterance, gap, utterance, gap, ..., utterance, trailing
//! pad. Utterances are appended in input order, never reordered by
//! speaker. Gaps and the pad are synthesized silence in the track's own
//! format.

use crate::config::AudioSettings;
use crate::models::{SlideAudioTrack, Utterance, Waveform};

use super::silence::synthesize_silence;

/// Timing configuration for track sequencing.
#[derive(Debug, Clone, Copy)]
pub struct SequencerConfig {
    /// Silence between consecutive utterances, in seconds.
    pub gap_secs: f64,
    /// Silence after the final utterance, in seconds.
    pub trailing_pad_secs: f64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self::from_settings(&AudioSettings::default())
    }
}

impl SequencerConfig {
    /// Build a config from the audio settings section.
    pub fn from_settings(settings: &AudioSettings) -> Self {
        Self {
            gap_secs: settings.gap_secs,
            trailing_pad_secs: settings.trailing_pad_secs,
        }
    }
}

/// Concatenate a slide's utterances into one track.
///
/// Unusable utterances (no samples) are dropped, not replaced by
/// silence. Returns `None` when no usable utterance remains; the caller
/// then takes the no-audio path for the slide.
///
/// For n usable utterances the track duration is
/// `Σ(utterance durations) + (n-1) * gap + trailing_pad`.
pub fn build_slide_track(
    utterances: &[Utterance],
    config: &SequencerConfig,
) -> Option<SlideAudioTrack> {
    let usable: Vec<&Utterance> = utterances.iter().filter(|u| u.is_usable()).collect();
    if usable.is_empty() {
        return None;
    }

    let format = usable[0].waveform.format;
    let gap = synthesize_silence(config.gap_secs, format);
    let pad = synthesize_silence(config.trailing_pad_secs, format);

    let mut waveform = Waveform::new(Vec::new(), format);
    for (i, utterance) in usable.iter().enumerate() {
        if i > 0 {
            waveform.extend(&gap);
        }
        waveform.extend(&utterance.waveform);
    }
    waveform.extend(&pad);

    Some(SlideAudioTrack {
        waveform,
        utterance_count: usable.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AudioFormat;
    use std::path::PathBuf;

    const RATE: u32 = 24_000;

    fn utterance(secs: f64, amplitude: f64) -> Utterance {
        let n = (secs * RATE as f64).round() as usize;
        Utterance::new(
            "speaker1",
            Waveform::new(vec![amplitude; n], AudioFormat::mono(RATE)),
            PathBuf::from("test.wav"),
        )
    }

    #[test]
    fn two_utterances_with_gap_and_pad() {
        // 1.0 s + 1.5 s speech, 0.3 s gap, 0.5 s pad -> 3.3 s track
        let utterances = vec![utterance(1.0, 0.5), utterance(1.5, 0.5)];
        let config = SequencerConfig {
            gap_secs: 0.3,
            trailing_pad_secs: 0.5,
        };

        let track = build_slide_track(&utterances, &config).unwrap();
        assert_eq!(track.utterance_count, 2);
        assert!((track.duration_secs() - 3.3).abs() < 0.001);
    }

    #[test]
    fn duration_invariant_holds() {
        let utterances = vec![utterance(0.7, 0.4), utterance(1.2, 0.4), utterance(0.4, 0.4)];
        let config = SequencerConfig::default();

        let track = build_slide_track(&utterances, &config).unwrap();
        let speech: f64 = utterances.iter().map(|u| u.duration_secs()).sum();
        let expected = speech + 2.0 * config.gap_secs + config.trailing_pad_secs;
        assert!((track.duration_secs() - expected).abs() < 0.001);
    }

    #[test]
    fn empty_input_yields_no_track() {
        assert!(build_slide_track(&[], &SequencerConfig::default()).is_none());
    }

    #[test]
    fn unusable_utterances_are_dropped() {
        let utterances = vec![utterance(0.0, 0.0), utterance(1.0, 0.5)];
        let track = build_slide_track(&utterances, &SequencerConfig::default()).unwrap();
        assert_eq!(track.utterance_count, 1);
    }

    #[test]
    fn only_unusable_utterances_yield_no_track() {
        let utterances = vec![utterance(0.0, 0.0), utterance(0.0, 0.0)];
        assert!(build_slide_track(&utterances, &SequencerConfig::default()).is_none());
    }

    #[test]
    fn input_order_is_preserved() {
        // Distinct amplitudes mark each utterance
        let utterances = vec![utterance(0.1, 0.2), utterance(0.1, 0.8)];
        let config = SequencerConfig {
            gap_secs: 0.1,
            trailing_pad_secs: 0.0,
        };

        let track = build_slide_track(&utterances, &config).unwrap();
        let samples = &track.waveform.samples;
        let utt_len = (0.1 * RATE as f64).round() as usize;
        let gap_len = (0.1 * RATE as f64).round() as usize;

        assert_eq!(samples[0], 0.2);
        // Gap between the two utterances is silent
        assert_eq!(samples[utt_len + gap_len / 2], 0.0);
        assert_eq!(samples[utt_len + gap_len], 0.8);
    }

    #[test]
    fn gap_sits_between_not_after() {
        let utterances = vec![utterance(0.2, 0.5)];
        let config = SequencerConfig {
            gap_secs: 0.3,
            trailing_pad_secs: 0.5,
        };

        // Single utterance: no gap, only the trailing pad
        let track = build_slide_track(&utterances, &config).unwrap();
        assert!((track.duration_secs() - 0.7).abs() < 0.001);
    }
}
