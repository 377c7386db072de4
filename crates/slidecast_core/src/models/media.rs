//! Media data structures: waveforms, utterances, tracks, clips, timeline.
//!
//! All audio flows through the engine as mono `f64` samples. Structures
//! here are built once per render call, owned exclusively by that job,
//! and dropped when the render finishes.

use std::path::PathBuf;

/// Sample format shared by every waveform in one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Samples per second.
    pub sample_rate: u32,
    /// Channel count (the engine works in mono).
    pub channels: u16,
}

impl AudioFormat {
    /// Mono format at the given sample rate.
    pub fn mono(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 1,
        }
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        // VOICEVOX-style synthesis output rate.
        Self::mono(24_000)
    }
}

/// A mono audio buffer with its format.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Samples in [-1.0, 1.0].
    pub samples: Vec<f64>,
    /// Sample format.
    pub format: AudioFormat,
}

impl Waveform {
    /// Create a waveform from samples.
    pub fn new(samples: Vec<f64>, format: AudioFormat) -> Self {
        Self { samples, format }
    }

    /// Number of samples.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.format.sample_rate as f64
    }

    /// Whether the waveform holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f64 {
        self.samples.iter().fold(0.0, |acc, s| acc.max(s.abs()))
    }

    /// Scale every sample by `gain` in place.
    pub fn scale(&mut self, gain: f64) {
        for sample in &mut self.samples {
            *sample *= gain;
        }
    }

    /// Append another waveform's samples.
    ///
    /// Both waveforms must share the same format; the engine decodes
    /// everything to one working format before sequencing.
    pub fn extend(&mut self, other: &Waveform) {
        debug_assert_eq!(self.format, other.format);
        self.samples.extend_from_slice(&other.samples);
    }
}

/// One speaker's synthesized speech segment for one dialogue line.
#[derive(Debug, Clone)]
pub struct Utterance {
    /// Speaker identifier (from the synthesis collaborator).
    pub speaker: String,
    /// Decoded and cleaned audio.
    pub waveform: Waveform,
    /// File the audio was decoded from (for diagnostics).
    pub source: PathBuf,
}

impl Utterance {
    /// Create an utterance.
    pub fn new(speaker: impl Into<String>, waveform: Waveform, source: PathBuf) -> Self {
        Self {
            speaker: speaker.into(),
            waveform,
            source,
        }
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.waveform.duration_secs()
    }

    /// A zero-duration utterance is treated as absent and skipped.
    pub fn is_usable(&self) -> bool {
        !self.waveform.is_empty()
    }
}

/// The concatenated audio belonging to one slide (speech + gaps + pad).
#[derive(Debug, Clone)]
pub struct SlideAudioTrack {
    /// Concatenated waveform.
    pub waveform: Waveform,
    /// Number of utterances folded into the track.
    pub utterance_count: usize,
}

impl SlideAudioTrack {
    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.waveform.duration_secs()
    }
}

/// One slide image bound to its display duration and audio.
///
/// Invariant: `duration_secs == track.duration_secs()` whenever a track
/// is present. The composer attaches a silent track to no-audio slides
/// so every clip in a timeline carries audio of matching format.
#[derive(Debug, Clone)]
pub struct SlideClip {
    /// Slide image (already prepared for the renderer).
    pub image: PathBuf,
    /// On-screen duration in seconds.
    pub duration_secs: f64,
    /// Slide audio, silent for slides without narration.
    pub track: Option<SlideAudioTrack>,
    /// Whether the slide had any usable narration.
    pub narrated: bool,
}

impl SlideClip {
    /// Create a clip from a narrated track.
    pub fn narrated(image: PathBuf, track: SlideAudioTrack) -> Self {
        Self {
            image,
            duration_secs: track.duration_secs(),
            track: Some(track),
            narrated: true,
        }
    }

    /// Create a clip with a silent fill track.
    pub fn silent(image: PathBuf, track: SlideAudioTrack) -> Self {
        Self {
            image,
            duration_secs: track.duration_secs(),
            track: Some(track),
            narrated: false,
        }
    }
}

/// The full ordered sequence of slide clips composing the final video.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    /// Clips in numeric slide order.
    pub clips: Vec<SlideClip>,
}

impl Timeline {
    /// Create a timeline from ordered clips.
    pub fn new(clips: Vec<SlideClip>) -> Self {
        Self { clips }
    }

    /// Total duration in seconds.
    pub fn total_duration_secs(&self) -> f64 {
        self.clips.iter().map(|c| c.duration_secs).sum()
    }

    /// Start offset of each clip, in seconds.
    ///
    /// Offsets are monotonically non-decreasing by construction.
    pub fn start_offsets(&self) -> Vec<f64> {
        let mut offsets = Vec::with_capacity(self.clips.len());
        let mut cursor = 0.0;
        for clip in &self.clips {
            offsets.push(cursor);
            cursor += clip.duration_secs;
        }
        offsets
    }

    /// Number of clips.
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Whether the timeline holds no clips.
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}
