//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.
//! Every timing and filter constant the engine uses lives here; nothing is
//! tuned by swapping code paths.

use serde::{Deserialize, Serialize};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Audio cleanup and sequencing settings.
    #[serde(default)]
    pub audio: AudioSettings,

    /// Video composition and encoding settings.
    #[serde(default)]
    pub video: VideoSettings,
}

/// Identifies one settings section for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Logging,
    Audio,
    Video,
}

impl ConfigSection {
    /// TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Audio => "audio",
            ConfigSection::Video => "video",
        }
    }
}

/// Path configuration for output, work, and log directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Output folder for rendered videos.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Root folder for per-job working files.
    #[serde(default = "default_work_root")]
    pub work_root: String,

    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_output_folder() -> String {
    "output".to_string()
}

fn default_work_root() -> String {
    ".work".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            work_root: default_work_root(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact log format (filter progress, show tail on error).
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of command output lines kept for error diagnosis.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Log the full encoder argument list before running it.
    #[serde(default)]
    pub show_encoder_args: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
            show_encoder_args: false,
        }
    }
}

/// Audio cleanup and sequencing settings.
///
/// Defaults come from the synthesis engine this pipeline was tuned
/// against: 24 kHz mono output with tonal artifacts in the 1-3 kHz band
/// and clicks at clip boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Working sample rate; every utterance is decoded to this rate.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Whether to run artifact cleanup on each utterance.
    #[serde(default = "default_true")]
    pub cleanup_enabled: bool,

    /// Low-pass cutoff in Hz (valid range 6000-10000).
    #[serde(default = "default_lowpass_cutoff_hz")]
    pub lowpass_cutoff_hz: f64,

    /// Butterworth filter order (valid range 4-8).
    #[serde(default = "default_filter_order")]
    pub filter_order: u32,

    /// Whether to run the tonal-artifact notch bank.
    #[serde(default = "default_true")]
    pub notch_enabled: bool,

    /// Notch quality factor; high Q keeps the conversational band intact.
    #[serde(default = "default_notch_q")]
    pub notch_q: f64,

    /// Raised-cosine edge fade length in milliseconds (valid range 10-50).
    #[serde(default = "default_edge_fade_ms")]
    pub edge_fade_ms: f64,

    /// Peak amplitude target after cleanup.
    #[serde(default = "default_target_peak")]
    pub target_peak: f64,

    /// Gain applied to each utterance after cleanup.
    #[serde(default = "default_utterance_gain")]
    pub utterance_gain: f64,

    /// Silence inserted between consecutive utterances, in seconds.
    #[serde(default = "default_gap_secs")]
    pub gap_secs: f64,

    /// Silence appended after a slide's final utterance, in seconds.
    #[serde(default = "default_trailing_pad_secs")]
    pub trailing_pad_secs: f64,
}

fn default_sample_rate() -> u32 {
    24_000
}

fn default_lowpass_cutoff_hz() -> f64 {
    8_000.0
}

fn default_filter_order() -> u32 {
    6
}

fn default_notch_q() -> f64 {
    30.0
}

fn default_edge_fade_ms() -> f64 {
    50.0
}

fn default_target_peak() -> f64 {
    0.95
}

fn default_utterance_gain() -> f64 {
    0.9
}

fn default_gap_secs() -> f64 {
    0.8
}

fn default_trailing_pad_secs() -> f64 {
    1.0
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            cleanup_enabled: true,
            lowpass_cutoff_hz: default_lowpass_cutoff_hz(),
            filter_order: default_filter_order(),
            notch_enabled: true,
            notch_q: default_notch_q(),
            edge_fade_ms: default_edge_fade_ms(),
            target_peak: default_target_peak(),
            utterance_gain: default_utterance_gain(),
            gap_secs: default_gap_secs(),
            trailing_pad_secs: default_trailing_pad_secs(),
        }
    }
}

/// Video composition and encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSettings {
    /// On-screen duration for slides without narration, in seconds.
    #[serde(default = "default_slide_secs")]
    pub default_slide_secs: f64,

    /// Output frame rate.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// Video codec passed to the renderer.
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Audio codec passed to the renderer.
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Video bitrate passed to the renderer.
    #[serde(default = "default_video_bitrate")]
    pub video_bitrate: String,

    /// Audio bitrate passed to the renderer.
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Pixel format; yuv420p keeps broad player compatibility.
    #[serde(default = "default_pix_fmt")]
    pub pix_fmt: String,

    /// Encoder preset.
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Global audio fade-out over the final seconds of the video.
    #[serde(default = "default_tail_fade_secs")]
    pub tail_fade_secs: f64,
}

fn default_slide_secs() -> f64 {
    5.0
}

fn default_frame_rate() -> u32 {
    24
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_video_bitrate() -> String {
    "1500k".to_string()
}

fn default_audio_bitrate() -> String {
    "192k".to_string()
}

fn default_pix_fmt() -> String {
    "yuv420p".to_string()
}

fn default_preset() -> String {
    "faster".to_string()
}

fn default_tail_fade_secs() -> f64 {
    1.0
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            default_slide_secs: default_slide_secs(),
            frame_rate: default_frame_rate(),
            video_codec: default_video_codec(),
            audio_codec: default_audio_codec(),
            video_bitrate: default_video_bitrate(),
            audio_bitrate: default_audio_bitrate(),
            pix_fmt: default_pix_fmt(),
            preset: default_preset(),
            tail_fade_secs: default_tail_fade_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.audio.sample_rate, 24_000);
        assert_eq!(parsed.video.video_codec, "libx264");
    }

    #[test]
    fn missing_sections_use_defaults() {
        let parsed: Settings = toml::from_str("[audio]\ngap_secs = 0.3\n").unwrap();
        assert!((parsed.audio.gap_secs - 0.3).abs() < 1e-12);
        assert!((parsed.audio.trailing_pad_secs - 1.0).abs() < 1e-12);
        assert_eq!(parsed.paths.output_folder, "output");
    }

    #[test]
    fn section_table_names() {
        assert_eq!(ConfigSection::Audio.table_name(), "audio");
        assert_eq!(ConfigSection::Video.table_name(), "video");
    }
}
