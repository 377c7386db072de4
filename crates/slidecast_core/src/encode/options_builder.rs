//! FFmpeg command options builder.
//!
//! Builds command-line tokens for the final encode from the concat
//! manifest, the timeline audio, and the video settings. Encoding
//! parameters pass through from settings unchanged; the builder adds
//! nothing the caller cannot override.

use std::path::Path;

use crate::config::VideoSettings;

/// Builder for ffmpeg command-line options.
///
/// Generates a list of string tokens that form a complete ffmpeg
/// invocation (without the executable name).
pub struct FfmpegOptionsBuilder<'a> {
    manifest_path: &'a Path,
    audio_path: &'a Path,
    output_path: &'a Path,
    settings: &'a VideoSettings,
}

impl<'a> FfmpegOptionsBuilder<'a> {
    /// Create a new options builder.
    pub fn new(
        manifest_path: &'a Path,
        audio_path: &'a Path,
        output_path: &'a Path,
        settings: &'a VideoSettings,
    ) -> Self {
        Self {
            manifest_path,
            audio_path,
            output_path,
            settings,
        }
    }

    /// Build the complete ffmpeg command tokens.
    pub fn build(&self) -> Vec<String> {
        let mut tokens = Vec::new();

        // Overwrite output without prompting
        tokens.push("-y".to_string());

        // Slide sequence via the concat demuxer
        tokens.push("-f".to_string());
        tokens.push("concat".to_string());
        tokens.push("-safe".to_string());
        tokens.push("0".to_string());
        tokens.push("-i".to_string());
        tokens.push(self.manifest_path.to_string_lossy().to_string());

        // Timeline audio
        tokens.push("-i".to_string());
        tokens.push(self.audio_path.to_string_lossy().to_string());

        // Video encoding
        tokens.push("-c:v".to_string());
        tokens.push(self.settings.video_codec.clone());
        tokens.push("-preset".to_string());
        tokens.push(self.settings.preset.clone());
        tokens.push("-b:v".to_string());
        tokens.push(self.settings.video_bitrate.clone());
        tokens.push("-pix_fmt".to_string());
        tokens.push(self.settings.pix_fmt.clone());
        tokens.push("-r".to_string());
        tokens.push(self.settings.frame_rate.to_string());

        // Audio encoding
        tokens.push("-c:a".to_string());
        tokens.push(self.settings.audio_codec.clone());
        tokens.push("-b:a".to_string());
        tokens.push(self.settings.audio_bitrate.clone());

        // Keep the muxer queue bounded on long decks
        tokens.push("-max_muxing_queue_size".to_string());
        tokens.push("1024".to_string());

        // Stop at the shorter stream so trailing frames never outlive audio
        tokens.push("-shortest".to_string());

        tokens.push(self.output_path.to_string_lossy().to_string());

        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn builds_complete_command() {
        let manifest = PathBuf::from("/work/slides.ffconcat");
        let audio = PathBuf::from("/work/timeline.wav");
        let output = PathBuf::from("/out/video.mp4");
        let settings = VideoSettings::default();

        let tokens = FfmpegOptionsBuilder::new(&manifest, &audio, &output, &settings).build();

        assert_eq!(tokens[0], "-y");
        assert!(tokens.contains(&"concat".to_string()));
        assert!(tokens.contains(&"/work/slides.ffconcat".to_string()));
        assert!(tokens.contains(&"/work/timeline.wav".to_string()));
        assert_eq!(tokens.last().unwrap(), "/out/video.mp4");
    }

    #[test]
    fn settings_pass_through_unchanged() {
        let manifest = PathBuf::from("m.ffconcat");
        let audio = PathBuf::from("a.wav");
        let output = PathBuf::from("o.mp4");
        let settings = VideoSettings {
            video_codec: "libx265".to_string(),
            video_bitrate: "900k".to_string(),
            frame_rate: 30,
            ..VideoSettings::default()
        };

        let tokens = FfmpegOptionsBuilder::new(&manifest, &audio, &output, &settings).build();

        let pos = |flag: &str| tokens.iter().position(|t| t == flag).unwrap();
        assert_eq!(tokens[pos("-c:v") + 1], "libx265");
        assert_eq!(tokens[pos("-b:v") + 1], "900k");
        assert_eq!(tokens[pos("-r") + 1], "30");
    }
}
