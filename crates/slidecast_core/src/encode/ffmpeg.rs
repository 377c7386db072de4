//! FFmpeg-backed renderer and the concat manifest writer.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use crate::config::VideoSettings;
use crate::models::Timeline;

use super::options_builder::FfmpegOptionsBuilder;

/// Errors from the encoding collaborator.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// Manifest or directory I/O failed.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// The encoder process could not be started.
    #[error("Failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The encoder rejected the parameters or ran out of resources.
    #[error("{tool} failed with exit code {exit_code}: {stderr_tail}")]
    Failed {
        tool: String,
        exit_code: i32,
        stderr_tail: String,
    },
}

/// Everything the renderer needs for one encode.
pub struct EncodeRequest<'a> {
    /// Concat manifest listing slide frames and durations.
    pub manifest_path: &'a Path,
    /// Timeline audio WAV.
    pub audio_path: &'a Path,
    /// Final output file.
    pub output_path: &'a Path,
    /// Encoding parameters, passed through unchanged.
    pub settings: &'a VideoSettings,
}

/// Result of a completed encode.
#[derive(Debug, Clone)]
pub struct EncodeReport {
    /// Encoder exit code.
    pub exit_code: i32,
    /// Command that was run (for the job log).
    pub command: String,
    /// Captured stdout lines.
    pub stdout: Vec<String>,
    /// Captured stderr lines.
    pub stderr: Vec<String>,
}

/// The encoding collaborator seam.
///
/// The engine builds the timeline and hands it over here; everything
/// about containers and codecs stays behind this trait.
pub trait Renderer: Send + Sync {
    /// Encode the prepared timeline into the output file.
    fn encode(&self, request: &EncodeRequest<'_>) -> Result<EncodeReport, EncodeError>;
}

/// Default renderer: ffmpeg via subprocess.
pub struct FfmpegRenderer {
    /// Path to ffmpeg executable (None = find in PATH).
    ffmpeg_path: Option<PathBuf>,
}

impl FfmpegRenderer {
    pub fn new() -> Self {
        Self { ffmpeg_path: None }
    }

    /// Set a custom path to the ffmpeg executable.
    pub fn with_ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = Some(path.into());
        self
    }

    /// Get the ffmpeg executable path/command.
    fn ffmpeg_cmd(&self) -> &str {
        self.ffmpeg_path
            .as_ref()
            .and_then(|p| p.to_str())
            .unwrap_or("ffmpeg")
    }
}

impl Default for FfmpegRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for FfmpegRenderer {
    fn encode(&self, request: &EncodeRequest<'_>) -> Result<EncodeReport, EncodeError> {
        // Create output directory if needed
        if let Some(parent) = request.output_path.parent() {
            fs::create_dir_all(parent).map_err(|source| EncodeError::Io {
                operation: "creating output directory".to_string(),
                source,
            })?;
        }

        let tokens = FfmpegOptionsBuilder::new(
            request.manifest_path,
            request.audio_path,
            request.output_path,
            request.settings,
        )
        .build();

        let ffmpeg = self.ffmpeg_cmd();
        let command = format!("{} {}", ffmpeg, tokens.join(" "));
        tracing::debug!("Running encoder: {}", command);

        let result = Command::new(ffmpeg)
            .args(&tokens)
            .output()
            .map_err(|source| EncodeError::Spawn {
                tool: ffmpeg.to_string(),
                source,
            })?;

        let exit_code = result.status.code().unwrap_or(-1);
        let stdout: Vec<String> = String::from_utf8_lossy(&result.stdout)
            .lines()
            .map(str::to_string)
            .collect();
        let stderr: Vec<String> = String::from_utf8_lossy(&result.stderr)
            .lines()
            .map(str::to_string)
            .collect();

        if !result.status.success() {
            let tail_start = stderr.len().saturating_sub(20);
            return Err(EncodeError::Failed {
                tool: ffmpeg.to_string(),
                exit_code,
                stderr_tail: stderr[tail_start..].join("\n"),
            });
        }

        Ok(EncodeReport {
            exit_code,
            command,
            stdout,
            stderr,
        })
    }
}

/// Write the concat demuxer manifest for a timeline.
///
/// Lists every slide frame with its display duration. The final frame is
/// listed a second time without a duration; the concat demuxer needs that
/// trailing entry to hold the last frame through its full duration.
pub fn write_concat_manifest(manifest_path: &Path, timeline: &Timeline) -> Result<(), EncodeError> {
    let mut file = fs::File::create(manifest_path).map_err(|source| EncodeError::Io {
        operation: "creating concat manifest".to_string(),
        source,
    })?;

    let mut write = |line: String| -> Result<(), EncodeError> {
        writeln!(file, "{}", line).map_err(|source| EncodeError::Io {
            operation: "writing concat manifest".to_string(),
            source,
        })
    };

    write("ffconcat version 1.0".to_string())?;
    for clip in &timeline.clips {
        write(format!("file '{}'", escape_path(&clip.image)))?;
        write(format!("duration {:.3}", clip.duration_secs))?;
    }
    if let Some(last) = timeline.clips.last() {
        write(format!("file '{}'", escape_path(&last.image)))?;
    }

    Ok(())
}

/// Escape a path for a single-quoted concat manifest entry.
fn escape_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', "'\\''")
}
