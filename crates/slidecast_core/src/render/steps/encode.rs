//! Encode step - renders the assembled timeline to the output file.
//!
//! Writes the timeline audio (with the global tail fade) and the slide
//! concat manifest into the work dir, then hands both to the renderer.
//! Encoding failure is terminal for the job.

use crate::audio::write_wav;
use crate::encode::{
    write_concat_manifest, EncodeError, EncodeRequest, FfmpegOptionsBuilder, FfmpegRenderer,
    Renderer,
};
use crate::render::errors::{StepError, StepResult};
use crate::render::step::PipelineStep;
use crate::render::temp::{manifest_path, timeline_wav_path};
use crate::render::types::{Context, EncodeOutput, JobState, StepOutcome};
use crate::timeline::{render_timeline_audio, AssemblerConfig};

/// Encode step: final mux of slides and audio.
pub struct EncodeStep {
    renderer: Box<dyn Renderer>,
}

impl EncodeStep {
    /// Create the step with the default ffmpeg renderer.
    pub fn new() -> Self {
        Self {
            renderer: Box::new(FfmpegRenderer::new()),
        }
    }

    /// Use a custom renderer implementation.
    pub fn with_renderer(renderer: Box<dyn Renderer>) -> Self {
        Self { renderer }
    }

    /// Map encoder errors into step errors with context.
    fn map_encode_error(e: EncodeError) -> StepError {
        match e {
            EncodeError::Io { operation, source } => StepError::io_error(operation, source),
            EncodeError::Spawn { tool, source } => {
                StepError::io_error(format!("spawning {}", tool), source)
            }
            EncodeError::Failed {
                tool,
                exit_code,
                stderr_tail,
            } => StepError::command_failed(tool, exit_code, stderr_tail),
        }
    }
}

impl Default for EncodeStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for EncodeStep {
    fn name(&self) -> &str {
        "Encode"
    }

    fn description(&self) -> &str {
        "Encode the timeline into the output video"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        // Check output directory is writable (try to create it)
        if let Some(parent) = ctx.spec.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    return Err(StepError::io_error("creating output directory", e));
                }
            }
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let timeline = match state.timeline.as_ref() {
            Some(compose) => &compose.timeline,
            None => {
                return Err(StepError::precondition_failed(
                    "Timeline has not been composed",
                ))
            }
        };

        // Concatenate all slide audio and apply the global tail fade
        let assembler_config = AssemblerConfig::from_settings(&ctx.settings.video);
        let audio = render_timeline_audio(timeline, ctx.audio_format(), &assembler_config);
        ctx.logger.info(&format!(
            "Timeline audio: {:.2}s, fade-out {:.2}s",
            audio.duration_secs(),
            assembler_config.tail_fade_secs
        ));

        let audio_path = timeline_wav_path(&ctx.work_dir);
        write_wav(&audio_path, &audio).map_err(|e| StepError::other(e.to_string()))?;
        ctx.temp.register(audio_path.clone());

        let manifest = manifest_path(&ctx.work_dir);
        write_concat_manifest(&manifest, timeline).map_err(Self::map_encode_error)?;
        ctx.temp.register(manifest.clone());

        ctx.report_progress("Encode", 10, "Encoding video");
        ctx.logger.section("Executing encoder");

        if ctx.settings.logging.show_encoder_args {
            let tokens = FfmpegOptionsBuilder::new(
                &manifest,
                &audio_path,
                &ctx.spec.output_path,
                &ctx.settings.video,
            )
            .build();
            ctx.logger.log_encoder_args(&tokens);
        }

        let request = EncodeRequest {
            manifest_path: &manifest,
            audio_path: &audio_path,
            output_path: &ctx.spec.output_path,
            settings: &ctx.settings.video,
        };

        let report = match self.renderer.encode(&request) {
            Ok(report) => report,
            Err(EncodeError::Failed {
                tool,
                exit_code,
                stderr_tail,
            }) => {
                for line in stderr_tail.lines() {
                    ctx.logger.output_line(line, true);
                }
                ctx.logger.show_tail("encoder output");
                return Err(StepError::command_failed(tool, exit_code, stderr_tail));
            }
            Err(e) => return Err(Self::map_encode_error(e)),
        };

        ctx.logger.command(&report.command);
        for line in &report.stdout {
            ctx.logger.output_line(line, false);
        }
        for line in &report.stderr {
            ctx.logger.output_line(line, true);
        }

        state.encode = Some(EncodeOutput {
            output_path: ctx.spec.output_path.clone(),
            exit_code: report.exit_code,
            command: report.command,
        });

        ctx.logger.success(&format!(
            "Encoded to: {}",
            ctx.spec
                .output_path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
        ));

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let encode = state
            .encode
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Encode results not recorded"))?;

        if !encode.output_path.exists() {
            return Err(StepError::invalid_output(format!(
                "Output file not created: {}",
                encode.output_path.display()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::encode::EncodeReport;
    use crate::logging::{JobLogger, LogConfig};
    use crate::models::{AudioFormat, RenderSpec, SlideAudioTrack, SlideClip, Timeline, Waveform};
    use crate::render::types::ComposeOutput;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::tempdir;

    /// Renderer double that records the request and writes the output file.
    struct FakeRenderer {
        fail: bool,
    }

    impl Renderer for FakeRenderer {
        fn encode(&self, request: &EncodeRequest<'_>) -> Result<EncodeReport, EncodeError> {
            if self.fail {
                return Err(EncodeError::Failed {
                    tool: "ffmpeg".to_string(),
                    exit_code: 1,
                    stderr_tail: "Unknown encoder".to_string(),
                });
            }

            std::fs::write(request.output_path, b"video").unwrap();
            Ok(EncodeReport {
                exit_code: 0,
                command: "ffmpeg -y ...".to_string(),
                stdout: Vec::new(),
                stderr: Vec::new(),
            })
        }
    }

    fn test_context(dir: &tempfile::TempDir) -> Context {
        let work_dir = dir.path().join("work");
        std::fs::create_dir_all(&work_dir).unwrap();
        let logger = Arc::new(
            JobLogger::new("test_job", dir.path().join("logs"), LogConfig::default(), None)
                .unwrap(),
        );
        Context::new(
            RenderSpec::new(
                Vec::new(),
                HashMap::new(),
                dir.path().join("out").join("video.mp4"),
            ),
            Settings::default(),
            "test_job",
            work_dir,
            logger,
        )
    }

    fn state_with_timeline(secs: f64) -> JobState {
        let n = (secs * 24_000.0).round() as usize;
        let clip = SlideClip::narrated(
            PathBuf::from("frame_001.png"),
            SlideAudioTrack {
                waveform: Waveform::new(vec![0.2; n], AudioFormat::mono(24_000)),
                utterance_count: 1,
            },
        );
        let mut state = JobState::new("test");
        state.timeline = Some(ComposeOutput {
            timeline: Timeline::new(vec![clip]),
        });
        state
    }

    #[test]
    fn step_has_correct_name() {
        assert_eq!(EncodeStep::new().name(), "Encode");
    }

    #[test]
    fn requires_composed_timeline() {
        let dir = tempdir().unwrap();
        let ctx = test_context(&dir);
        let mut state = JobState::new("test");

        let step = EncodeStep::with_renderer(Box::new(FakeRenderer { fail: false }));
        let result = step.execute(&ctx, &mut state);
        assert!(matches!(result, Err(StepError::PreconditionFailed(_))));
    }

    #[test]
    fn successful_encode_records_output() {
        let dir = tempdir().unwrap();
        let ctx = test_context(&dir);
        let mut state = state_with_timeline(2.0);

        let step = EncodeStep::with_renderer(Box::new(FakeRenderer { fail: false }));
        step.validate_input(&ctx).unwrap();
        step.execute(&ctx, &mut state).unwrap();
        step.validate_output(&ctx, &state).unwrap();

        let encode = state.encode.unwrap();
        assert_eq!(encode.exit_code, 0);
        assert!(encode.output_path.exists());

        // The intermediate WAV and manifest were written and tracked
        assert_eq!(ctx.temp.len(), 2);
        assert!(timeline_wav_path(&ctx.work_dir).exists());
        assert!(manifest_path(&ctx.work_dir).exists());
    }

    #[test]
    fn encoder_failure_becomes_command_failed() {
        let dir = tempdir().unwrap();
        let ctx = test_context(&dir);
        let mut state = state_with_timeline(1.0);

        let step = EncodeStep::with_renderer(Box::new(FakeRenderer { fail: true }));
        let result = step.execute(&ctx, &mut state);

        match result {
            Err(StepError::CommandFailed { exit_code, .. }) => assert_eq!(exit_code, 1),
            other => panic!("expected CommandFailed, got {:?}", other),
        }
    }
}
