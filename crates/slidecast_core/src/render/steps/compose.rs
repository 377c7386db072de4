//! Compose step - binds slides to their durations and assembles the
//! timeline.
//!
//! Frame preparation (the even-dimension crop) happens here, isolated
//! from the audio path. Slides without a track get the configured
//! default duration and a silent fill track so concatenation stays
//! format-uniform.

use crate::render::errors::{StepError, StepResult};
use crate::render::step::PipelineStep;
use crate::render::types::{ComposeOutput, Context, JobState, StepOutcome};
use crate::timeline::{assemble, compose_slide, prepare_frame, ComposerConfig};

/// Compose step: slide clips and the assembled timeline.
pub struct ComposeStep;

impl ComposeStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ComposeStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ComposeStep {
    fn name(&self) -> &str {
        "Compose"
    }

    fn description(&self) -> &str {
        "Compose slide clips and assemble the timeline"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if !ctx.work_dir.exists() {
            return Err(StepError::invalid_input(format!(
                "Work directory missing: {}",
                ctx.work_dir.display()
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let entries = match state.tracks.as_mut() {
            // The track list moves into the timeline; counters stay behind.
            Some(tracks) => std::mem::take(&mut tracks.slides),
            None => {
                return Err(StepError::precondition_failed(
                    "Tracks have not been built",
                ))
            }
        };

        let composer_config = ComposerConfig::from_settings(&ctx.settings.video);
        let format = ctx.audio_format();
        let total = entries.len();

        let mut labeled = Vec::with_capacity(total);
        for (i, entry) in entries.into_iter().enumerate() {
            let prepared = prepare_frame(&entry.image, &ctx.work_dir, entry.index)
                .map_err(|e| StepError::other(e.to_string()))?;
            if prepared != entry.image {
                ctx.temp.register(prepared.clone());
            }

            let clip = compose_slide(prepared, entry.track, &composer_config, format);
            ctx.logger.info(&format!(
                "{}: clip {:.2}s{}",
                entry.key,
                clip.duration_secs,
                if clip.narrated { "" } else { " (silent)" }
            ));
            labeled.push((entry.key, clip));

            let percent = (((i + 1) * 100) / total) as u32;
            ctx.report_progress("Compose", percent, "Composing slide clips");
        }

        let timeline = assemble(labeled);
        ctx.logger.info(&format!(
            "Timeline assembled: {} clips, {:.2}s total",
            timeline.len(),
            timeline.total_duration_secs()
        ));

        state.timeline = Some(ComposeOutput { timeline });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let compose = state
            .timeline
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Timeline not recorded"))?;

        let timeline = &compose.timeline;
        if timeline.is_empty() {
            return Err(StepError::invalid_output("Timeline has no clips"));
        }

        if timeline.total_duration_secs() <= 0.0 {
            return Err(StepError::invalid_output("Timeline has zero duration"));
        }

        // Clip duration must track the audio exactly (within 1 ms)
        for clip in &timeline.clips {
            if let Some(track) = &clip.track {
                let diff = (clip.duration_secs - track.duration_secs()).abs();
                if diff > 0.001 {
                    return Err(StepError::invalid_output(format!(
                        "Clip duration {:.3}s diverges from track {:.3}s",
                        clip.duration_secs,
                        track.duration_secs()
                    )));
                }
            }
        }

        let offsets = timeline.start_offsets();
        if offsets.windows(2).any(|w| w[0] > w[1]) {
            return Err(StepError::invalid_output(
                "Clip start offsets are not monotonic",
            ));
        }

        Ok(())
    }
}
