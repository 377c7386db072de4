//! BuildTracks step - decodes, cleans, and sequences per-slide audio.
//!
//! This step absorbs every utterance-level problem: missing files are
//! skipped, cleanup failures fall back to the unfiltered waveform, and
//! slides left with zero usable utterances are marked for the silent
//! default-duration path. Nothing here fails the job except a completely
//! empty slide list.

use crate::audio::{build_slide_track, clean_waveform, decode_audio, CleanupConfig, SequencerConfig};
use crate::models::Utterance;
use crate::render::errors::{StepError, StepResult};
use crate::render::step::PipelineStep;
use crate::render::types::{Context, JobState, SlideTrackEntry, StepOutcome, TracksOutput};
use crate::timeline::slides::{image_slide_index, slide_key, sort_images_by_index};

/// BuildTracks step: one sequenced audio track per slide.
pub struct BuildTracksStep;

impl BuildTracksStep {
    pub fn new() -> Self {
        Self
    }

    /// Decode and clean every listed utterance for one slide.
    ///
    /// Returns the usable utterances plus the counts of skipped files
    /// and cleanup fallbacks.
    fn collect_utterances(
        &self,
        ctx: &Context,
        key: &str,
    ) -> (Vec<Utterance>, usize, usize) {
        let sample_rate = ctx.settings.audio.sample_rate;
        let cleanup_config = CleanupConfig::from_settings(&ctx.settings.audio);
        let gain = ctx.settings.audio.utterance_gain;

        let mut utterances = Vec::new();
        let mut missing = 0;
        let mut fallbacks = 0;

        for (i, source) in ctx.spec.utterances_for(key).iter().enumerate() {
            if !source.audio_path.exists() {
                ctx.logger.warn(&format!(
                    "{} utterance {}: audio file missing, skipping: {}",
                    key,
                    i + 1,
                    source.audio_path.display()
                ));
                missing += 1;
                continue;
            }

            let raw = match decode_audio(&source.audio_path, sample_rate) {
                Ok(waveform) => waveform,
                Err(e) => {
                    ctx.logger.warn(&format!(
                        "{} utterance {}: decode failed, skipping: {}",
                        key,
                        i + 1,
                        e
                    ));
                    missing += 1;
                    continue;
                }
            };

            let mut cleaned = if ctx.settings.audio.cleanup_enabled {
                match clean_waveform(&raw, &cleanup_config) {
                    Ok(cleaned) => cleaned,
                    Err(e) => {
                        ctx.logger.warn(&format!(
                            "{} utterance {}: cleanup failed, using unfiltered audio: {}",
                            key,
                            i + 1,
                            e
                        ));
                        fallbacks += 1;
                        raw
                    }
                }
            } else {
                raw
            };

            cleaned.scale(gain);
            utterances.push(Utterance::new(
                source.speaker.clone(),
                cleaned,
                source.audio_path.clone(),
            ));
        }

        (utterances, missing, fallbacks)
    }
}

impl Default for BuildTracksStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for BuildTracksStep {
    fn name(&self) -> &str {
        "BuildTracks"
    }

    fn description(&self) -> &str {
        "Decode, clean, and sequence per-slide audio tracks"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if ctx.spec.slide_images.is_empty() {
            return Err(StepError::invalid_input("No slide images supplied"));
        }

        if let Err(e) = std::fs::create_dir_all(&ctx.work_dir) {
            return Err(StepError::io_error("creating work directory", e));
        }

        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let sequencer_config = SequencerConfig::from_settings(&ctx.settings.audio);

        let mut images = ctx.spec.slide_images.clone();
        sort_images_by_index(&mut images);

        let mut output = TracksOutput::default();
        let total = images.len();

        for (i, image) in images.into_iter().enumerate() {
            // Fixed-width numeric suffix is the ordering authority; fall
            // back to list position for images named differently.
            let index = image_slide_index(&image).unwrap_or((i + 1) as u64);

            if !ctx.spec.includes_slide(index) {
                ctx.logger
                    .debug(&format!("Slide {} excluded by filter, skipping", index));
                continue;
            }

            let key = slide_key(index);
            let (utterances, missing, fallbacks) = self.collect_utterances(ctx, &key);
            output.missing_files += missing;
            output.filter_fallbacks += fallbacks;

            let track = build_slide_track(&utterances, &sequencer_config);
            match &track {
                Some(track) => {
                    ctx.logger.info(&format!(
                        "{}: {} utterances, track {:.2}s",
                        key,
                        track.utterance_count,
                        track.duration_secs()
                    ));
                }
                None => {
                    output.silent_slides += 1;
                    ctx.logger.info(&format!(
                        "{}: no usable narration, will use default duration",
                        key
                    ));
                }
            }

            output.slides.push(SlideTrackEntry {
                key: key.clone(),
                index,
                image,
                track,
            });

            let percent = (((i + 1) * 100) / total) as u32;
            ctx.report_progress("BuildTracks", percent, &format!("Prepared audio for {}", key));
            ctx.logger.progress(percent);
        }

        ctx.logger.info(&format!(
            "Tracks built: {} slides ({} silent), {} files skipped, {} cleanup fallbacks",
            output.slides.len(),
            output.silent_slides,
            output.missing_files,
            output.filter_fallbacks
        ));

        state.tracks = Some(output);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let tracks = state
            .tracks
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Track results not recorded"))?;

        if tracks.slides.is_empty() {
            return Err(StepError::invalid_output(
                "No slides remained after filtering",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::logging::{JobLogger, LogConfig};
    use crate::models::RenderSpec;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn test_context(spec: RenderSpec) -> (Context, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let logger = Arc::new(
            JobLogger::new("test_job", dir.path().join("logs"), LogConfig::default(), None)
                .unwrap(),
        );
        let ctx = Context::new(
            spec,
            Settings::default(),
            "test_job",
            dir.path().join("work"),
            logger,
        );
        (ctx, dir)
    }

    #[test]
    fn step_has_correct_name() {
        let step = BuildTracksStep::new();
        assert_eq!(step.name(), "BuildTracks");
    }

    #[test]
    fn rejects_empty_slide_list() {
        let spec = RenderSpec::new(Vec::new(), HashMap::new(), "out.mp4");
        let (ctx, _dir) = test_context(spec);

        let step = BuildTracksStep::new();
        assert!(matches!(
            step.validate_input(&ctx),
            Err(StepError::InvalidInput(_))
        ));
    }

    #[test]
    fn missing_audio_files_are_absorbed() {
        // One slide listing one nonexistent utterance: the render
        // continues and the slide takes the silent path.
        let mut narration = HashMap::new();
        narration.insert(
            "slide_1".to_string(),
            vec![crate::models::UtteranceSource::new(
                "speaker1",
                "/nonexistent/slide_001_001_speaker1.wav",
            )],
        );
        let spec = RenderSpec::new(
            vec![PathBuf::from("slides/slide_001.png")],
            narration,
            "out.mp4",
        );
        let (ctx, _dir) = test_context(spec);

        let step = BuildTracksStep::new();
        let mut state = JobState::new("test");
        let outcome = step.execute(&ctx, &mut state).unwrap();

        assert_eq!(outcome, StepOutcome::Success);
        let tracks = state.tracks.unwrap();
        assert_eq!(tracks.slides.len(), 1);
        assert_eq!(tracks.missing_files, 1);
        assert_eq!(tracks.silent_slides, 1);
        assert!(tracks.slides[0].track.is_none());
    }

    #[test]
    fn slides_are_processed_in_numeric_order() {
        let spec = RenderSpec::new(
            vec![
                PathBuf::from("slides/slide_010.png"),
                PathBuf::from("slides/slide_002.png"),
                PathBuf::from("slides/slide_001.png"),
            ],
            HashMap::new(),
            "out.mp4",
        );
        let (ctx, _dir) = test_context(spec);

        let step = BuildTracksStep::new();
        let mut state = JobState::new("test");
        step.execute(&ctx, &mut state).unwrap();

        let keys: Vec<String> = state
            .tracks
            .unwrap()
            .slides
            .iter()
            .map(|s| s.key.clone())
            .collect();
        assert_eq!(keys, vec!["slide_1", "slide_2", "slide_10"]);
    }

    #[test]
    fn slide_filter_excludes_slides() {
        let spec = RenderSpec::new(
            vec![
                PathBuf::from("slides/slide_001.png"),
                PathBuf::from("slides/slide_002.png"),
                PathBuf::from("slides/slide_003.png"),
            ],
            HashMap::new(),
            "out.mp4",
        )
        .with_slide_filter(vec![1, 3]);
        let (ctx, _dir) = test_context(spec);

        let step = BuildTracksStep::new();
        let mut state = JobState::new("test");
        step.execute(&ctx, &mut state).unwrap();

        let keys: Vec<String> = state
            .tracks
            .unwrap()
            .slides
            .iter()
            .map(|s| s.key.clone())
            .collect();
        assert_eq!(keys, vec!["slide_1", "slide_3"]);
    }

    #[test]
    fn filter_excluding_everything_fails_output_validation() {
        let spec = RenderSpec::new(
            vec![PathBuf::from("slides/slide_001.png")],
            HashMap::new(),
            "out.mp4",
        )
        .with_slide_filter(vec![99]);
        let (ctx, _dir) = test_context(spec);

        let step = BuildTracksStep::new();
        let mut state = JobState::new("test");
        step.execute(&ctx, &mut state).unwrap();

        assert!(matches!(
            step.validate_output(&ctx, &state),
            Err(StepError::InvalidOutput(_))
        ));
    }
}
