//! Render processor: runs one job through the pipeline.
//!
//! The processor owns the glue between the engine and the job
//! controller: it pre-validates the spec, creates the per-job work dir
//! and logger, chains progress reports into the injected job store
//! (`Pending → BuildingTracks → Composing → Encoding → Done | Failed`),
//! and sweeps temporary files on every exit path.
//!
//! Rendering is CPU-bound and long-running; `spawn_job` runs it on a
//! background thread and hands back a cancel handle.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::config::Settings;
use crate::jobs::{JobEntry, JobStore, JobUpdate};
use crate::logging::{JobLogger, LogCallback, LogConfig};
use crate::models::{RenderResult, RenderSpec, RenderStatus};

use super::create_render_pipeline;
use super::errors::RenderError;
use super::pipeline::{CancelHandle, Pipeline};
use super::types::{Context, JobState, ProgressCallback};

/// Processor for running render jobs through the pipeline.
pub struct RenderProcessor {
    /// Engine settings.
    settings: Settings,
    /// Injected job lifecycle store.
    store: Arc<dyn JobStore>,
    /// Directory for log files.
    log_dir: PathBuf,
    /// Root directory for per-job working files.
    work_root: PathBuf,
}

impl RenderProcessor {
    /// Create a new processor.
    ///
    /// # Arguments
    /// * `settings` - Engine settings
    /// * `store` - Job lifecycle store (injected by the controller)
    /// * `log_dir` - Directory for log files
    /// * `work_root` - Root directory for job working files
    pub fn new(
        settings: Settings,
        store: Arc<dyn JobStore>,
        log_dir: PathBuf,
        work_root: PathBuf,
    ) -> Self {
        Self {
            settings,
            store,
            log_dir,
            work_root,
        }
    }

    /// Process a single render job with the standard pipeline.
    ///
    /// Safe to call again with the same job id after a failure: work
    /// file names are re-derived, never accumulated.
    pub fn process_job(
        &self,
        job_id: &str,
        spec: RenderSpec,
        log_callback: Option<LogCallback>,
        progress_callback: Option<ProgressCallback>,
    ) -> RenderResult {
        self.process_job_with_pipeline(
            create_render_pipeline(),
            job_id,
            spec,
            log_callback,
            progress_callback,
        )
    }

    /// Process a single render job with a caller-supplied pipeline.
    ///
    /// Used by `spawn_job` (which needs the cancel handle before the
    /// run starts) and by tests that substitute the renderer.
    pub fn process_job_with_pipeline(
        &self,
        pipeline: Pipeline,
        job_id: &str,
        spec: RenderSpec,
        log_callback: Option<LogCallback>,
        progress_callback: Option<ProgressCallback>,
    ) -> RenderResult {
        self.store.create(JobEntry::new(job_id));

        // Zero slide images is fatal before any pipeline work starts
        if spec.slide_images.is_empty() {
            let err = RenderError::no_slide_images(job_id);
            return self.fail_job(job_id, &err);
        }

        let job_work_dir = self.work_root.join(job_id);
        if let Err(e) = std::fs::create_dir_all(&job_work_dir) {
            let err = RenderError::setup_failed(
                job_id,
                format!("Failed to create work directory: {}", e),
            );
            return self.fail_job(job_id, &err);
        }

        let logger = match JobLogger::new(
            job_id,
            &self.log_dir,
            LogConfig::from_settings(&self.settings.logging),
            log_callback,
        ) {
            Ok(l) => Arc::new(l),
            Err(e) => {
                let err =
                    RenderError::setup_failed(job_id, format!("Failed to create logger: {}", e));
                return self.fail_job(job_id, &err);
            }
        };

        let mut ctx = Context::new(
            spec,
            self.settings.clone(),
            job_id,
            job_work_dir,
            logger,
        );
        ctx = ctx.with_progress_callback(self.chain_progress(job_id, progress_callback));

        let mut state = JobState::new(job_id);

        ctx.logger.info(&format!("Starting render job: {}", job_id));
        ctx.logger.info(&format!(
            "Slides: {}, narrated slide keys: {}",
            ctx.spec.slide_images.len(),
            ctx.spec.narration.len()
        ));

        let run = pipeline.run(&ctx, &mut state);

        // Sweep temporary files on every exit path
        let removed = ctx.temp.cleanup();
        ctx.logger
            .debug(&format!("Removed {} temporary files", removed));

        match run {
            Ok(_) => {
                let output_path = state
                    .encode
                    .as_ref()
                    .map(|e| e.output_path.clone())
                    .unwrap_or_else(|| ctx.spec.output_path.clone());

                ctx.logger
                    .info(&format!("Job completed: {}", output_path.display()));
                self.store
                    .update(job_id, JobUpdate::done(output_path.clone()));
                RenderResult::success(job_id, output_path)
            }
            Err(e) => {
                ctx.logger.error(&format!("Render failed: {}", e));
                self.fail_job(job_id, &e)
            }
        }
    }

    /// Record a classified failure and build the result.
    fn fail_job(&self, job_id: &str, error: &RenderError) -> RenderResult {
        self.store
            .update(job_id, JobUpdate::failed(error.kind(), error.to_string()));
        RenderResult::failure(job_id, error.kind(), error.to_string())
    }

    /// Build the progress callback that drives the job store.
    ///
    /// Pipeline and step progress reports map onto the job state machine
    /// and an overall percentage; the caller's own callback (if any) is
    /// forwarded unchanged. Stored progress never moves backwards, since
    /// pipeline-level and step-local reports use different scales.
    fn chain_progress(
        &self,
        job_id: &str,
        user_callback: Option<ProgressCallback>,
    ) -> ProgressCallback {
        let store = Arc::clone(&self.store);
        let job_id = job_id.to_string();
        let high_water = parking_lot::Mutex::new(0u32);

        Box::new(move |step_name, percent, message| {
            let overall = {
                let mut high = high_water.lock();
                *high = (*high).max(overall_progress(step_name, percent));
                *high
            };
            let update = match step_status(step_name) {
                Some(status) => {
                    JobUpdate::status(status, message.to_string()).with_progress(overall)
                }
                None => JobUpdate::progress(overall, message.to_string()),
            };
            store.update(&job_id, update);

            if let Some(ref callback) = user_callback {
                callback(step_name, percent, message);
            }
        })
    }
}

/// Map a step name to its job status.
fn step_status(step_name: &str) -> Option<RenderStatus> {
    match step_name {
        "BuildTracks" => Some(RenderStatus::BuildingTracks),
        "Compose" => Some(RenderStatus::Composing),
        "Encode" => Some(RenderStatus::Encoding),
        _ => None,
    }
}

/// Map a step-local percentage onto the whole job.
///
/// Track building dominates wall-clock time, composition is cheap, and
/// encoding takes the rest; completion is reported by the run result.
fn overall_progress(step_name: &str, percent: u32) -> u32 {
    let percent = percent.min(100);
    match step_name {
        "BuildTracks" => 5 + percent * 55 / 100,
        "Compose" => 60 + percent * 10 / 100,
        "Encode" => 70 + percent * 25 / 100,
        "Complete" => 100,
        _ => percent,
    }
}

/// Run a job on a background worker thread.
///
/// Returns the join handle for the result and a cancel handle that
/// stops the pipeline at the next step boundary. Cancellation still
/// sweeps all temporary files.
pub fn spawn_job(
    processor: Arc<RenderProcessor>,
    job_id: String,
    spec: RenderSpec,
    log_callback: Option<LogCallback>,
    progress_callback: Option<ProgressCallback>,
) -> (JoinHandle<RenderResult>, CancelHandle) {
    let pipeline = create_render_pipeline();
    let cancel_handle = pipeline.cancel_handle();

    let handle = std::thread::spawn(move || {
        processor.process_job_with_pipeline(
            pipeline,
            &job_id,
            spec,
            log_callback,
            progress_callback,
        )
    });

    (handle, cancel_handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{EncodeError, EncodeReport, EncodeRequest, Renderer};
    use crate::jobs::MemoryJobStore;
    use crate::models::UtteranceSource;
    use crate::render::steps::{BuildTracksStep, ComposeStep, EncodeStep};
    use image::RgbImage;
    use std::collections::HashMap;
    use std::path::Path;
    use tempfile::tempdir;

    /// Renderer double that writes the output file without ffmpeg.
    struct FakeRenderer;

    impl Renderer for FakeRenderer {
        fn encode(&self, request: &EncodeRequest<'_>) -> Result<EncodeReport, EncodeError> {
            std::fs::write(request.output_path, b"video").unwrap();
            Ok(EncodeReport {
                exit_code: 0,
                command: "fake-encoder".to_string(),
                stdout: Vec::new(),
                stderr: Vec::new(),
            })
        }
    }

    fn fake_pipeline() -> Pipeline {
        Pipeline::new()
            .with_step(BuildTracksStep::new())
            .with_step(ComposeStep::new())
            .with_step(EncodeStep::with_renderer(Box::new(FakeRenderer)))
    }

    fn slide_image(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        RgbImage::new(4, 4).save(&path).unwrap();
        path
    }

    fn processor(dir: &Path, store: Arc<dyn JobStore>) -> RenderProcessor {
        RenderProcessor::new(
            Settings::default(),
            store,
            dir.join("logs"),
            dir.join("work"),
        )
    }

    #[test]
    fn no_slide_images_is_fatal_and_classified() {
        let dir = tempdir().unwrap();
        let store = Arc::new(MemoryJobStore::new());
        let proc = processor(dir.path(), store.clone());

        let spec = RenderSpec::new(Vec::new(), HashMap::new(), dir.path().join("out.mp4"));
        let result = proc.process_job_with_pipeline(fake_pipeline(), "job-1", spec, None, None);

        assert!(!result.success);
        assert_eq!(result.error_kind.as_deref(), Some("no_slide_images"));

        let entry = store.get("job-1").unwrap();
        assert_eq!(entry.status, RenderStatus::Failed);
        assert_eq!(entry.error_kind.as_deref(), Some("no_slide_images"));
    }

    #[test]
    fn full_render_with_fake_encoder_succeeds() {
        let dir = tempdir().unwrap();
        let store = Arc::new(MemoryJobStore::new());
        let proc = processor(dir.path(), store.clone());

        let slides = vec![
            slide_image(dir.path(), "slide_001.png"),
            slide_image(dir.path(), "slide_002.png"),
        ];
        // One listed utterance is missing; that is absorbed, not fatal
        let mut narration = HashMap::new();
        narration.insert(
            "slide_1".to_string(),
            vec![UtteranceSource::new(
                "speaker1",
                dir.path().join("missing.wav"),
            )],
        );

        let output = dir.path().join("out").join("deck.mp4");
        let spec = RenderSpec::new(slides, narration, &output);

        let result = proc.process_job_with_pipeline(fake_pipeline(), "job-1", spec, None, None);

        assert!(result.success, "render failed: {:?}", result.error);
        assert!(output.exists());

        let entry = store.get("job-1").unwrap();
        assert_eq!(entry.status, RenderStatus::Done);
        assert_eq!(entry.progress, 100);
        assert_eq!(entry.output_path, Some(output));

        // Temporary files were swept on completion
        let work_dir = dir.path().join("work").join("job-1");
        let leftovers = std::fs::read_dir(&work_dir).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn retry_after_failure_reuses_job_id() {
        let dir = tempdir().unwrap();
        let store = Arc::new(MemoryJobStore::new());
        let proc = processor(dir.path(), store.clone());

        // First attempt fails (no slides)
        let empty = RenderSpec::new(Vec::new(), HashMap::new(), dir.path().join("a.mp4"));
        let first = proc.process_job_with_pipeline(fake_pipeline(), "job-1", empty, None, None);
        assert!(!first.success);

        // Second attempt with a valid spec succeeds under the same id
        let output = dir.path().join("b.mp4");
        let spec = RenderSpec::new(
            vec![slide_image(dir.path(), "slide_001.png")],
            HashMap::new(),
            &output,
        );
        let second = proc.process_job_with_pipeline(fake_pipeline(), "job-1", spec, None, None);

        assert!(second.success);
        assert_eq!(store.get("job-1").unwrap().status, RenderStatus::Done);
    }

    #[test]
    fn cancelled_pipeline_reports_cancelled_kind() {
        let dir = tempdir().unwrap();
        let store = Arc::new(MemoryJobStore::new());
        let proc = processor(dir.path(), store.clone());

        let pipeline = fake_pipeline();
        pipeline.cancel_handle().cancel();

        let spec = RenderSpec::new(
            vec![slide_image(dir.path(), "slide_001.png")],
            HashMap::new(),
            dir.path().join("out.mp4"),
        );
        let result = proc.process_job_with_pipeline(pipeline, "job-1", spec, None, None);

        assert!(!result.success);
        assert_eq!(result.error_kind.as_deref(), Some("cancelled"));
    }

    #[test]
    fn progress_maps_onto_job_state_machine() {
        assert_eq!(step_status("BuildTracks"), Some(RenderStatus::BuildingTracks));
        assert_eq!(step_status("Compose"), Some(RenderStatus::Composing));
        assert_eq!(step_status("Encode"), Some(RenderStatus::Encoding));
        assert_eq!(step_status("Complete"), None);

        assert_eq!(overall_progress("BuildTracks", 0), 5);
        assert_eq!(overall_progress("BuildTracks", 100), 60);
        assert_eq!(overall_progress("Encode", 100), 95);
        assert_eq!(overall_progress("Complete", 100), 100);
    }
}
