//! Error types for the render pipeline.
//!
//! Errors carry context that chains through layers:
//! Job → Step → Operation → Detail
//!
//! Utterance- and slide-level problems never appear here; they are
//! absorbed and logged where they occur. What does appear is what
//! terminates a render: zero slide images, setup failures, cancellation,
//! and encoding failures. The job controller receives one classified
//! (kind, message) pair, never a raw internal trace.

use std::io;

use thiserror::Error;

/// Top-level render error with job context.
#[derive(Error, Debug)]
pub enum RenderError {
    /// A pipeline step failed during execution.
    #[error("Job '{job_name}' failed at step '{step_name}': {source}")]
    StepFailed {
        job_name: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// Zero slide images were supplied; nothing to render.
    #[error("Job '{job_name}' has no slide images")]
    NoSlideImages { job_name: String },

    /// Render was cancelled.
    #[error("Job '{job_name}' was cancelled")]
    Cancelled { job_name: String },

    /// Failed to set up the job (create directories, logger, etc.).
    #[error("Job '{job_name}' setup failed: {message}")]
    SetupFailed { job_name: String, message: String },
}

impl RenderError {
    /// Create a step failed error.
    pub fn step_failed(
        job_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            job_name: job_name.into(),
            step_name: step_name.into(),
            source,
        }
    }

    /// Create a no-slide-images error.
    pub fn no_slide_images(job_name: impl Into<String>) -> Self {
        Self::NoSlideImages {
            job_name: job_name.into(),
        }
    }

    /// Create a setup failed error.
    pub fn setup_failed(job_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            job_name: job_name.into(),
            message: message.into(),
        }
    }

    /// Create a cancelled error.
    pub fn cancelled(job_name: impl Into<String>) -> Self {
        Self::Cancelled {
            job_name: job_name.into(),
        }
    }

    /// Classified error kind for the job controller.
    ///
    /// A failure in the Encode step is an encoding failure; any other
    /// step failure is reported under the step's own name.
    pub fn kind(&self) -> &'static str {
        match self {
            RenderError::NoSlideImages { .. } => "no_slide_images",
            RenderError::Cancelled { .. } => "cancelled",
            RenderError::SetupFailed { .. } => "setup_failed",
            RenderError::StepFailed { step_name, .. } => match step_name.as_str() {
                "Encode" => "encoding_failure",
                "Compose" => "compose_failure",
                "BuildTracks" => "track_build_failure",
                _ => "step_failed",
            },
        }
    }
}

/// Error from a pipeline step with operation context.
#[derive(Error, Debug)]
pub enum StepError {
    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// Output validation failed.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// An external command failed.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// A required file was not found.
    #[error("Required file not found: {path}")]
    FileNotFound { path: String },

    /// A precondition was not met.
    #[error("Precondition not met: {0}")]
    PreconditionFailed(String),

    /// Generic step error with message.
    #[error("{0}")]
    Other(String),
}

impl StepError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an invalid output error.
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    /// Create a command failed error.
    pub fn command_failed(
        tool: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            message: message.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a precondition failed error.
    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }

    /// Create a generic error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_error_displays_context() {
        let err = StepError::command_failed("ffmpeg", 1, "Unknown encoder 'libx999'");
        let msg = err.to_string();
        assert!(msg.contains("ffmpeg"));
        assert!(msg.contains("exit code 1"));
        assert!(msg.contains("libx999"));
    }

    #[test]
    fn render_error_chains_context() {
        let step_err = StepError::file_not_found("/work/timeline.wav");
        let render_err = RenderError::step_failed("deck_xyz", "Encode", step_err);

        let msg = render_err.to_string();
        assert!(msg.contains("deck_xyz"));
        assert!(msg.contains("Encode"));
    }

    #[test]
    fn encode_failures_classify_as_encoding_failure() {
        let err = RenderError::step_failed(
            "job",
            "Encode",
            StepError::command_failed("ffmpeg", 1, "boom"),
        );
        assert_eq!(err.kind(), "encoding_failure");
    }

    #[test]
    fn kinds_cover_fatal_taxonomy() {
        assert_eq!(RenderError::no_slide_images("j").kind(), "no_slide_images");
        assert_eq!(RenderError::cancelled("j").kind(), "cancelled");
        assert_eq!(RenderError::setup_failed("j", "m").kind(), "setup_failed");
    }
}
