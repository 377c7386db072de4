//! Job store: explicit, injected lifecycle tracking for render jobs.
//!
//! The store replaces a process-global registry with an interface the
//! job controller injects into the processor. Entries are keyed by job
//! id with a create/read/update/delete lifecycle. The engine itself only
//! writes status, progress, and results; everything else is the
//! controller's business.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::Local;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::models::RenderStatus;

/// One job's lifecycle record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEntry {
    /// Unique job identifier.
    pub job_id: String,
    /// Current lifecycle state.
    pub status: RenderStatus,
    /// Coarse progress, 0-100.
    pub progress: u32,
    /// Human-readable status message.
    pub message: String,
    /// Output video path (set when the render finishes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    /// Classified error kind (set on failure).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    /// Error message (set on failure).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Last update timestamp (RFC 3339).
    pub updated_at: String,
}

impl JobEntry {
    /// Create a pending entry for a new job.
    pub fn new(job_id: impl Into<String>) -> Self {
        let now = Local::now().to_rfc3339();
        Self {
            job_id: job_id.into(),
            status: RenderStatus::Pending,
            progress: 0,
            message: "Job created".to_string(),
            output_path: None,
            error_kind: None,
            error: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Partial update applied to a job entry.
///
/// Only the populated fields change; `updated_at` is always refreshed.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<RenderStatus>,
    pub progress: Option<u32>,
    pub message: Option<String>,
    pub output_path: Option<PathBuf>,
    pub error_kind: Option<String>,
    pub error: Option<String>,
}

impl JobUpdate {
    /// Update that moves the job to a new status with a message.
    pub fn status(status: RenderStatus, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Update that only changes progress and message.
    pub fn progress(percent: u32, message: impl Into<String>) -> Self {
        Self {
            progress: Some(percent),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Update for a successful completion.
    pub fn done(output_path: PathBuf) -> Self {
        Self {
            status: Some(RenderStatus::Done),
            progress: Some(100),
            message: Some("Render completed".to_string()),
            output_path: Some(output_path),
            ..Self::default()
        }
    }

    /// Update for a failed job with a classified error.
    pub fn failed(kind: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: Some(RenderStatus::Failed),
            error_kind: Some(kind.into()),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Set the progress on any update.
    pub fn with_progress(mut self, percent: u32) -> Self {
        self.progress = Some(percent);
        self
    }
}

/// Injected store interface for job lifecycle records.
pub trait JobStore: Send + Sync {
    /// Insert a new entry, replacing any existing entry with the same id.
    fn create(&self, entry: JobEntry);

    /// Fetch an entry by job id.
    fn get(&self, job_id: &str) -> Option<JobEntry>;

    /// Apply a partial update. Returns false when the id is unknown.
    fn update(&self, job_id: &str, update: JobUpdate) -> bool;

    /// Remove an entry. Returns false when the id is unknown.
    fn delete(&self, job_id: &str) -> bool;

    /// Snapshot of all entries.
    fn list(&self) -> Vec<JobEntry>;
}

/// In-memory store backed by a read-write lock.
///
/// Suitable for a single-process controller; the interface lets callers
/// swap in a persistent store without touching the engine.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<String, JobEntry>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for MemoryJobStore {
    fn create(&self, entry: JobEntry) {
        self.jobs.write().insert(entry.job_id.clone(), entry);
    }

    fn get(&self, job_id: &str) -> Option<JobEntry> {
        self.jobs.read().get(job_id).cloned()
    }

    fn update(&self, job_id: &str, update: JobUpdate) -> bool {
        let mut jobs = self.jobs.write();
        let Some(entry) = jobs.get_mut(job_id) else {
            return false;
        };

        if let Some(status) = update.status {
            entry.status = status;
        }
        if let Some(progress) = update.progress {
            entry.progress = progress.min(100);
        }
        if let Some(message) = update.message {
            entry.message = message;
        }
        if let Some(output_path) = update.output_path {
            entry.output_path = Some(output_path);
        }
        if let Some(kind) = update.error_kind {
            entry.error_kind = Some(kind);
        }
        if let Some(error) = update.error {
            entry.error = Some(error);
        }
        entry.updated_at = Local::now().to_rfc3339();

        true
    }

    fn delete(&self, job_id: &str) -> bool {
        self.jobs.write().remove(job_id).is_some()
    }

    fn list(&self) -> Vec<JobEntry> {
        self.jobs.read().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_get() {
        let store = MemoryJobStore::new();
        store.create(JobEntry::new("job-1"));

        let entry = store.get("job-1").unwrap();
        assert_eq!(entry.status, RenderStatus::Pending);
        assert_eq!(entry.progress, 0);
    }

    #[test]
    fn update_merges_fields() {
        let store = MemoryJobStore::new();
        store.create(JobEntry::new("job-1"));

        assert!(store.update(
            "job-1",
            JobUpdate::status(RenderStatus::Encoding, "Encoding video").with_progress(80),
        ));

        let entry = store.get("job-1").unwrap();
        assert_eq!(entry.status, RenderStatus::Encoding);
        assert_eq!(entry.progress, 80);
        assert_eq!(entry.message, "Encoding video");
        // Untouched fields survive
        assert!(entry.error.is_none());
    }

    #[test]
    fn update_unknown_id_returns_false() {
        let store = MemoryJobStore::new();
        assert!(!store.update("missing", JobUpdate::progress(10, "x")));
    }

    #[test]
    fn failed_update_records_classified_error() {
        let store = MemoryJobStore::new();
        store.create(JobEntry::new("job-1"));
        store.update(
            "job-1",
            JobUpdate::failed("encoding_failure", "ffmpeg exited 1"),
        );

        let entry = store.get("job-1").unwrap();
        assert_eq!(entry.status, RenderStatus::Failed);
        assert_eq!(entry.error_kind.as_deref(), Some("encoding_failure"));
    }

    #[test]
    fn delete_removes_entry() {
        let store = MemoryJobStore::new();
        store.create(JobEntry::new("job-1"));
        assert!(store.delete("job-1"));
        assert!(!store.delete("job-1"));
        assert!(store.get("job-1").is_none());
    }

    #[test]
    fn progress_is_capped() {
        let store = MemoryJobStore::new();
        store.create(JobEntry::new("job-1"));
        store.update("job-1", JobUpdate::progress(250, "overflow"));
        assert_eq!(store.get("job-1").unwrap().progress, 100);
    }
}
