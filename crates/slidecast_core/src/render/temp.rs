//! Temporary resource tracking.
//!
//! Every file the pipeline derives (prepared frames, the timeline WAV,
//! the concat manifest) is registered here and deleted in bulk on both
//! normal completion and abort. Names are derived from the work dir and
//! slide index alone, so a retry of the same job id regenerates the same
//! paths instead of accumulating strays.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

/// Registry of temporary files created during one render.
#[derive(Default)]
pub struct TempRegistry {
    files: Mutex<Vec<PathBuf>>,
}

impl TempRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a file for bulk deletion.
    pub fn register(&self, path: PathBuf) {
        self.files.lock().push(path);
    }

    /// Number of tracked files.
    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }

    /// Delete every tracked file. Returns how many were removed.
    ///
    /// Missing files are ignored; deletion failures are logged and do
    /// not interrupt the sweep.
    pub fn cleanup(&self) -> usize {
        let files = std::mem::take(&mut *self.files.lock());
        let mut removed = 0;

        for path in files {
            if !path.exists() {
                continue;
            }
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::warn!("Failed to remove temp file {}: {}", path.display(), e);
                }
            }
        }

        removed
    }
}

impl Drop for TempRegistry {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Derived path for the concatenated timeline audio.
pub fn timeline_wav_path(work_dir: &Path) -> PathBuf {
    work_dir.join("timeline.wav")
}

/// Derived path for the slide concat manifest.
pub fn manifest_path(work_dir: &Path) -> PathBuf {
    work_dir.join("slides.ffconcat")
}
