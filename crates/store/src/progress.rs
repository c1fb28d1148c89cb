//! Persistence for the progress document.

use std::path::PathBuf;

use visafeed_core::progress::ProgressState;

use crate::document;
use crate::error::StoreError;

/// Loads and saves the run-to-run progress bookkeeping.
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the last persisted progress, or a fresh default.
    pub fn load(&self) -> ProgressState {
        document::load_or_default(&self.path)
    }

    pub fn save(&self, progress: &ProgressState) -> Result<(), StoreError> {
        document::write_atomic(&self.path, progress)
    }
}
