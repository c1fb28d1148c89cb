//! Persistence for the ruleset document and its companion version stamp.

use std::path::PathBuf;

use visafeed_core::requirement::Ruleset;
use visafeed_core::types::Timestamp;

use crate::document;
use crate::error::StoreError;

/// Loads and saves the ruleset. Every save bumps the monotonic
/// `dataVersion`, refreshes `lastUpdated`, and rewrites the stamp document
/// the mobile client polls.
pub struct RulesetStore {
    ruleset_path: PathBuf,
    stamp_path: PathBuf,
}

impl RulesetStore {
    pub fn new(ruleset_path: PathBuf, stamp_path: PathBuf) -> Self {
        Self {
            ruleset_path,
            stamp_path,
        }
    }

    /// Load the last persisted ruleset, or an empty default.
    pub fn load(&self) -> Ruleset {
        document::load_or_default(&self.ruleset_path)
    }

    /// Persist the ruleset and its stamp.
    ///
    /// Mutates the ruleset's metadata before writing so the in-memory copy
    /// stays consistent with what landed on disk.
    pub fn save(&self, ruleset: &mut Ruleset, now: Timestamp) -> Result<(), StoreError> {
        ruleset.data_version += 1;
        ruleset.last_updated = Some(now);
        document::write_atomic(&self.ruleset_path, ruleset)?;
        document::write_atomic(&self.stamp_path, &ruleset.stamp())?;
        Ok(())
    }
}
