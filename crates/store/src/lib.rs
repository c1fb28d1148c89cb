//! File-backed persistence for the ruleset, version stamp, and progress
//! documents.
//!
//! Reads never fail the run: a missing or unreadable document degrades to
//! its default ("start fresh") with a log line. Writes go through a
//! write-to-temp-then-rename sequence so a concurrent reader never observes
//! a partially written document.

pub mod document;
pub mod error;
pub mod progress;
pub mod ruleset;

pub use error::StoreError;
pub use progress::ProgressStore;
pub use ruleset::RulesetStore;
