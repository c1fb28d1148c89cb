//! The lookup collaborator interface the executor depends on.

use serde::Deserialize;

/// Raw (un-normalized) lookup result: whatever requirement text the remote
/// service uses, plus optional stay duration and notes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawRequirement {
    pub requirement: String,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Error taxonomy for a single lookup attempt.
///
/// `Transport` and `Api` are recoverable (the attempt may be retried and
/// the pair eventually skipped); `RateLimited` escalates to a run-terminal
/// stop once retries are exhausted; `QuotaExceeded` is terminal
/// immediately.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Lookup request failed: {0}")]
    Transport(String),

    #[error("Lookup API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Lookup rate limited by remote service")]
    RateLimited,

    #[error("Lookup quota exhausted for the current period")]
    QuotaExceeded,
}

impl LookupError {
    /// Whether another attempt at the same pair may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Api { .. })
    }
}

/// A source of requirement facts for (passport, destination) pairs.
///
/// The production implementation is [`crate::api::VisaApi`]; tests drive
/// the executor with scripted stubs.
#[async_trait::async_trait]
pub trait RequirementLookup: Send + Sync {
    async fn lookup(
        &self,
        passport: &str,
        destination: &str,
    ) -> Result<RawRequirement, LookupError>;
}
