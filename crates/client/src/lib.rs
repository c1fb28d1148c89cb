//! External lookup collaborator: the `RequirementLookup` trait, the
//! production HTTP client, and the bounded retry wrapper the executor
//! drives lookups through.

pub mod api;
pub mod lookup;
pub mod retry;

pub use api::VisaApi;
pub use lookup::{LookupError, RawRequirement, RequirementLookup};
pub use retry::{lookup_with_retry, LookupOutcome, RetryConfig, StopSignal};
