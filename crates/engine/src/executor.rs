//! The run executor: drains a budget-bounded prefix of the planned queue
//! against the external lookup, applies results without ever regressing
//! good data, and checkpoints both documents periodically so an abrupt
//! termination loses at most one checkpoint interval of work.

use std::time::Duration;

use chrono::Utc;

use visafeed_client::{
    lookup_with_retry, LookupOutcome, RequirementLookup, RetryConfig, StopSignal,
};
use visafeed_core::normalize::normalize_requirement;
use visafeed_core::planner::{plan_refresh, RefreshPolicy};
use visafeed_core::progress::ProgressState;
use visafeed_core::requirement::{RecordSource, RequirementRecord, Ruleset};
use visafeed_store::{ProgressStore, RulesetStore};

use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default lookups per run.
pub const DEFAULT_REQUEST_BUDGET: u32 = 250;

/// Default minimum delay between consecutive lookups. This delay is the
/// rate-limiting contract with the remote service, not a tuning knob.
pub const DEFAULT_INTER_REQUEST_DELAY_MS: u64 = 1200;

/// Default number of processed items between mid-run checkpoints.
pub const DEFAULT_CHECKPOINT_INTERVAL: u32 = 25;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Per-run executor limits.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum lookups issued in one run.
    pub request_budget: u32,
    /// Minimum delay enforced between consecutive lookups.
    pub inter_request_delay: Duration,
    /// Processed items between mid-run checkpoints.
    pub checkpoint_interval: u32,
    /// Period-wide lookup quota; `None` means unlimited.
    pub monthly_quota: Option<u32>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            request_budget: DEFAULT_REQUEST_BUDGET,
            inter_request_delay: Duration::from_millis(DEFAULT_INTER_REQUEST_DELAY_MS),
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            monthly_quota: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Run summary
// ---------------------------------------------------------------------------

/// Why the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The entire planned queue was drained.
    Complete,
    /// The per-run request budget was used up with work left.
    BudgetExhausted,
    /// The remote kept rate-limiting past the retry ceiling.
    RateLimited,
    /// The period quota is spent.
    QuotaExhausted,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::BudgetExhausted => "budget-exhausted",
            Self::RateLimited => "rate-limited",
            Self::QuotaExhausted => "quota-exhausted",
        }
    }

    /// Whether the run ended early on a terminal signal rather than by
    /// draining its budget or queue.
    pub fn is_terminal_signal(&self) -> bool {
        matches!(self, Self::RateLimited | Self::QuotaExhausted)
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// End-of-run accounting, logged and returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Queue size the planner produced.
    pub planned: usize,
    /// Items that reached a resolution (update, skip, or error).
    pub processed: u32,
    /// Records written.
    pub updated: u32,
    /// Lookups that answered but normalized to unknown.
    pub skipped: u32,
    /// Lookups that failed past the retry ceiling.
    pub errors: u32,
    pub stop_reason: StopReason,
    /// Planned items left untouched when the run ended.
    pub remaining_queue: usize,
    /// Runs of the current budget needed to drain the remainder.
    pub estimated_runs_left: u32,
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// One sequential refresh run over the configured pair universe.
pub struct RunExecutor<'a> {
    pub config: ExecutorConfig,
    pub retry: RetryConfig,
    pub policy: RefreshPolicy,
    pub universe: Vec<(String, String)>,
    pub ruleset_store: &'a RulesetStore,
    pub progress_store: &'a ProgressStore,
    pub lookup: &'a dyn RequirementLookup,
}

impl RunExecutor<'_> {
    /// Execute a full run: plan, drain, checkpoint, summarize.
    ///
    /// Per-pair failures never abort the run. Terminal signals end the
    /// loop but still flow through the final checkpoint.
    pub async fn run(&self) -> Result<RunSummary, EngineError> {
        self.policy.validate()?;

        let mut ruleset = self.ruleset_store.load();
        let mut progress = self.progress_store.load();

        let now = Utc::now();
        if progress.roll_period(now) {
            tracing::info!(period = %progress.period, "Budget period rolled, request counter reset");
        }

        let queue = plan_refresh(&ruleset, &self.universe, &self.policy, now);
        let planned = queue.len();

        let quota_remaining = progress.remaining_quota(self.config.monthly_quota);
        let budget = match quota_remaining {
            Some(q) => self.config.request_budget.min(q),
            None => self.config.request_budget,
        } as usize;
        let quota_is_the_cap =
            matches!(quota_remaining, Some(q) if q < self.config.request_budget);

        tracing::info!(
            planned,
            budget,
            requests_used_this_period = progress.requests_used,
            "Run planned",
        );

        let mut updated = 0u32;
        let mut skipped = 0u32;
        let mut errors = 0u32;
        let mut processed = 0u32;
        let mut signal_stop: Option<StopReason> = None;

        for item in queue.iter().take(budget) {
            if processed > 0 {
                tokio::time::sleep(self.config.inter_request_delay).await;
            }

            let outcome =
                lookup_with_retry(self.lookup, &item.passport, &item.destination, &self.retry)
                    .await;

            match outcome {
                LookupOutcome::Success(raw) => {
                    let normalized = normalize_requirement(&raw.requirement);
                    if normalized.requirement.is_known() {
                        let record = RequirementRecord {
                            requirement: normalized.requirement,
                            duration: raw.duration.or(normalized.duration),
                            notes: raw.notes,
                            last_checked: Some(Utc::now()),
                            source: Some(RecordSource::Api),
                        };
                        ruleset.apply_verified(&item.passport, &item.destination, record)?;
                        updated += 1;
                        tracing::debug!(
                            passport = %item.passport,
                            destination = %item.destination,
                            requirement = %normalized.requirement,
                            category = %item.category,
                            "Record updated",
                        );
                    } else {
                        skipped += 1;
                        tracing::debug!(
                            passport = %item.passport,
                            destination = %item.destination,
                            raw = %raw.requirement,
                            "Unrecognized requirement text, existing record preserved",
                        );
                    }
                }
                LookupOutcome::Skipped => {
                    errors += 1;
                }
                LookupOutcome::Stop(signal) => {
                    // Current item is abandoned without mutation or charge.
                    signal_stop = Some(match signal {
                        StopSignal::RateLimited => StopReason::RateLimited,
                        StopSignal::QuotaExceeded => StopReason::QuotaExhausted,
                    });
                    break;
                }
            }

            processed += 1;
            progress.charge(1);

            if self.config.checkpoint_interval > 0
                && processed % self.config.checkpoint_interval == 0
            {
                self.checkpoint(&mut ruleset, &progress)?;
                tracing::debug!(processed, "Mid-run checkpoint persisted");
            }
        }

        let stop_reason = signal_stop.unwrap_or(if (processed as usize) >= planned {
            StopReason::Complete
        } else if quota_is_the_cap {
            StopReason::QuotaExhausted
        } else {
            StopReason::BudgetExhausted
        });

        progress.total_updated += u64::from(updated);
        progress.total_errors += u64::from(skipped + errors);
        progress.last_run_at = Some(Utc::now());

        // Final checkpoint happens on every exit path.
        self.checkpoint(&mut ruleset, &progress)?;

        let remaining_queue = planned - processed as usize;
        let per_run = self.config.request_budget.max(1) as usize;
        let estimated_runs_left = remaining_queue.div_ceil(per_run) as u32;

        let summary = RunSummary {
            planned,
            processed,
            updated,
            skipped,
            errors,
            stop_reason,
            remaining_queue,
            estimated_runs_left,
        };

        tracing::info!(
            updated,
            skipped,
            errors,
            stop_reason = %summary.stop_reason,
            remaining_queue,
            estimated_runs_left,
            "Run finished",
        );

        Ok(summary)
    }

    fn checkpoint(
        &self,
        ruleset: &mut Ruleset,
        progress: &ProgressState,
    ) -> Result<(), EngineError> {
        self.ruleset_store.save(ruleset, Utc::now())?;
        self.progress_store.save(progress)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
