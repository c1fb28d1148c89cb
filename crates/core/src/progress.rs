//! Run-to-run progress bookkeeping.
//!
//! Freshness of individual records keys off each record's own `lastChecked`
//! timestamp, so this document only tracks what the ruleset cannot: the
//! current budget period and how many lookups have been charged against it,
//! plus cumulative totals for reporting. Persisted between runs, never
//! consumed by the mobile client.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Format a timestamp as the `YYYY-MM` period token used to detect and
/// reset periodic budgets.
pub fn period_token(now: Timestamp) -> String {
    now.format("%Y-%m").to_string()
}

/// Progress document persisted alongside the ruleset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    /// Budget period the request counter applies to, formatted `YYYY-MM`.
    pub period: String,
    /// Lookups charged against the period budget so far.
    pub requests_used: u32,
    /// Records written across all runs.
    pub total_updated: u64,
    /// Lookups skipped or errored across all runs.
    pub total_errors: u64,
    /// When a run last finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<Timestamp>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            period: String::new(),
            requests_used: 0,
            total_updated: 0,
            total_errors: 0,
            last_run_at: None,
        }
    }
}

impl ProgressState {
    /// Roll the document to the period containing `now`.
    ///
    /// Resets the request counter when the period changed (including the
    /// first run, when the stored token is empty). Returns whether a reset
    /// happened.
    pub fn roll_period(&mut self, now: Timestamp) -> bool {
        let token = period_token(now);
        if self.period != token {
            self.period = token;
            self.requests_used = 0;
            true
        } else {
            false
        }
    }

    /// Charge lookups against the period budget.
    pub fn charge(&mut self, requests: u32) {
        self.requests_used = self.requests_used.saturating_add(requests);
    }

    /// Requests left in the current period, or `None` when no quota is
    /// configured.
    pub fn remaining_quota(&self, quota: Option<u32>) -> Option<u32> {
        quota.map(|q| q.saturating_sub(self.requests_used))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(year: i32, month: u32, day: u32) -> Timestamp {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn period_token_format() {
        assert_eq!(period_token(at(2026, 8, 5)), "2026-08");
        assert_eq!(period_token(at(2026, 12, 31)), "2026-12");
    }

    #[test]
    fn first_roll_resets_from_empty() {
        let mut progress = ProgressState::default();
        assert!(progress.roll_period(at(2026, 8, 5)));
        assert_eq!(progress.period, "2026-08");
        assert_eq!(progress.requests_used, 0);
    }

    #[test]
    fn roll_within_same_month_preserves_counter() {
        let mut progress = ProgressState::default();
        progress.roll_period(at(2026, 8, 1));
        progress.charge(40);

        assert!(!progress.roll_period(at(2026, 8, 28)));
        assert_eq!(progress.requests_used, 40);
    }

    #[test]
    fn roll_into_new_month_resets_counter() {
        let mut progress = ProgressState::default();
        progress.roll_period(at(2026, 7, 31));
        progress.charge(500);

        assert!(progress.roll_period(at(2026, 8, 1)));
        assert_eq!(progress.period, "2026-08");
        assert_eq!(progress.requests_used, 0);
    }

    #[test]
    fn charge_saturates() {
        let mut progress = ProgressState::default();
        progress.requests_used = u32::MAX - 1;
        progress.charge(10);
        assert_eq!(progress.requests_used, u32::MAX);
    }

    #[test]
    fn remaining_quota_without_limit_is_none() {
        let progress = ProgressState::default();
        assert_eq!(progress.remaining_quota(None), None);
    }

    #[test]
    fn remaining_quota_subtracts_usage() {
        let mut progress = ProgressState::default();
        progress.charge(30);
        assert_eq!(progress.remaining_quota(Some(100)), Some(70));
    }

    #[test]
    fn remaining_quota_clamps_at_zero() {
        let mut progress = ProgressState::default();
        progress.charge(150);
        assert_eq!(progress.remaining_quota(Some(100)), Some(0));
    }

    #[test]
    fn progress_document_roundtrip() {
        let mut progress = ProgressState::default();
        progress.roll_period(at(2026, 8, 5));
        progress.charge(12);
        progress.total_updated = 340;
        progress.total_errors = 9;
        progress.last_run_at = Some(at(2026, 8, 5));

        let json = serde_json::to_string(&progress).unwrap();
        let parsed: ProgressState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, progress);
    }

    #[test]
    fn progress_serializes_camel_case() {
        let progress = ProgressState::default();
        let json = serde_json::to_value(&progress).unwrap();
        assert!(json.get("requestsUsed").is_some());
        assert!(json.get("totalUpdated").is_some());
    }
}
