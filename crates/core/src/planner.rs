//! Refresh queue planner.
//!
//! Classifies every pair of interest against the current ruleset and orders
//! the resulting work so a budget-bounded prefix always covers the highest
//! value checks first. Pure and deterministic: identical inputs produce an
//! identical queue, which is what makes interrupted runs safe to re-plan.

use std::collections::BTreeSet;

use crate::error::CoreError;
use crate::requirement::Ruleset;
use crate::types::Timestamp;

/// Default age in days below which a record is considered fresh.
pub const DEFAULT_FRESH_DAYS: i64 = 90;

/// Default age in days at which a record becomes critically stale.
pub const DEFAULT_CRITICAL_DAYS: i64 = 180;

// ---------------------------------------------------------------------------
// RefreshCategory
// ---------------------------------------------------------------------------

/// Why a pair was queued. Declaration order is priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshCategory {
    /// No record, or only an unknown one.
    Missing,
    /// A good record exists but was never confirmed by a live check.
    Unverified,
    /// Last check is at least the critical threshold old.
    Critical,
    /// Last check is between the fresh and critical thresholds.
    Stale,
}

impl RefreshCategory {
    /// Sort rank; lower runs first.
    fn rank(&self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Unverified => 1,
            Self::Critical => 2,
            Self::Stale => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Unverified => "unverified",
            Self::Critical => "critical",
            Self::Stale => "stale",
        }
    }
}

impl std::fmt::Display for RefreshCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// WorkItem
// ---------------------------------------------------------------------------

/// One queued lookup: a pair plus the classification that queued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub passport: String,
    pub destination: String,
    pub category: RefreshCategory,
    /// Age in days of the record's last check; `None` when never checked.
    pub age_days: Option<i64>,
}

impl WorkItem {
    /// Age for ordering purposes: never-checked sorts as oldest.
    fn age_value(&self) -> i64 {
        self.age_days.unwrap_or(i64::MAX)
    }
}

// ---------------------------------------------------------------------------
// RefreshPolicy
// ---------------------------------------------------------------------------

/// Tunable thresholds and passport priorities for the planner.
///
/// The presets replace what used to be separate near-identical script
/// variants; pick one and override fields as needed.
#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    /// Records younger than this many days are not touched.
    pub fresh_days: i64,
    /// Records at least this many days old are critically stale.
    pub critical_days: i64,
    /// Passports whose pairs sort ahead of others within each category.
    pub priority_passports: BTreeSet<String>,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self::conservative()
    }
}

impl RefreshPolicy {
    /// Quarterly refresh cadence; suitable for small request budgets.
    pub fn conservative() -> Self {
        Self {
            fresh_days: DEFAULT_FRESH_DAYS,
            critical_days: DEFAULT_CRITICAL_DAYS,
            priority_passports: BTreeSet::new(),
        }
    }

    /// Monthly refresh cadence; burns budget much faster.
    pub fn aggressive() -> Self {
        Self {
            fresh_days: 30,
            critical_days: 90,
            priority_passports: BTreeSet::new(),
        }
    }

    /// Check the threshold ordering the classification relies on.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.fresh_days < 1 {
            return Err(CoreError::Validation(format!(
                "fresh_days must be at least 1, got {}",
                self.fresh_days
            )));
        }
        if self.fresh_days >= self.critical_days {
            return Err(CoreError::Validation(format!(
                "fresh_days ({}) must be below critical_days ({})",
                self.fresh_days, self.critical_days
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Produce the priority-ordered work queue for a run.
///
/// Classification per pair:
/// - no record, or an unknown one -> `missing`
/// - good record never confirmed live -> `unverified`
/// - age >= `critical_days` -> `critical`
/// - age in `[fresh_days, critical_days)` -> `stale`
/// - age < `fresh_days` -> excluded entirely
///
/// Ordering: category, then priority passports first, then oldest first,
/// then (passport, destination) lexicographically as the final tie-break.
/// The caller takes a budget-bounded prefix.
pub fn plan_refresh(
    ruleset: &Ruleset,
    universe: &[(String, String)],
    policy: &RefreshPolicy,
    now: Timestamp,
) -> Vec<WorkItem> {
    let mut items = Vec::new();

    for (passport, destination) in universe {
        if passport == destination {
            continue;
        }

        let record = ruleset.get(passport, destination);
        let classified = match record {
            None => Some((RefreshCategory::Missing, None)),
            Some(r) if !r.is_good() => Some((RefreshCategory::Missing, r.age_days(now))),
            Some(r) => match r.age_days(now) {
                None => Some((RefreshCategory::Unverified, None)),
                Some(age) if age >= policy.critical_days => {
                    Some((RefreshCategory::Critical, Some(age)))
                }
                Some(age) if age >= policy.fresh_days => {
                    Some((RefreshCategory::Stale, Some(age)))
                }
                Some(_) => None,
            },
        };

        if let Some((category, age_days)) = classified {
            items.push(WorkItem {
                passport: passport.clone(),
                destination: destination.clone(),
                category,
                age_days,
            });
        }
    }

    items.sort_by(|a, b| {
        let a_priority = policy.priority_passports.contains(&a.passport);
        let b_priority = policy.priority_passports.contains(&b.passport);
        a.category
            .rank()
            .cmp(&b.category.rank())
            .then_with(|| b_priority.cmp(&a_priority))
            .then_with(|| b.age_value().cmp(&a.age_value()))
            .then_with(|| a.passport.cmp(&b.passport))
            .then_with(|| a.destination.cmp(&b.destination))
    });

    items
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
