//! Seed import: feeds a tabular (passport, destination, requirement text)
//! source through the normalizer into the ruleset.
//!
//! Pure parsing and application; reading the file is the caller's job.
//! Seeded records carry dataset provenance and no `lastChecked`, so the
//! planner schedules them for live verification as `unverified`.

use visafeed_core::country::validate_country_code;
use visafeed_core::normalize::normalize_requirement;
use visafeed_core::requirement::{ApplyOutcome, RecordSource, RequirementRecord, Ruleset};

/// Per-action counters for one seed import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Rows that created a new record.
    pub imported: u32,
    /// Rows that replaced a non-good record.
    pub replaced: u32,
    /// Rows whose pair already had a good record.
    pub preserved: u32,
    /// Rows whose requirement text normalized to unknown.
    pub skipped_unknown: u32,
    /// Rows with malformed codes, self-pairs, or too few fields.
    pub invalid_rows: u32,
}

impl SeedReport {
    /// Rows that changed the ruleset.
    pub fn written(&self) -> u32 {
        self.imported + self.replaced
    }
}

/// Parse one seed row: `passport,destination,requirement text`.
///
/// The requirement text may itself contain commas. Returns `None` for
/// blank lines, comments, and rows with fewer than three fields.
pub fn parse_seed_row(line: &str) -> Option<(String, String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let mut fields = line.splitn(3, ',');
    let passport = fields.next()?.trim().to_uppercase();
    let destination = fields.next()?.trim().to_uppercase();
    let text = fields.next()?.trim().trim_matches('"').to_string();
    Some((passport, destination, text))
}

/// Import seed rows into the ruleset.
///
/// A leading header row (first field `passport`, any case) is skipped.
/// Every other row is validated, normalized, and applied under the same
/// never-overwrite-good-data rule as the live refresh path.
pub fn import_seed<I>(ruleset: &mut Ruleset, lines: I) -> SeedReport
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut report = SeedReport::default();
    let mut saw_row = false;

    for line in lines {
        let line = line.as_ref();
        let Some((passport, destination, text)) = parse_seed_row(line) else {
            if !line.trim().is_empty() && !line.trim().starts_with('#') {
                report.invalid_rows += 1;
            }
            continue;
        };

        if !saw_row {
            saw_row = true;
            if passport.eq_ignore_ascii_case("passport") {
                continue;
            }
        }

        if validate_country_code(&passport).is_err()
            || validate_country_code(&destination).is_err()
            || passport == destination
        {
            report.invalid_rows += 1;
            tracing::debug!(%passport, %destination, "Invalid seed row dropped");
            continue;
        }

        let normalized = normalize_requirement(&text);
        if !normalized.requirement.is_known() {
            report.skipped_unknown += 1;
            continue;
        }

        let record = RequirementRecord {
            requirement: normalized.requirement,
            duration: normalized.duration,
            notes: None,
            last_checked: None,
            source: Some(RecordSource::Dataset),
        };

        match ruleset.apply_seed(&passport, &destination, record) {
            Ok(ApplyOutcome::Created) => report.imported += 1,
            Ok(ApplyOutcome::Updated) => report.replaced += 1,
            Ok(ApplyOutcome::Preserved) => report.preserved += 1,
            Err(_) => report.invalid_rows += 1,
        }
    }

    report
}
