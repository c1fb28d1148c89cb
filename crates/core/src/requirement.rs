//! Canonical requirement records and the versioned ruleset document.
//!
//! The ruleset is the document the mobile client downloads, so field names
//! are camelCase on the wire and maps are BTreeMaps for deterministic
//! serialization. The apply rules here are the single place where the
//! "never overwrite good data with an unknown result" invariant is enforced.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::country::validate_country_code;
use crate::error::CoreError;
use crate::types::Timestamp;

/// Schema version written into every ruleset document.
pub const SCHEMA_VERSION: &str = "2.0.0";

// ---------------------------------------------------------------------------
// Requirement
// ---------------------------------------------------------------------------

/// Canonical entry-formality classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Requirement {
    VisaFree,
    VisaOnArrival,
    EVisa,
    Eta,
    VisaRequired,
    Unknown,
}

impl Requirement {
    /// Wire representation, matching the serde encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VisaFree => "visa-free",
            Self::VisaOnArrival => "visa-on-arrival",
            Self::EVisa => "e-visa",
            Self::Eta => "eta",
            Self::VisaRequired => "visa-required",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a wire string. Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "visa-free" => Some(Self::VisaFree),
            "visa-on-arrival" => Some(Self::VisaOnArrival),
            "e-visa" => Some(Self::EVisa),
            "eta" => Some(Self::Eta),
            "visa-required" => Some(Self::VisaRequired),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Whether this classification carries real information. `unknown`
    /// records are never treated as good data.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RecordSource
// ---------------------------------------------------------------------------

/// Provenance of a record: seeded from the static dataset or verified by a
/// live API check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    Dataset,
    Api,
}

impl RecordSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dataset => "dataset",
            Self::Api => "api",
        }
    }
}

// ---------------------------------------------------------------------------
// RequirementRecord
// ---------------------------------------------------------------------------

/// One fact: the entry requirement for an (origin passport, destination)
/// pair, with optional stay duration and provenance metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementRecord {
    pub requirement: Requirement,
    /// Days of permitted stay, when the source states one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// When a live check last confirmed this record. Absent for records
    /// that were only ever seeded from the dataset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<RecordSource>,
}

impl RequirementRecord {
    /// Whether this record is good data that must be protected from
    /// overwrite by unknown or failed results.
    pub fn is_good(&self) -> bool {
        self.requirement.is_known()
    }

    /// Age of the last successful check in whole days, or `None` if the
    /// record was never verified live.
    pub fn age_days(&self, now: Timestamp) -> Option<i64> {
        self.last_checked.map(|t| (now - t).num_days())
    }
}

// ---------------------------------------------------------------------------
// Ruleset
// ---------------------------------------------------------------------------

/// Outcome of applying an incoming record to the ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A new entry was written for a pair that had no good record.
    Created,
    /// An existing entry was replaced.
    Updated,
    /// The existing data (possibly nothing) was kept untouched.
    Preserved,
}

/// The full `passport -> destination -> record` mapping plus document
/// metadata, persisted as a single versioned JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ruleset {
    /// Schema version of the document format.
    pub version: String,
    /// Timestamp of the last successful save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Timestamp>,
    /// Monotonically increasing write counter, bumped on every save.
    pub data_version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub rules: BTreeMap<String, BTreeMap<String, RequirementRecord>>,
}

impl Default for Ruleset {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            last_updated: None,
            data_version: 0,
            source: None,
            rules: BTreeMap::new(),
        }
    }
}

impl Ruleset {
    /// Look up the record for a pair.
    pub fn get(&self, passport: &str, destination: &str) -> Option<&RequirementRecord> {
        self.rules.get(passport).and_then(|m| m.get(destination))
    }

    /// Total number of stored pair records.
    pub fn pair_count(&self) -> usize {
        self.rules.values().map(|m| m.len()).sum()
    }

    /// Apply a record produced by a live check.
    ///
    /// Unknown classifications never write: whatever was stored (including
    /// nothing) is preserved. Known classifications always write, replacing
    /// any prior record for the pair.
    pub fn apply_verified(
        &mut self,
        passport: &str,
        destination: &str,
        record: RequirementRecord,
    ) -> Result<ApplyOutcome, CoreError> {
        self.validate_pair(passport, destination)?;
        if !record.is_good() {
            return Ok(ApplyOutcome::Preserved);
        }
        let existed = self.get(passport, destination).is_some();
        self.insert(passport, destination, record);
        Ok(if existed {
            ApplyOutcome::Updated
        } else {
            ApplyOutcome::Created
        })
    }

    /// Apply a record seeded from the static dataset.
    ///
    /// Seeds only fill gaps: a pair that already has a good record keeps
    /// it (dataset provenance is weaker than an API-verified record), and
    /// unknown seeds never write at all.
    pub fn apply_seed(
        &mut self,
        passport: &str,
        destination: &str,
        record: RequirementRecord,
    ) -> Result<ApplyOutcome, CoreError> {
        self.validate_pair(passport, destination)?;
        if !record.is_good() {
            return Ok(ApplyOutcome::Preserved);
        }
        match self.get(passport, destination) {
            Some(existing) if existing.is_good() => Ok(ApplyOutcome::Preserved),
            Some(_) => {
                self.insert(passport, destination, record);
                Ok(ApplyOutcome::Updated)
            }
            None => {
                self.insert(passport, destination, record);
                Ok(ApplyOutcome::Created)
            }
        }
    }

    /// Companion stamp document describing this ruleset's freshness.
    pub fn stamp(&self) -> VersionStamp {
        VersionStamp {
            version: self.version.clone(),
            last_updated: self.last_updated,
            data_version: self.data_version,
        }
    }

    fn validate_pair(&self, passport: &str, destination: &str) -> Result<(), CoreError> {
        validate_country_code(passport)?;
        validate_country_code(destination)?;
        if passport == destination {
            return Err(CoreError::Validation(format!(
                "Self-pair {passport} -> {destination} is not a valid rule"
            )));
        }
        Ok(())
    }

    fn insert(&mut self, passport: &str, destination: &str, record: RequirementRecord) {
        self.rules
            .entry(passport.to_string())
            .or_default()
            .insert(destination.to_string(), record);
    }
}

// ---------------------------------------------------------------------------
// VersionStamp
// ---------------------------------------------------------------------------

/// Lightweight companion document the mobile client polls to detect
/// freshness without downloading the full ruleset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionStamp {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Timestamp>,
    pub data_version: u64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn verified(requirement: Requirement, duration: Option<u32>) -> RequirementRecord {
        RequirementRecord {
            requirement,
            duration,
            notes: None,
            last_checked: Some(Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()),
            source: Some(RecordSource::Api),
        }
    }

    fn seeded(requirement: Requirement) -> RequirementRecord {
        RequirementRecord {
            requirement,
            duration: None,
            notes: None,
            last_checked: None,
            source: Some(RecordSource::Dataset),
        }
    }

    // -- Requirement --

    #[test]
    fn requirement_as_str_roundtrips() {
        for r in [
            Requirement::VisaFree,
            Requirement::VisaOnArrival,
            Requirement::EVisa,
            Requirement::Eta,
            Requirement::VisaRequired,
            Requirement::Unknown,
        ] {
            assert_eq!(Requirement::from_str(r.as_str()), Some(r));
        }
    }

    #[test]
    fn requirement_from_str_rejects_garbage() {
        assert_eq!(Requirement::from_str("visa"), None);
        assert_eq!(Requirement::from_str(""), None);
    }

    #[test]
    fn requirement_serde_uses_kebab_case() {
        let json = serde_json::to_string(&Requirement::VisaOnArrival).unwrap();
        assert_eq!(json, "\"visa-on-arrival\"");
        let json = serde_json::to_string(&Requirement::EVisa).unwrap();
        assert_eq!(json, "\"e-visa\"");
    }

    #[test]
    fn unknown_is_not_known() {
        assert!(!Requirement::Unknown.is_known());
        assert!(Requirement::VisaFree.is_known());
    }

    #[test]
    fn record_source_strings_match_wire_format() {
        assert_eq!(RecordSource::Dataset.as_str(), "dataset");
        assert_eq!(RecordSource::Api.as_str(), "api");
        assert_eq!(
            serde_json::to_string(&RecordSource::Api).unwrap(),
            "\"api\""
        );
    }

    // -- RequirementRecord --

    #[test]
    fn record_serde_uses_camel_case_and_skips_absent_fields() {
        let record = seeded(Requirement::VisaFree);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["requirement"], "visa-free");
        assert_eq!(json["source"], "dataset");
        assert!(json.get("lastChecked").is_none());
        assert!(json.get("duration").is_none());
    }

    #[test]
    fn record_age_days() {
        let now = Utc.with_ymd_and_hms(2026, 8, 5, 0, 0, 0).unwrap();
        let mut record = verified(Requirement::VisaFree, Some(90));
        record.last_checked = Some(Utc.with_ymd_and_hms(2026, 7, 26, 0, 0, 0).unwrap());
        assert_eq!(record.age_days(now), Some(10));
        assert_eq!(seeded(Requirement::VisaFree).age_days(now), None);
    }

    // -- apply_verified --

    #[test]
    fn verified_write_creates_then_updates() {
        let mut ruleset = Ruleset::default();
        let outcome = ruleset
            .apply_verified("GB", "FR", verified(Requirement::VisaFree, Some(90)))
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Created);

        let outcome = ruleset
            .apply_verified("GB", "FR", verified(Requirement::EVisa, None))
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Updated);
        assert_eq!(
            ruleset.get("GB", "FR").unwrap().requirement,
            Requirement::EVisa
        );
    }

    #[test]
    fn unknown_never_overwrites_good_record() {
        let mut ruleset = Ruleset::default();
        ruleset
            .apply_verified("GB", "FR", verified(Requirement::VisaFree, Some(90)))
            .unwrap();
        let before = ruleset.get("GB", "FR").unwrap().clone();

        let outcome = ruleset
            .apply_verified("GB", "FR", verified(Requirement::Unknown, None))
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Preserved);
        assert_eq!(ruleset.get("GB", "FR").unwrap(), &before);
    }

    #[test]
    fn unknown_never_writes_into_empty_slot() {
        let mut ruleset = Ruleset::default();
        let outcome = ruleset
            .apply_verified("GB", "FR", verified(Requirement::Unknown, None))
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Preserved);
        assert!(ruleset.get("GB", "FR").is_none());
        assert_eq!(ruleset.pair_count(), 0);
    }

    #[test]
    fn self_pair_rejected() {
        let mut ruleset = Ruleset::default();
        assert!(ruleset
            .apply_verified("GB", "GB", verified(Requirement::VisaFree, None))
            .is_err());
    }

    #[test]
    fn invalid_codes_rejected() {
        let mut ruleset = Ruleset::default();
        assert!(ruleset
            .apply_verified("gb", "FR", verified(Requirement::VisaFree, None))
            .is_err());
        assert!(ruleset
            .apply_verified("GBR", "FR", verified(Requirement::VisaFree, None))
            .is_err());
    }

    // -- apply_seed --

    #[test]
    fn seed_fills_gap() {
        let mut ruleset = Ruleset::default();
        let outcome = ruleset
            .apply_seed("GB", "FR", seeded(Requirement::VisaFree))
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Created);
    }

    #[test]
    fn seed_never_replaces_verified_record() {
        let mut ruleset = Ruleset::default();
        ruleset
            .apply_verified("GB", "FR", verified(Requirement::EVisa, None))
            .unwrap();
        let before = ruleset.get("GB", "FR").unwrap().clone();

        let outcome = ruleset
            .apply_seed("GB", "FR", seeded(Requirement::VisaFree))
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Preserved);
        assert_eq!(ruleset.get("GB", "FR").unwrap(), &before);
    }

    #[test]
    fn unknown_seed_is_dropped() {
        let mut ruleset = Ruleset::default();
        let outcome = ruleset
            .apply_seed("GB", "FR", seeded(Requirement::Unknown))
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Preserved);
        assert!(ruleset.get("GB", "FR").is_none());
    }

    // -- Ruleset document --

    #[test]
    fn default_ruleset_is_empty_at_version_zero() {
        let ruleset = Ruleset::default();
        assert_eq!(ruleset.version, SCHEMA_VERSION);
        assert_eq!(ruleset.data_version, 0);
        assert_eq!(ruleset.pair_count(), 0);
        assert!(ruleset.last_updated.is_none());
    }

    #[test]
    fn ruleset_document_roundtrip() {
        let mut ruleset = Ruleset::default();
        ruleset
            .apply_verified("GB", "FR", verified(Requirement::VisaFree, Some(90)))
            .unwrap();
        ruleset.data_version = 7;

        let json = serde_json::to_string(&ruleset).unwrap();
        let parsed: Ruleset = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ruleset);
    }

    #[test]
    fn ruleset_serializes_camel_case_metadata() {
        let ruleset = Ruleset::default();
        let json = serde_json::to_value(&ruleset).unwrap();
        assert!(json.get("dataVersion").is_some());
        assert!(json.get("rules").is_some());
    }

    #[test]
    fn stamp_mirrors_ruleset_metadata() {
        let mut ruleset = Ruleset::default();
        ruleset.data_version = 12;
        ruleset.last_updated = Some(Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap());

        let stamp = ruleset.stamp();
        assert_eq!(stamp.version, ruleset.version);
        assert_eq!(stamp.data_version, 12);
        assert_eq!(stamp.last_updated, ruleset.last_updated);
    }
}
