//! Record normalizer: maps raw upstream requirement text onto the canonical
//! classification.
//!
//! Upstream sources disagree on vocabulary ("visa free", "VOA", "e-Visa", a
//! bare integer meaning free-stay days). The match order is fixed and
//! significant: ETA phrasing like "electronic travel authorization" would
//! otherwise fall into the broader visa markers.

use crate::requirement::Requirement;

/// Marker substrings for each category, tested in declaration order.
/// "visa not required" must sit in the visa-free set so it is claimed
/// before the visa-required markers see the word "required".
const VISA_FREE_MARKERS: &[&str] = &[
    "visa free",
    "visa-free",
    "visa not required",
    "freedom of movement",
];
const VISA_ON_ARRIVAL_MARKERS: &[&str] = &["visa on arrival", "on arrival", "voa"];
const E_VISA_MARKERS: &[&str] = &["e-visa", "evisa", "e visa", "electronic visa"];
const ETA_MARKERS: &[&str] = &[
    "electronic travel",
    "travel authorization",
    "travel authorisation",
];
const VISA_REQUIRED_MARKERS: &[&str] = &["visa required", "visa-required", "consular", "visa"];

/// A normalized classification plus the stay duration when the raw text
/// itself stated one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedRequirement {
    pub requirement: Requirement,
    pub duration: Option<u32>,
}

impl NormalizedRequirement {
    fn of(requirement: Requirement) -> Self {
        Self {
            requirement,
            duration: None,
        }
    }
}

/// Normalize a raw requirement description.
///
/// A bare non-negative integer means visa-free entry with that many days of
/// stay. Otherwise the first matching category in the order visa-free,
/// visa-on-arrival, e-visa, eta, visa-required wins. Empty or unrecognized
/// input degrades to `unknown`; this function never fails.
pub fn normalize_requirement(raw: &str) -> NormalizedRequirement {
    let text = raw.trim().to_lowercase();
    if text.is_empty() {
        return NormalizedRequirement::of(Requirement::Unknown);
    }

    if let Ok(days) = text.parse::<u32>() {
        return NormalizedRequirement {
            requirement: Requirement::VisaFree,
            duration: Some(days),
        };
    }

    let categories: &[(&[&str], Requirement)] = &[
        (VISA_FREE_MARKERS, Requirement::VisaFree),
        (VISA_ON_ARRIVAL_MARKERS, Requirement::VisaOnArrival),
        (E_VISA_MARKERS, Requirement::EVisa),
        (ETA_MARKERS, Requirement::Eta),
        (VISA_REQUIRED_MARKERS, Requirement::VisaRequired),
    ];

    // "eta" alone is matched exactly; as a substring it is far too noisy.
    if text == "eta" {
        return NormalizedRequirement::of(Requirement::Eta);
    }

    for (markers, requirement) in categories {
        if markers.iter().any(|m| text.contains(m)) {
            return NormalizedRequirement::of(*requirement);
        }
    }

    NormalizedRequirement::of(Requirement::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_integer_means_visa_free_days() {
        let n = normalize_requirement("90");
        assert_eq!(n.requirement, Requirement::VisaFree);
        assert_eq!(n.duration, Some(90));
    }

    #[test]
    fn integer_with_whitespace_still_parses() {
        let n = normalize_requirement("  30 ");
        assert_eq!(n.requirement, Requirement::VisaFree);
        assert_eq!(n.duration, Some(30));
    }

    #[test]
    fn visa_free_phrasings() {
        for raw in ["visa free", "Visa-Free", "VISA NOT REQUIRED", "freedom of movement"] {
            assert_eq!(
                normalize_requirement(raw).requirement,
                Requirement::VisaFree,
                "raw = {raw:?}"
            );
        }
    }

    #[test]
    fn visa_on_arrival_phrasings() {
        for raw in ["visa on arrival", "Visa On Arrival", "VOA"] {
            assert_eq!(
                normalize_requirement(raw).requirement,
                Requirement::VisaOnArrival,
                "raw = {raw:?}"
            );
        }
    }

    #[test]
    fn e_visa_phrasings() {
        for raw in ["e-visa", "eVisa", "E VISA", "electronic visa"] {
            assert_eq!(
                normalize_requirement(raw).requirement,
                Requirement::EVisa,
                "raw = {raw:?}"
            );
        }
    }

    #[test]
    fn eta_phrasings() {
        for raw in ["eta", "ETA", "electronic travel authorization", "Electronic Travel Authorisation"] {
            assert_eq!(
                normalize_requirement(raw).requirement,
                Requirement::Eta,
                "raw = {raw:?}"
            );
        }
    }

    #[test]
    fn visa_required_phrasings() {
        for raw in ["visa required", "Visa-Required", "consular visa", "visa"] {
            assert_eq!(
                normalize_requirement(raw).requirement,
                Requirement::VisaRequired,
                "raw = {raw:?}"
            );
        }
    }

    #[test]
    fn visa_not_required_beats_required_marker() {
        // Contains "required" but must classify as visa-free.
        assert_eq!(
            normalize_requirement("visa not required").requirement,
            Requirement::VisaFree
        );
    }

    #[test]
    fn electronic_visa_beats_eta_markers() {
        // Category order: e-visa is tested before eta.
        assert_eq!(
            normalize_requirement("electronic visa authorization").requirement,
            Requirement::EVisa
        );
    }

    #[test]
    fn empty_and_garbage_degrade_to_unknown() {
        for raw in ["", "   ", "covid ban", "no admission", "???"] {
            assert_eq!(
                normalize_requirement(raw).requirement,
                Requirement::Unknown,
                "raw = {raw:?}"
            );
        }
    }

    #[test]
    fn normalization_is_deterministic() {
        for raw in ["90", "visa free", "eta", "garbage"] {
            assert_eq!(normalize_requirement(raw), normalize_requirement(raw));
        }
    }
}
