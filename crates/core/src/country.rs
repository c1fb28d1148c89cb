//! Country code validation and pair-universe construction.
//!
//! The country set is always an injected configuration value, never a
//! hard-coded constant, so tests can run against small synthetic sets.

use std::collections::HashSet;

use crate::error::CoreError;

/// Validate an ISO 3166-1 alpha-2 country code: exactly two uppercase
/// ASCII letters.
pub fn validate_country_code(code: &str) -> Result<(), CoreError> {
    if code.len() == 2 && code.bytes().all(|b| b.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid country code '{code}': expected two uppercase ASCII letters"
        )))
    }
}

/// Which (passport, destination) pairs a run considers at all.
#[derive(Debug, Clone)]
pub enum PairScope {
    /// Every ordered pair drawn from the configured country set.
    All,
    /// Only the given passports, each against every configured country.
    Passports(Vec<String>),
    /// An explicit curated pair list.
    Curated(Vec<(String, String)>),
}

/// Build the ordered list of pairs of interest for a run.
///
/// Self-pairs are excluded in every scope, and curated duplicates are
/// dropped while preserving first-occurrence order. The output order is a
/// pure function of the inputs, which keeps the planner deterministic.
pub fn build_pair_universe(countries: &[String], scope: &PairScope) -> Vec<(String, String)> {
    match scope {
        PairScope::All => cross(countries, countries),
        PairScope::Passports(passports) => cross(passports, countries),
        PairScope::Curated(pairs) => {
            let mut seen = HashSet::new();
            pairs
                .iter()
                .filter(|(p, d)| p != d)
                .filter(|pair| seen.insert((*pair).clone()))
                .cloned()
                .collect()
        }
    }
}

fn cross(passports: &[String], destinations: &[String]) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(passports.len() * destinations.len());
    for p in passports {
        for d in destinations {
            if p != d {
                pairs.push((p.clone(), d.clone()));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    // -- validate_country_code --

    #[test]
    fn valid_codes_accepted() {
        assert!(validate_country_code("GB").is_ok());
        assert!(validate_country_code("FR").is_ok());
        assert!(validate_country_code("US").is_ok());
    }

    #[test]
    fn lowercase_rejected() {
        assert!(validate_country_code("gb").is_err());
    }

    #[test]
    fn wrong_length_rejected() {
        assert!(validate_country_code("").is_err());
        assert!(validate_country_code("G").is_err());
        assert!(validate_country_code("GBR").is_err());
    }

    #[test]
    fn non_alphabetic_rejected() {
        assert!(validate_country_code("G1").is_err());
        assert!(validate_country_code("G-").is_err());
    }

    // -- build_pair_universe --

    #[test]
    fn all_scope_excludes_self_pairs() {
        let countries = codes(&["GB", "FR", "DE"]);
        let pairs = build_pair_universe(&countries, &PairScope::All);
        assert_eq!(pairs.len(), 6);
        assert!(pairs.iter().all(|(p, d)| p != d));
    }

    #[test]
    fn all_scope_is_ordered() {
        let countries = codes(&["GB", "FR"]);
        let pairs = build_pair_universe(&countries, &PairScope::All);
        assert_eq!(
            pairs,
            vec![
                ("GB".to_string(), "FR".to_string()),
                ("FR".to_string(), "GB".to_string()),
            ]
        );
    }

    #[test]
    fn passport_scope_restricts_origins() {
        let countries = codes(&["GB", "FR", "DE"]);
        let scope = PairScope::Passports(codes(&["GB"]));
        let pairs = build_pair_universe(&countries, &scope);
        assert_eq!(
            pairs,
            vec![
                ("GB".to_string(), "FR".to_string()),
                ("GB".to_string(), "DE".to_string()),
            ]
        );
    }

    #[test]
    fn passport_scope_excludes_self_pair() {
        let countries = codes(&["GB", "FR"]);
        let scope = PairScope::Passports(codes(&["GB"]));
        let pairs = build_pair_universe(&countries, &scope);
        assert!(!pairs.contains(&("GB".to_string(), "GB".to_string())));
    }

    #[test]
    fn curated_scope_drops_self_pairs_and_duplicates() {
        let scope = PairScope::Curated(vec![
            ("GB".to_string(), "FR".to_string()),
            ("GB".to_string(), "GB".to_string()),
            ("GB".to_string(), "FR".to_string()),
            ("FR".to_string(), "DE".to_string()),
        ]);
        let pairs = build_pair_universe(&[], &scope);
        assert_eq!(
            pairs,
            vec![
                ("GB".to_string(), "FR".to_string()),
                ("FR".to_string(), "DE".to_string()),
            ]
        );
    }
}
