use std::path::PathBuf;
use std::time::Duration;

use visafeed_client::RetryConfig;
use visafeed_core::planner::RefreshPolicy;
use visafeed_engine::ExecutorConfig;

use crate::countries;

/// Worker configuration loaded from environment variables.
///
/// All fields except the API URL have defaults suitable for a first run
/// against a fresh data directory.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Lookup API base URL.
    pub api_url: String,
    /// API key sent with every lookup.
    pub api_key: String,
    /// Path of the ruleset document.
    pub ruleset_path: PathBuf,
    /// Path of the companion version stamp.
    pub stamp_path: PathBuf,
    /// Path of the progress document.
    pub progress_path: PathBuf,
    /// Optional tabular seed file imported before the run.
    pub seed_path: Option<PathBuf>,
    /// Optional JSON file with an explicit curated pair list.
    pub curated_pairs_path: Option<PathBuf>,
    /// The country set the pair universe is built from.
    pub countries: Vec<String>,
    /// When non-empty, restricts the universe to these passports.
    pub passports: Vec<String>,
    /// Passports sorted ahead of others within each refresh category.
    pub priority_passports: Vec<String>,
    pub request_budget: u32,
    pub inter_request_delay_ms: u64,
    pub fresh_days: i64,
    pub critical_days: i64,
    pub checkpoint_interval: u32,
    pub max_retries: u32,
    pub retry_initial_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub retry_backoff_multiplier: f64,
    /// Period-wide lookup quota; unset means unlimited.
    pub monthly_quota: Option<u32>,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                  |
    /// |----------------------------|--------------------------|
    /// | `VISA_API_URL`             | (required)               |
    /// | `VISA_API_KEY`             | empty                    |
    /// | `DATA_DIR`                 | `data`                   |
    /// | `RULESET_PATH`             | `{DATA_DIR}/visa-rules.json` |
    /// | `STAMP_PATH`               | `{DATA_DIR}/version.json`|
    /// | `PROGRESS_PATH`            | `{DATA_DIR}/progress.json` |
    /// | `SEED_PATH`                | unset                    |
    /// | `CURATED_PAIRS_PATH`       | unset                    |
    /// | `COUNTRIES`                | built-in ISO alpha-2 set |
    /// | `PASSPORTS`                | empty (all passports)    |
    /// | `PRIORITY_PASSPORTS`       | empty                    |
    /// | `REQUEST_BUDGET`           | `250`                    |
    /// | `INTER_REQUEST_DELAY_MS`   | `1200`                   |
    /// | `FRESH_DAYS`               | `90`                     |
    /// | `CRITICAL_DAYS`            | `180`                    |
    /// | `CHECKPOINT_INTERVAL`      | `25`                     |
    /// | `MAX_RETRIES`              | `3`                      |
    /// | `RETRY_INITIAL_DELAY_MS`   | `1000`                   |
    /// | `RETRY_MAX_DELAY_MS`       | `30000`                  |
    /// | `RETRY_BACKOFF_MULTIPLIER` | `2.0`                    |
    /// | `MONTHLY_REQUEST_QUOTA`    | unset (unlimited)        |
    pub fn from_env() -> Self {
        let api_url = std::env::var("VISA_API_URL").expect("VISA_API_URL must be set");
        let api_key = std::env::var("VISA_API_KEY").unwrap_or_default();

        let data_dir = PathBuf::from(env_or("DATA_DIR", "data"));
        let ruleset_path = std::env::var("RULESET_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("visa-rules.json"));
        let stamp_path = std::env::var("STAMP_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("version.json"));
        let progress_path = std::env::var("PROGRESS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("progress.json"));

        let countries = match std::env::var("COUNTRIES") {
            Ok(value) => parse_list(&value),
            Err(_) => countries::default_countries(),
        };

        Self {
            api_url,
            api_key,
            ruleset_path,
            stamp_path,
            progress_path,
            seed_path: std::env::var("SEED_PATH").ok().map(PathBuf::from),
            curated_pairs_path: std::env::var("CURATED_PAIRS_PATH").ok().map(PathBuf::from),
            countries,
            passports: parse_list(&env_or("PASSPORTS", "")),
            priority_passports: parse_list(&env_or("PRIORITY_PASSPORTS", "")),
            request_budget: env_parse("REQUEST_BUDGET", "250"),
            inter_request_delay_ms: env_parse("INTER_REQUEST_DELAY_MS", "1200"),
            fresh_days: env_parse("FRESH_DAYS", "90"),
            critical_days: env_parse("CRITICAL_DAYS", "180"),
            checkpoint_interval: env_parse("CHECKPOINT_INTERVAL", "25"),
            max_retries: env_parse("MAX_RETRIES", "3"),
            retry_initial_delay_ms: env_parse("RETRY_INITIAL_DELAY_MS", "1000"),
            retry_max_delay_ms: env_parse("RETRY_MAX_DELAY_MS", "30000"),
            retry_backoff_multiplier: env_parse("RETRY_BACKOFF_MULTIPLIER", "2.0"),
            monthly_quota: std::env::var("MONTHLY_REQUEST_QUOTA")
                .ok()
                .map(|v| v.parse().expect("MONTHLY_REQUEST_QUOTA must be a valid u32")),
        }
    }

    /// Executor limits derived from this configuration.
    pub fn executor(&self) -> ExecutorConfig {
        ExecutorConfig {
            request_budget: self.request_budget,
            inter_request_delay: Duration::from_millis(self.inter_request_delay_ms),
            checkpoint_interval: self.checkpoint_interval,
            monthly_quota: self.monthly_quota,
        }
    }

    /// Retry policy derived from this configuration.
    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_retries,
            initial_delay: Duration::from_millis(self.retry_initial_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
            multiplier: self.retry_backoff_multiplier,
        }
    }

    /// Planner policy derived from this configuration.
    pub fn policy(&self) -> RefreshPolicy {
        RefreshPolicy {
            fresh_days: self.fresh_days,
            critical_days: self.critical_days,
            priority_passports: self.priority_passports.iter().cloned().collect(),
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(name: &str, default: &str) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Debug,
{
    env_or(name, default)
        .parse()
        .unwrap_or_else(|e| panic!("{name} must be a valid value: {e:?}"))
}

/// Split a comma-separated list, trimming and uppercasing entries.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_trims_and_uppercases() {
        assert_eq!(
            parse_list(" gb, fr ,DE"),
            vec!["GB".to_string(), "FR".to_string(), "DE".to_string()]
        );
    }

    #[test]
    fn parse_list_of_empty_string_is_empty() {
        assert!(parse_list("").is_empty());
        assert!(parse_list(" , ,").is_empty());
    }
}
