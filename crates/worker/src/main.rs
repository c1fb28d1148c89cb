//! The visafeed worker binary.
//!
//! One invocation performs one run: optional seed import, then a
//! budget-bounded refresh against the lookup API. The periodic trigger
//! (cron, systemd timer) lives outside this process.

use anyhow::Context;
use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use visafeed_client::VisaApi;
use visafeed_core::country::{build_pair_universe, PairScope};
use visafeed_engine::{import_seed, RunExecutor};
use visafeed_store::{ProgressStore, RulesetStore};

mod config;
mod countries;

use config::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "visafeed_worker=info,visafeed_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env();

    let ruleset_store = RulesetStore::new(config.ruleset_path.clone(), config.stamp_path.clone());
    let progress_store = ProgressStore::new(config.progress_path.clone());

    if let Some(path) = &config.seed_path {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;

        let mut ruleset = ruleset_store.load();
        let report = import_seed(&mut ruleset, contents.lines());
        if report.written() > 0 {
            ruleset_store
                .save(&mut ruleset, Utc::now())
                .context("Failed to persist seeded ruleset")?;
        }
        tracing::info!(
            imported = report.imported,
            replaced = report.replaced,
            preserved = report.preserved,
            skipped_unknown = report.skipped_unknown,
            invalid_rows = report.invalid_rows,
            "Seed import finished",
        );
    }

    let scope = pair_scope(&config)?;
    let universe = build_pair_universe(&config.countries, &scope);
    tracing::info!(
        countries = config.countries.len(),
        pairs = universe.len(),
        "Pair universe built",
    );

    let api = VisaApi::new(config.api_url.clone(), config.api_key.clone());
    let executor = RunExecutor {
        config: config.executor(),
        retry: config.retry(),
        policy: config.policy(),
        universe,
        ruleset_store: &ruleset_store,
        progress_store: &progress_store,
        lookup: &api,
    };

    let summary = executor.run().await.context("Refresh run failed")?;
    if summary.stop_reason.is_terminal_signal() {
        tracing::warn!(
            stop_reason = %summary.stop_reason,
            remaining_queue = summary.remaining_queue,
            "Run ended early on a terminal signal",
        );
    }
    Ok(())
}

/// Choose the pair universe scope: an explicit curated list wins, then a
/// passport restriction, otherwise all pairs.
fn pair_scope(config: &WorkerConfig) -> anyhow::Result<PairScope> {
    if let Some(path) = &config.curated_pairs_path {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read curated pairs file {}", path.display()))?;
        let pairs: Vec<(String, String)> = serde_json::from_str(&contents)
            .with_context(|| format!("Malformed curated pairs file {}", path.display()))?;
        return Ok(PairScope::Curated(pairs));
    }
    if !config.passports.is_empty() {
        return Ok(PairScope::Passports(config.passports.clone()));
    }
    Ok(PairScope::All)
}
