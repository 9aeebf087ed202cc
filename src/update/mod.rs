use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use sqlx::PgPool;

use crate::config::{self, SyncConfig};
use crate::source::HttpFeedSource;
use crate::store::{PgStore, StorageCache};
use crate::sync::UpdateCoordinator;
use crate::telemetry;
use crate::telemetry::ops::update::Phase as UpdatePhase;

mod types;

use types::{StagedFeed, UpdateApply, UpdatePlan};

/// bfeeds update: fetch every feed, then (with --apply) persist the changed ones
#[derive(Args)]
pub struct UpdateCmd {
    #[arg(long, default_value_t = false)] pub apply: bool,
    /// Base URL the feed paths are resolved against
    #[arg(long)] pub base_url: Option<String>,
    #[arg(long)] pub http_timeout_secs: Option<u64>,
    /// Bound on the whole fetch phase; 0 waits indefinitely
    #[arg(long)] pub run_timeout_secs: Option<u64>,
}

impl UpdateCmd {
    fn config(&self) -> Result<SyncConfig> {
        let mut cfg = SyncConfig::from_env()?;
        if let Some(base) = &self.base_url { cfg.base_url = config::parse_base_url(base)?; }
        if let Some(secs) = self.http_timeout_secs { cfg.http_timeout = Duration::from_secs(secs); }
        if let Some(secs) = self.run_timeout_secs { cfg.run_timeout = config::run_timeout_from_secs(secs); }
        Ok(cfg)
    }
}

pub async fn run(pool: &PgPool, args: UpdateCmd) -> Result<()> {
    let log = telemetry::update();
    let cfg = args.config()?;
    let _g = log.root_span_kv([
        ("apply", args.apply.to_string()),
        ("base_url", cfg.base_url.to_string()),
        ("run_timeout", format!("{:?}", cfg.run_timeout)),
    ]).entered();

    let store = Arc::new(PgStore::new(pool.clone()));
    let cache = Arc::new(StorageCache::load(Arc::clone(&store)).await);
    let health = { let _s = log.span(&UpdatePhase::Health).entered(); cache.health().await? };
    if !health.has_data() {
        log.warn("⚠️ local block lists are incomplete");
    }

    let source = Arc::new(HttpFeedSource::new(cfg.base_url.clone(), cfg.http_timeout)?);
    let mut coordinator = UpdateCoordinator::new(Arc::clone(&store), Arc::clone(&cache))
        .with_run_timeout(cfg.run_timeout);

    let has_updates = {
        let _s = log.span(&UpdatePhase::Check).entered();
        coordinator.check_for_updates(&health, Arc::clone(&source)).await?
    };

    let pending = coordinator.pending();
    let staged: Vec<StagedFeed> = pending
        .updates()
        .map(|u| StagedFeed { feed: u.kind(), tag: pending.tag(u.kind()).map(str::to_string) })
        .collect();
    for s in &staged { log.staged(s.feed, s.tag.as_deref()); }
    for r in pending.recoveries() { log.recovery(*r); }
    let plan = UpdatePlan {
        fetches: source.fetch_count(),
        health,
        staged,
        recoveries: pending.recoveries().to_vec(),
    };

    if !args.apply {
        if has_updates {
            log.info(format!("📝 Update plan — {} feed(s) changed", plan.staged.len()));
            log.info("   Use --apply to execute.");
        } else {
            log.info("✅ All feeds up to date");
        }
        if telemetry::config::json_mode() { log.plan(&plan)?; }
        return Ok(());
    }

    let report = {
        let _s = log.span(&UpdatePhase::Apply).entered();
        coordinator.apply_update(cache.as_ref()).await
    };
    log.totals(&report);
    for feed in report.failed() {
        log.info_kv("❌ apply failed", [("feed", feed.to_string())]);
    }

    if telemetry::config::json_mode() {
        log.result(&UpdateApply { plan, report })?;
    }
    Ok(())
}
