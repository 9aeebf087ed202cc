use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use sqlx::PgPool;

use crate::store::pg::StoredTagRow;
use crate::store::{HealthSnapshot, PgStore, StorageCache};
use crate::telemetry;
use crate::telemetry::ops::status::Phase as StatusPhase;

/// bfeeds status: stored revision tags and local store health
#[derive(Args)]
pub struct StatusCmd {
    /// Also look up which entity owns this host and whether it is HTTPS-whitelisted
    #[arg(long)] pub host: Option<String>,
}

#[derive(Serialize)]
struct HostLookup {
    host: String,
    entity: Option<String>,
    https_whitelisted: bool,
}

#[derive(Serialize)]
struct StatusReport {
    tags: Vec<StoredTagRow>,
    health: HealthSnapshot,
    has_data: bool,
    entity_domains: usize,
    has_bloom_filter: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<HostLookup>,
}

pub async fn run(pool: &PgPool, args: StatusCmd) -> Result<()> {
    let log = telemetry::status();
    let _g = log.root_span_kv([("schema", "blocker".to_string())]).entered();
    let store = Arc::new(PgStore::new(pool.clone()));

    let tags = { let _s = log.span(&StatusPhase::Tags).entered(); store.list_tags().await? };
    log.info("🏷️ Revision tags:");
    for row in &tags {
        log.info(format!("  {} = {} (updated {})", row.feed, row.tag, row.updated_at));
    }

    let (health, entities, https) = {
        let _s = log.span(&StatusPhase::Health).entered();
        let cache = StorageCache::load(Arc::clone(&store)).await;
        (cache.health().await?, cache.entity_mapping(), cache.https_upgrade())
    };
    let entity_domains = entities.len();
    log.info(format!(
        "🩺 disconnectme={} easylist={} entity_domains={} bloom_filter={}",
        health.has_disconnect_me_data,
        health.has_easylist_data,
        entity_domains,
        https.spec().map_or("absent".to_string(), |s| format!("{} bits", s.bit_count)),
    ));

    let host = args.host.map(|host| HostLookup {
        entity: entities.entity_for_host(&host).map(str::to_string),
        https_whitelisted: https.is_whitelisted(&host),
        host,
    });
    if let Some(h) = &host {
        log.info(format!(
            "🔎 {} entity={} https_whitelisted={}",
            h.host,
            h.entity.as_deref().unwrap_or("-"),
            h.https_whitelisted,
        ));
    }

    if telemetry::config::json_mode() {
        let report = StatusReport {
            tags,
            has_data: health.has_data(),
            health,
            entity_domains,
            has_bloom_filter: https.spec().is_some(),
            host,
        };
        log.result(&report)?;
    }
    Ok(())
}
