use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::telemetry;
use crate::telemetry::ops::init::Phase as InitPhase;

pub async fn connect(dsn: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(dsn)
        .await
        .context("connect to postgres")?;
    Ok(pool)
}

pub async fn run(dsn: &str) -> Result<()> {
    let log = telemetry::init();
    let _g = log.root_span_kv([("migrations", "embedded".to_string())]).entered();

    let pool = {
        let _s = log.span(&InitPhase::Connect).entered();
        connect(dsn).await?
    };

    // Apply any pending migrations (idempotent)
    let _s = log.span(&InitPhase::Migrate).entered();
    sqlx::migrate!().run(&pool).await?;

    log.info("✅ Database initialized");
    if telemetry::config::json_mode() {
        log.result(&serde_json::json!({ "migrated": true }))?;
    }
    Ok(())
}
